use crate::demo::{run_demo, run_fill, run_schema_check, FillArgs, SchemaCheckArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use stepform::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "stepform",
    about = "Serve, check and drive schema-driven multi-step forms",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect form schema documents
    Schema {
        #[command(subcommand)]
        command: SchemaCommand,
    },
    /// Fill a form from a JSON answers file, review it and export the result
    Fill(FillArgs),
    /// Walk through the bundled property listing form step by step
    Demo,
}

#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Load a schema, run the structural checks and print its layout
    Check(SchemaCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Schema {
            command: SchemaCommand::Check(args),
        } => run_schema_check(args),
        Command::Fill(args) => run_fill(args).await,
        Command::Demo => run_demo().await,
    }
}
