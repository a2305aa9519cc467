use crate::infra::load_schema;
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use stepform::config::AppConfig;
use stepform::error::AppError;
use stepform::forms::visit::leaf_paths;
use stepform::forms::{
    AdvanceOutcome, FieldValue, FormSchema, FormSession, FormState, InMemorySubmitter,
    JsonExportSubmitter, SessionStatus, StepRejection, Visibility,
};

#[derive(Args, Debug)]
pub(crate) struct SchemaCheckArgs {
    /// Path to a JSON schema document
    pub(crate) path: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct FillArgs {
    /// JSON object mapping field paths to answers
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Schema document to fill (defaults to FORM_SCHEMA_PATH, then the bundled schema)
    #[arg(long)]
    pub(crate) schema: Option<PathBuf>,
    /// Directory receiving the exported submission (defaults to FORM_EXPORT_DIR)
    #[arg(long)]
    pub(crate) export_dir: Option<PathBuf>,
}

pub(crate) fn run_schema_check(args: SchemaCheckArgs) -> Result<(), AppError> {
    let schema = FormSchema::from_path(&args.path)?;
    println!("Schema OK: {}", args.path.display());
    print_layout(&schema);
    Ok(())
}

fn print_layout(schema: &FormSchema) {
    let state = FormState::new();
    for (index, step) in schema.steps.iter().enumerate() {
        if index == schema.last_step_index() {
            println!("{}. {} (review)", index + 1, step.title);
            continue;
        }

        let paths = leaf_paths(&step.fields, &state, Visibility::All);
        println!("{}. {} ({} fields)", index + 1, step.title, paths.len());
        for path in paths {
            if let Some((_, field)) = schema.find_field(&path) {
                let required = if field.required { ", required" } else { "" };
                println!("   - {path} [{}{required}]", field.kind);
            }
        }
    }
}

pub(crate) async fn run_fill(args: FillArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let schema_path = args.schema.or(config.forms.schema_path);
    let export_dir = args.export_dir.unwrap_or(config.forms.export_dir);

    let schema = load_schema(schema_path.as_deref())?;
    let raw = std::fs::read_to_string(&args.answers)?;
    let answers: BTreeMap<String, FieldValue> = serde_json::from_str(&raw)?;

    let mut session = FormSession::new(Arc::clone(&schema));
    let mut applied = 0usize;

    while let SessionStatus::Editing { step } = session.status() {
        let descriptor = &schema.steps[step];
        for path in leaf_paths(&descriptor.fields, session.state(), Visibility::All) {
            if let Some(value) = answers.get(&path) {
                session.edit(&path, value.clone())?;
                applied += 1;
            }
        }

        match session.advance()? {
            AdvanceOutcome::Advanced { .. } => println!("✓ {}", descriptor.title),
            AdvanceOutcome::Rejected(rejection) => {
                println!("✗ {}", descriptor.title);
                print_rejection(&rejection);
                return Ok(());
            }
        }
    }

    let ignored: Vec<&str> = answers
        .keys()
        .filter(|path| schema.find_field(path).is_none())
        .map(String::as_str)
        .collect();
    if !ignored.is_empty() {
        println!("Ignored unknown answers: {}", ignored.join(", "));
    }

    println!("\nApplied {applied} answers. Review:\n");
    print!("{}", session.review().render_text());

    let submitter = JsonExportSubmitter::new(export_dir);
    let receipt = session.submit(&submitter).await?;
    println!(
        "\nSubmitted {} fields at {} -> {}",
        receipt.fields,
        receipt.submitted_at.to_rfc3339(),
        receipt.reference
    );
    Ok(())
}

fn print_rejection(rejection: &StepRejection) {
    if let Some(summary) = rejection.summary() {
        println!("  {summary}");
    }
    for (path, message) in &rejection.report.field_errors {
        println!("  - {path}: {message}");
    }
}

pub(crate) async fn run_demo() -> Result<(), AppError> {
    let schema = load_schema(None)?;
    let submitter = InMemorySubmitter::new();
    let mut session = FormSession::new(schema);

    println!("Form demo: {} steps", session.schema().step_count());
    println!(
        "\n[{:.0}%] {} - advancing with nothing filled in",
        session.progress_percent(),
        session.current_step_title()
    );
    if let AdvanceOutcome::Rejected(rejection) = session.advance()? {
        print_rejection(&rejection);
    }

    session.edit("firstName", "Lina")?;
    session.edit("lastName", "Haddad")?;
    session.edit("email", "lina.haddad@example.com")?;
    session.edit("contact.countryCode", "+1")?;
    session.edit("contact.phone", "5551234")?;
    println!("\nPhone 5551234 with +1:");
    if let AdvanceOutcome::Rejected(rejection) = session.advance()? {
        print_rejection(&rejection);
    }

    let effect = session.edit("contact.countryCode", "+966")?;
    println!(
        "Switched country code to +966; phone kept as {}, re-checked {:?}",
        session.state().get("contact.phone"),
        effect.revalidate
    );
    report_advance(&mut session)?;

    session.edit("propertyType", "Residential")?;
    session.edit("category", "Villa")?;
    session.edit("subCategory", "Compound")?;
    let effect = session.edit("propertyType", "Commercial")?;
    println!("\nChanged property type to Commercial; cleared {:?}", effect.cleared);

    session.edit("category", "Office")?;
    session.edit("subCategory", "Serviced")?;
    session.edit("price", "1250000")?;
    session.edit("hasParking", true)?;
    session.edit("parkingSpaces", 3_i64)?;
    session.edit("listingType", "Sale")?;
    report_advance(&mut session)?;

    session.edit("date", "2026-11-01")?;
    session.edit("newsletter", false)?;
    session.edit("agreeToTerms", true)?;
    report_advance(&mut session)?;

    println!("\nReview:\n{}", session.review().render_text());

    session.jump_to(1)?;
    println!("Jumped back to '{}' to lower the price", session.current_step_title());
    session.edit("price", "1175000")?;
    report_advance(&mut session)?;
    report_advance(&mut session)?;

    let receipt = session.submit(&submitter).await?;
    println!(
        "\nSubmitted {} fields as {} ({})",
        receipt.fields, receipt.reference, session.status()
    );
    Ok(())
}

fn report_advance(session: &mut FormSession) -> Result<(), AppError> {
    let title = session.current_step_title().to_string();
    match session.advance()? {
        AdvanceOutcome::Advanced { to, .. } => {
            println!(
                "✓ {title} -> {to} ({:.0}% complete)",
                session.progress_percent()
            );
        }
        AdvanceOutcome::Rejected(rejection) => {
            println!("✗ {title}");
            print_rejection(&rejection);
        }
    }
    Ok(())
}
