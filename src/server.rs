use crate::cli::ServeArgs;
use crate::infra::{load_schema, AppState};
use crate::routes::with_session_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use stepform::config::AppConfig;
use stepform::error::AppError;
use stepform::forms::{FormSubmitter, JsonExportSubmitter, SessionRegistry, ValidationConfig};
use stepform::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let schema = load_schema(config.forms.schema_path.as_deref())?;
    let registry = Arc::new(SessionRegistry::new(schema, ValidationConfig::default()));
    let submitter: Arc<dyn FormSubmitter> =
        Arc::new(JsonExportSubmitter::new(config.forms.export_dir.clone()));

    let app = with_session_routes(registry, submitter)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        export_dir = %config.forms.export_dir.display(),
        "form service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
