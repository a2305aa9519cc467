use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use stepform::forms::{FormSchema, SchemaError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the schema at `path`, or the bundled property listing schema.
pub(crate) fn load_schema(path: Option<&Path>) -> Result<Arc<FormSchema>, SchemaError> {
    let schema = match path {
        Some(path) => {
            let schema = FormSchema::from_path(path)?;
            info!(path = %path.display(), steps = schema.step_count(), "schema loaded");
            schema
        }
        None => FormSchema::property_listing()?,
    };
    Ok(Arc::new(schema))
}
