use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::value::{FieldValue, FormState};

/// Full accumulated form state handed over at submit time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionPayload {
    pub data: BTreeMap<String, FieldValue>,
}

impl SubmissionPayload {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<&FormState> for SubmissionPayload {
    fn from(state: &FormState) -> Self {
        Self {
            data: state.snapshot(),
        }
    }
}

/// Acknowledgement returned by a submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub reference: String,
    pub submitted_at: DateTime<Utc>,
    pub fields: usize,
}

/// Outbound hook owning how a completed form is persisted or exported.
#[async_trait]
pub trait FormSubmitter: Send + Sync {
    async fn submit(&self, payload: SubmissionPayload)
        -> Result<SubmissionReceipt, SubmissionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("unable to write export {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to encode submission: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Writes each submission as pretty-printed JSON into a directory.
#[derive(Debug, Clone)]
pub struct JsonExportSubmitter {
    directory: PathBuf,
}

impl JsonExportSubmitter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn export_path(&self, submitted_at: DateTime<Utc>) -> PathBuf {
        let stamp = submitted_at.format("%Y%m%dT%H%M%S%.3fZ");
        self.directory.join(format!("formData-{stamp}.json"))
    }
}

#[async_trait]
impl FormSubmitter for JsonExportSubmitter {
    async fn submit(
        &self,
        payload: SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let submitted_at = Utc::now();
        let path = self.export_path(submitted_at);
        let body = serde_json::to_vec_pretty(&payload)?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| SubmissionError::Io {
                path: self.directory.clone(),
                source,
            })?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| SubmissionError::Io {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), fields = payload.len(), "form exported");

        Ok(SubmissionReceipt {
            reference: path.display().to_string(),
            submitted_at,
            fields: payload.len(),
        })
    }
}

/// Keeps submitted payloads in memory. Can be configured to reject every
/// submission to exercise failure paths.
#[derive(Debug, Default)]
pub struct InMemorySubmitter {
    payloads: Mutex<Vec<SubmissionPayload>>,
    rejection: Option<String>,
}

impl InMemorySubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            payloads: Mutex::new(Vec::new()),
            rejection: Some(reason.into()),
        }
    }

    pub fn payloads(&self) -> Vec<SubmissionPayload> {
        self.payloads
            .lock()
            .expect("submission store mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl FormSubmitter for InMemorySubmitter {
    async fn submit(
        &self,
        payload: SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        if let Some(reason) = &self.rejection {
            return Err(SubmissionError::Rejected(reason.clone()));
        }

        let fields = payload.len();
        let mut payloads = self
            .payloads
            .lock()
            .expect("submission store mutex poisoned");
        payloads.push(payload);

        Ok(SubmissionReceipt {
            reference: format!("memory-{:06}", payloads.len()),
            submitted_at: Utc::now(),
            fields,
        })
    }
}
