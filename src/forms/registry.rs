use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::schema::FormSchema;
use super::session::FormSession;
use super::validation::ValidationConfig;

/// Session handle shared between the registry and in-flight requests. The
/// async lock lets a submit be awaited while the session is held.
pub type SharedSession = Arc<tokio::sync::Mutex<FormSession>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory store of live form sessions over one schema.
#[derive(Debug)]
pub struct SessionRegistry {
    schema: Arc<FormSchema>,
    validation: ValidationConfig,
    sequence: AtomicU64,
    sessions: Mutex<HashMap<SessionId, SharedSession>>,
}

impl SessionRegistry {
    pub fn new(schema: Arc<FormSchema>, validation: ValidationConfig) -> Self {
        Self {
            schema,
            validation,
            sequence: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    fn next_id(&self) -> SessionId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        SessionId(format!("session-{id:06}"))
    }

    pub fn create(&self) -> (SessionId, SharedSession) {
        let id = self.next_id();
        let session =
            FormSession::with_validation(Arc::clone(&self.schema), self.validation.clone());
        let shared = Arc::new(tokio::sync::Mutex::new(session));

        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .insert(id.clone(), Arc::clone(&shared));

        info!(session = %id, "session created");
        (id, shared)
    }

    pub fn get(&self, id: &SessionId) -> Result<SharedSession, RegistryError> {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    pub fn remove(&self, id: &SessionId) -> Result<(), RegistryError> {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .remove(id)
            .map(|_| info!(session = %id, "session discarded"))
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("session {0} not found")]
    NotFound(SessionId),
}
