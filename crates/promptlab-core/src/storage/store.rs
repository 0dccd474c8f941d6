use super::backend::StorageBackend;
use crate::model::{Document, SessionPrefs};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub const DOCUMENT_KEY: &str = "promptlab_v1";
pub const SESSION_KEY: &str = "promptlab_session_v1";

/// Whole-document load/save over a key/value backend.
///
/// Reads never fail: missing, unreadable or malformed data comes back as the
/// empty value. Writes serialize everything and replace the stored value.
#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn StorageBackend>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn load(&self) -> Document {
        self.load_key(DOCUMENT_KEY)
    }

    pub fn save(&self, doc: &Document) -> anyhow::Result<()> {
        self.save_key(DOCUMENT_KEY, doc)
    }

    pub fn load_session(&self) -> SessionPrefs {
        self.load_key(SESSION_KEY)
    }

    pub fn save_session(&self, prefs: &SessionPrefs) -> anyhow::Result<()> {
        self.save_key(SESSION_KEY, prefs)
    }

    fn load_key<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.backend.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::debug!(event = "store.load.unreadable", key = %key, error = %e);
                return T::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(event = "store.load.discarded", key = %key, error = %e);
                T::default()
            }
        }
    }

    fn save_key<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string(value)?;
        self.backend.write(key, &json)
    }
}
