pub mod backend;
pub mod sqlite;
pub mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use sqlite::SqliteBackend;
pub use store::{DocumentStore, DOCUMENT_KEY, SESSION_KEY};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Sqlite,
    File,
    Memory,
}

impl BackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(BackendKind::Sqlite),
            "file" | "json" => Some(BackendKind::File),
            "memory" | "mem" => Some(BackendKind::Memory),
            _ => None,
        }
    }
}

/// Opens the backend named by `kind`. `path` is the sqlite file or the
/// directory holding the json files; it is ignored for `memory`.
pub fn open_backend(kind: BackendKind, path: &Path) -> anyhow::Result<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match kind {
        BackendKind::Sqlite => Arc::new(SqliteBackend::open(path)?),
        BackendKind::File => Arc::new(FileBackend::new(path)),
        BackendKind::Memory => Arc::new(MemoryBackend::default()),
    };
    tracing::debug!(event = "store.open", backend = ?kind, path = %path.display());
    Ok(backend)
}
