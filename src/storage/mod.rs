//! Filesystem document store.
//!
//! Seasons and teams are stored as JSONL documents, one per line:
//! - `<data_dir>/documents/seasons.jsonl`
//! - `<data_dir>/documents/teams.jsonl`

pub mod jsonl;
pub mod store;

use std::path::PathBuf;
use thiserror::Error;

pub use jsonl::{EntityType, JsonlReader, JsonlWriter, StagedFile};
pub use store::{LeagueStore, Mutation, WriteBatch};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unreadable document at {path:?} line {line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    pub fn entity_path(&self, entity: EntityType) -> PathBuf {
        self.documents_dir().join(entity.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
