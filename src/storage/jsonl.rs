//! JSONL (JSON Lines) storage.
//!
//! Each line is a valid JSON object representing one document.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{StorageConfig, StorageError};

/// Document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Season,
    Team,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Season => "seasons.jsonl",
            EntityType::Team => "teams.jsonl",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for a document collection.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.entity_path(entity))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        let staged = self.stage(entities)?;
        let count = staged.count;
        staged.commit()?;
        Ok(count)
    }

    /// Write entities to a temporary sibling file without touching the
    /// live one. The result replaces the live file on [`StagedFile::commit`].
    pub fn stage(&self, entities: &[T]) -> Result<StagedFile, StorageError> {
        self.ensure_dir()?;

        let tmp_path = self.path.with_extension("jsonl.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        writer.get_ref().sync_all()?;
        debug!("Staged {} documents for {:?}", count, self.path);

        Ok(StagedFile {
            tmp_path,
            path: self.path.clone(),
            count,
        })
    }
}

/// A fully written temporary file waiting to replace its target.
#[derive(Debug)]
pub struct StagedFile {
    tmp_path: PathBuf,
    path: PathBuf,
    pub count: usize,
}

impl StagedFile {
    /// The live file this stage replaces.
    pub fn target(&self) -> &Path {
        &self.path
    }

    /// Atomically move the staged file over its target. On failure the
    /// staged file is removed and the target is left as it was.
    pub fn commit(self) -> Result<(), StorageError> {
        if let Err(e) = fs::rename(&self.tmp_path, &self.path) {
            self.discard();
            return Err(e.into());
        }
        debug!("Wrote {} documents to {:?}", self.count, self.path);
        Ok(())
    }

    /// Drop the staged file.
    pub fn discard(self) {
        if let Err(e) = fs::remove_file(&self.tmp_path) {
            warn!("Failed to remove staged file {:?}: {}", self.tmp_path, e);
        }
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for a document collection.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.entity_path(entity))
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all documents. A missing file reads as empty; unparseable lines
    /// are skipped with a warning.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        self.read_lines(false)
    }

    /// Read all documents, failing on the first unparseable line.
    ///
    /// Use this before rewriting a collection so damaged documents are never
    /// dropped from the file.
    pub fn read_all_strict(&self) -> Result<Vec<T>, StorageError> {
        self.read_lines(true)
    }

    fn read_lines(&self, strict: bool) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(source) if strict => {
                    return Err(StorageError::Corrupt {
                        path: self.path.clone(),
                        line: i + 1,
                        source,
                    });
                }
                Err(e) => {
                    warn!("Failed to parse line {} in {:?}: {}", i + 1, self.path, e);
                }
            }
        }

        debug!("Read {} documents from {:?}", entities.len(), self.path);
        Ok(entities)
    }

    /// Read documents matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(predicate).collect())
    }
}
