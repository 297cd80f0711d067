//! JSON file backed document collection
//!
//! The whole collection is held in memory behind an `RwLock`. Writers hold
//! the lock across the disk write, so every mutation is applied and
//! persisted as one unit or not at all.

use crate::core::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub struct JsonCollection<T> {
    path: PathBuf,
    docs: RwLock<Vec<T>>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Open the collection at `path`, starting empty if the file is absent
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let docs: Vec<T> = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    Error::Internal(format!("failed to parse {}: {}", path.display(), e))
                })?
            }
        } else {
            Vec::new()
        };

        info!("Loaded {} documents from {:?}", docs.len(), path);

        Ok(Self {
            path,
            docs: RwLock::new(docs),
        })
    }

    /// Run `f` over a consistent view of the collection
    pub async fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let docs = self.docs.read().await;
        f(&docs)
    }

    /// Apply `f` to a working copy and persist it. The in-memory state is
    /// only replaced once the file write succeeded; an error from `f`
    /// leaves both untouched.
    pub async fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Result<R>) -> Result<R> {
        let mut docs = self.docs.write().await;

        let mut working = docs.clone();
        let out = f(&mut working)?;

        self.save(&working).await?;
        *docs = working;

        Ok(out)
    }

    /// Write the collection to disk atomically
    async fn save(&self, docs: &[T]) -> Result<()> {
        let temp_path = self.path.with_extension("tmp");

        let json = serde_json::to_string_pretty(docs)?;

        // Write to temp file
        fs::write(&temp_path, json).await?;

        // Atomic rename
        fs::rename(&temp_path, &self.path).await?;

        debug!("Saved {} documents to {:?}", docs.len(), self.path);

        Ok(())
    }
}
