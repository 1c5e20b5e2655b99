use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::utils::error::{AppError, Result};

/// Durable set of identifiers that have already been announced.
///
/// Access is single-flight (the poll loop holds the only handle), so
/// implementations need no internal locking.
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    fn contains(&self, id: &str) -> bool;

    /// Records `id`. Returns `false` if it was already present.
    fn add(&mut self, id: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes pending additions to durable storage.
    async fn persist(&mut self) -> Result<()>;
}

/// Newline-delimited identifier file.
#[derive(Debug)]
pub struct FileIdentifierStore {
    path: PathBuf,
    ids: HashSet<String>,
    dirty: bool,
}

impl FileIdentifierStore {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ids: HashSet::new(),
            dirty: false,
        }
    }

    /// Load the identifier set. A missing file yields an empty set.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ids = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => parse_identifiers(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "Identifier file {} not found, starting with an empty set",
                    path.display()
                );
                HashSet::new()
            }
            Err(e) => {
                return Err(AppError::persistence(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        tracing::info!("Loaded {} known identifiers from {}", ids.len(), path.display());
        Ok(Self {
            path,
            ids,
            dirty: false,
        })
    }

    /// Like [`load`](Self::load), but an unreadable file degrades to an empty set.
    pub async fn load_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(&path).await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("{}; continuing with an empty identifier set", e);
                Self::empty(path)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write to a sibling temp file, then rename over the target.
    async fn write_atomically(&self, contents: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[async_trait]
impl IdentifierStore for FileIdentifierStore {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn add(&mut self, id: &str) -> bool {
        let inserted = self.ids.insert(id.to_string());
        if inserted {
            self.dirty = true;
        }
        inserted
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    async fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let mut sorted: Vec<&String> = self.ids.iter().collect();
        sorted.sort();
        let mut contents = String::with_capacity(sorted.len() * 18);
        for id in sorted {
            contents.push_str(id);
            contents.push('\n');
        }

        // dirty stays set on failure so the next flush retries
        self.write_atomically(contents.as_bytes())
            .await
            .map_err(|e| {
                AppError::persistence(format!("failed to write {}: {}", self.path.display(), e))
            })?;

        self.dirty = false;
        tracing::debug!("Persisted {} identifiers to {}", self.ids.len(), self.path.display());
        Ok(())
    }
}

fn parse_identifiers(contents: &str) -> HashSet<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileIdentifierStore::load(dir.path().join("ids.txt")).await.unwrap();
        assert!(store.is_empty());
        assert!(!store.contains("VIN1"));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");

        let mut store = FileIdentifierStore::load(&path).await.unwrap();
        let ids: Vec<String> = (0..25).map(|i| format!("VIN{:04}", i)).collect();
        for id in &ids {
            assert!(store.add(id));
        }
        store.persist().await.unwrap();

        let reloaded = FileIdentifierStore::load(&path).await.unwrap();
        assert_eq!(reloaded.len(), ids.len());
        for id in &ids {
            assert!(reloaded.contains(id));
        }
        assert!(!reloaded.contains("VIN9999"));
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = FileIdentifierStore::empty(dir.path().join("ids.txt"));

        assert!(store.add("VIN1"));
        assert!(!store.add("VIN1"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_lines_and_whitespace_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");
        tokio::fs::write(&path, "VIN1\n\n  VIN2  \n\r\nVIN3").await.unwrap();

        let store = FileIdentifierStore::load(&path).await.unwrap();
        assert_eq!(store.len(), 3);
        assert!(store.contains("VIN2"));
    }

    #[tokio::test]
    async fn test_persist_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("nested").join("ids.txt");

        let mut store = FileIdentifierStore::empty(&path);
        store.add("VIN1");
        store.persist().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "VIN1\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");
        tokio::fs::write(&path, "VIN1\n").await.unwrap();

        let mut store = FileIdentifierStore::load(&path).await.unwrap();
        store.add("VIN2");
        // A directory where the temp file should go makes the write fail.
        tokio::fs::create_dir(path.with_extension("tmp")).await.unwrap();

        let result = store.persist().await;
        assert!(matches!(result, Err(AppError::Persistence { .. })));
        assert!(store.contains("VIN2"));

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "VIN1\n");
    }

    #[tokio::test]
    async fn test_unreadable_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        // Reading a directory as a file fails with something other than NotFound.
        let store = FileIdentifierStore::load_or_empty(dir.path()).await;
        assert!(store.is_empty());
        assert_eq!(store.path(), dir.path());
    }
}
