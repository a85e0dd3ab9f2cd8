//! A local directory standing in for a bucket.
//!
//! Object `a/b/c.txt` lives at `<root>/a/b/c.txt`. Uploads go through
//! `<path>.stashback.tmp` and a rename, so a reader never sees a half-written
//! object; listing ignores leftover temp files.
//!
//! Directories are shared between objects. A put holds the tree lock shared
//! from creating its parent until the rename lands; pruning empty parents
//! after a remove holds it exclusively, so a directory is never removed out
//! from under an in-flight put.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use walkdir::WalkDir;

use stashback_core::{FileRecord, Inventory};

use crate::error::{io_err, StoreError};
use crate::gather::relative_key;
use crate::store::{validate_key, RemoteStore};

const TMP_SUFFIX: &str = ".stashback.tmp";

#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
    tree: Arc<RwLock<()>>,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            tree: Arc::new(RwLock::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Remove empty directories from `start` upwards, stopping at the root.
    async fn prune_empty_parents(&self, start: Option<&Path>) {
        let _tree = self.tree.write().await;
        let mut current = start.map(Path::to_path_buf);
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            // Fails on non-empty directories, which ends the climb.
            if tokio::fs::remove_dir(&dir).await.is_err() {
                break;
            }
            current = dir.parent().map(Path::to_path_buf);
        }
    }
}

#[async_trait]
impl RemoteStore for DirStore {
    async fn list(&self) -> Result<Inventory, StoreError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || list_blocking(&root))
            .await
            .map_err(|err| StoreError::Rejected(format!("listing task failed: {err}")))?
    }

    async fn put(&self, file: &FileRecord) -> Result<(), StoreError> {
        validate_key(&file.name)?;
        let source = file.source().ok_or_else(|| StoreError::MissingSource {
            name: file.name.clone(),
        })?;

        let target = self.path_for(&file.name);
        let _tree = self.tree.read().await;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(parent, e))?;
        }

        let tmp = PathBuf::from(format!("{}{TMP_SUFFIX}", target.display()));
        if let Err(e) = tokio::fs::copy(source, &tmp).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            let failed = if tokio::fs::metadata(source).await.is_ok() {
                tmp.as_path()
            } else {
                source
            };
            return Err(io_err(failed, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(&target, e));
        }

        tracing::debug!(key = %file.name, "stored object");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        validate_key(name)?;
        let target = self.path_for(name);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key = %name, "object already absent");
                return Ok(());
            }
            Err(e) => return Err(io_err(&target, e)),
        }
        self.prune_empty_parents(target.parent()).await;
        Ok(())
    }
}

fn list_blocking(root: &Path) -> Result<Inventory, StoreError> {
    if !root.is_dir() {
        return Err(io_err(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "bucket directory not found"),
        ));
    }

    let mut inventory = Inventory::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.to_string_lossy().ends_with(TMP_SUFFIX) {
            continue;
        }
        let Some(key) = relative_key(root, path) else {
            continue;
        };
        let meta = entry.metadata()?;
        inventory.insert(FileRecord::new(key, meta.len() as i64));
    }
    Ok(inventory)
}
