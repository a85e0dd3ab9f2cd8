//! Inventory collection.
//!
//! A [`Gatherer`] produces one [`Inventory`] per call. [`LocalGatherer`] walks
//! a directory tree; the remote side is gathered through
//! [`crate::store::RemoteListing`].
//!
//! Local names are `<root basename>/<path relative to root>`, always with `/`
//! separators, so the same tree gathered from different mount points yields
//! the same object names.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use stashback_core::{FileRecord, Inventory};

use crate::error::{io_err, StoreError};

/// Zero-argument source of an inventory.
#[async_trait]
pub trait Gatherer: Send + Sync {
    async fn gather(&self) -> Result<Inventory, StoreError>;
}

/// Recursive walk of one local root.
#[derive(Debug, Clone)]
pub struct LocalGatherer {
    root: PathBuf,
}

impl LocalGatherer {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Gatherer for LocalGatherer {
    async fn gather(&self) -> Result<Inventory, StoreError> {
        let root = self.root.clone();
        let inventory = tokio::task::spawn_blocking(move || walk_root(&root))
            .await
            .map_err(|err| StoreError::Rejected(format!("walk task failed: {err}")))??;
        tracing::debug!(
            root = %self.root.display(),
            files = inventory.len(),
            "gathered local files",
        );
        Ok(inventory)
    }
}

fn walk_root(root: &Path) -> Result<Inventory, StoreError> {
    let canonical = std::fs::canonicalize(root).map_err(|e| io_err(root, e))?;
    let prefix = canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let mut inventory = Inventory::new();
    for entry in WalkDir::new(&canonical).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = relative_key(&canonical, entry.path()) else {
            continue;
        };
        let name = match &prefix {
            Some(prefix) => format!("{prefix}/{relative}"),
            None => relative,
        };
        let size = entry.metadata()?.len() as i64;
        inventory.insert(FileRecord::local(name, size, entry.path()));
    }
    Ok(inventory)
}

/// `path` relative to `root` as a `/`-joined key, or `None` for `root` itself
/// or a path outside it.
pub(crate) fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Run `gatherers` in order and union their results.
///
/// A later gatherer's record replaces an earlier one with the same name. The
/// first failure aborts the whole collection.
pub async fn gather_all(gatherers: &[std::sync::Arc<dyn Gatherer>]) -> Result<Inventory, StoreError> {
    let mut combined = Inventory::new();
    for gatherer in gatherers {
        combined.merge(gatherer.gather().await?);
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;

    fn tree(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("photos");
        for (rel, content) in files {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        fs::create_dir_all(&root).unwrap();
        (tmp, root)
    }

    #[tokio::test]
    async fn names_are_prefixed_with_root_basename() {
        let (_tmp, root) = tree(&[("a.jpg", "12345"), ("2024/b.jpg", "xy")]);
        let inventory = LocalGatherer::new(&root).gather().await.unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.get("photos/a.jpg").map(|f| f.size), Some(5));
        assert_eq!(inventory.get("photos/2024/b.jpg").map(|f| f.size), Some(2));
    }

    #[tokio::test]
    async fn records_keep_their_source_path() {
        let (_tmp, root) = tree(&[("a.jpg", "1")]);
        let inventory = LocalGatherer::new(&root).gather().await.unwrap();
        let record = inventory.get("photos/a.jpg").unwrap();
        let source = record.source().expect("local records carry a source");
        assert_eq!(fs::read_to_string(source).unwrap(), "1");
    }

    #[tokio::test]
    async fn directories_are_not_records() {
        let (_tmp, root) = tree(&[]);
        fs::create_dir_all(root.join("empty/inner")).unwrap();
        let inventory = LocalGatherer::new(&root).gather().await.unwrap();
        assert!(inventory.is_empty());
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = LocalGatherer::new(tmp.path().join("nope"))
            .gather()
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn gather_all_merges_in_order() {
        let first_tmp = TempDir::new().unwrap();
        let second_tmp = TempDir::new().unwrap();
        let first = first_tmp.path().join("docs");
        let second = second_tmp.path().join("docs");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("shared.txt"), "short").unwrap();
        fs::write(first.join("only-first.txt"), "1").unwrap();
        fs::write(second.join("shared.txt"), "much longer").unwrap();

        let gatherers: Vec<Arc<dyn Gatherer>> = vec![
            Arc::new(LocalGatherer::new(&first)),
            Arc::new(LocalGatherer::new(&second)),
        ];
        let merged = gather_all(&gatherers).await.unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.get("docs/shared.txt").map(|f| f.size),
            Some("much longer".len() as i64),
            "later roots win name collisions"
        );
    }

    #[test]
    fn relative_key_uses_forward_slashes() {
        let root = Path::new("/data");
        assert_eq!(
            relative_key(root, &root.join("a").join("b.txt")),
            Some("a/b.txt".to_string())
        );
        assert_eq!(relative_key(root, root), None);
        assert_eq!(relative_key(root, Path::new("/elsewhere/x")), None);
    }
}
