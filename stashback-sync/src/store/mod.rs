//! Remote object store seam.
//!
//! The engine only ever talks to a [`RemoteStore`]. Implementations must be
//! safe to call from many workers at once and keep no per-call client state.

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use std::path::{Component, Path};
use std::sync::Arc;

use async_trait::async_trait;

use stashback_core::{FileRecord, Inventory};

use crate::error::StoreError;
use crate::gather::Gatherer;

/// List, upload and delete objects in a bucket.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every object currently in the bucket, keyed by object name.
    async fn list(&self) -> Result<Inventory, StoreError>;

    /// Upload `file.source` under `file.name`, overwriting any existing object.
    async fn put(&self, file: &FileRecord) -> Result<(), StoreError>;

    /// Delete the object named `name`.
    async fn remove(&self, name: &str) -> Result<(), StoreError>;
}

/// Reject keys that cannot name an object inside the bucket.
pub fn validate_key(name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidKey(name.to_string()));
    }
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(StoreError::InvalidKey(name.to_string()));
    }
    Ok(())
}

/// Presents a store's listing as a [`Gatherer`].
#[derive(Clone)]
pub struct RemoteListing {
    store: Arc<dyn RemoteStore>,
}

impl RemoteListing {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Gatherer for RemoteListing {
    async fn gather(&self) -> Result<Inventory, StoreError> {
        self.store.list().await
    }
}
