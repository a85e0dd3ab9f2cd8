//! In-process bucket with failure injection.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use stashback_core::{FileRecord, Inventory};

use crate::error::StoreError;
use crate::store::{validate_key, RemoteStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    latency: Option<Duration>,
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<String, i64>,
    failing_puts: HashSet<String>,
    failing_removes: HashSet<String>,
    fail_list: Option<String>,
    puts: Vec<String>,
    removes: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `objects`.
    pub fn with_objects(objects: impl IntoIterator<Item = FileRecord>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state();
            for record in objects {
                state.objects.insert(record.name, record.size);
            }
        }
        store
    }

    /// Delay every put and remove by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every `put` of `name` fail.
    pub fn fail_put(&self, name: impl Into<String>) {
        self.state().failing_puts.insert(name.into());
    }

    /// Make every `remove` of `name` fail.
    pub fn fail_remove(&self, name: impl Into<String>) {
        self.state().failing_removes.insert(name.into());
    }

    /// Make `list` fail with `message`.
    pub fn fail_list(&self, message: impl Into<String>) {
        self.state().fail_list = Some(message.into());
    }

    /// Current object sizes by name.
    pub fn objects(&self) -> HashMap<String, i64> {
        self.state().objects.clone()
    }

    /// Names passed to `put`, in call order.
    pub fn puts(&self) -> Vec<String> {
        self.state().puts.clone()
    }

    /// Names passed to `remove`, in call order.
    pub fn removes(&self) -> Vec<String> {
        self.state().removes.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list(&self) -> Result<Inventory, StoreError> {
        let state = self.state();
        if let Some(message) = &state.fail_list {
            return Err(StoreError::Rejected(message.clone()));
        }
        Ok(state
            .objects
            .iter()
            .map(|(name, size)| FileRecord::new(name.clone(), *size))
            .collect())
    }

    async fn put(&self, file: &FileRecord) -> Result<(), StoreError> {
        validate_key(&file.name)?;
        self.delay().await;
        let mut state = self.state();
        state.puts.push(file.name.clone());
        if state.failing_puts.contains(&file.name) {
            return Err(StoreError::Rejected(format!("put refused for {}", file.name)));
        }
        state.objects.insert(file.name.clone(), file.size);
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        validate_key(name)?;
        self.delay().await;
        let mut state = self.state();
        state.removes.push(name.to_string());
        if state.failing_removes.contains(name) {
            return Err(StoreError::Rejected(format!("remove refused for {name}")));
        }
        state.objects.remove(name);
        Ok(())
    }
}
