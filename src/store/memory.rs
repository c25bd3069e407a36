// SPDX-License-Identifier: GPL-3.0-only

//! In-process store backend.

use super::{Store, StoreError, StoreOptions, StoreResult, Subscribers};
use async_trait::async_trait;
use futures::channel::mpsc;
use tokio::sync::RwLock;

/// A store cell held entirely in memory.
///
/// Values written here are visible to every clone of the owning `Arc` and
/// to all subscribers, but are lost when the process exits.
#[derive(Debug)]
pub struct MemoryStore<T> {
    value: RwLock<T>,
    subscribers: Subscribers<T>,
    options: StoreOptions,
}

impl<T: Clone> MemoryStore<T> {
    /// Creates a cell seeded with `initial`.
    pub fn new(initial: T, options: StoreOptions) -> Self {
        Self {
            value: RwLock::new(initial),
            subscribers: Subscribers::new(),
            options,
        }
    }
}

impl<T: Clone + Default> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new(T::default(), StoreOptions::default())
    }
}

#[async_trait]
impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self) -> StoreResult<T> {
        Ok(self.value.read().await.clone())
    }

    async fn set(&self, value: T) -> StoreResult<()> {
        if !self.options.area.is_writable() {
            return Err(StoreError::ReadOnly(self.options.area));
        }
        *self.value.write().await = value.clone();
        self.subscribers.notify(&value);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        self.subscribers.subscribe()
    }

    fn options(&self) -> &StoreOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StorageArea;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_get_returns_initial_value() {
        let store = MemoryStore::new(7u32, StoreOptions::default());
        assert_eq!(store.get().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_set_notifies_subscribers() {
        let store = MemoryStore::new(String::new(), StoreOptions::default());
        let mut first = store.subscribe();
        let mut second = store.subscribe();

        store.set("hello".to_string()).await.unwrap();

        assert_eq!(first.next().await.as_deref(), Some("hello"));
        assert_eq!(second.next().await.as_deref(), Some("hello"));
        assert_eq!(store.get().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_managed_area_rejects_writes() {
        let options = StoreOptions::default().with_area(StorageArea::Managed);
        let store = MemoryStore::new(1u8, options);

        let result = store.set(2).await;
        assert!(matches!(result, Err(StoreError::ReadOnly(StorageArea::Managed))));
        assert_eq!(store.get().await.unwrap(), 1, "Value must not change");
    }
}
