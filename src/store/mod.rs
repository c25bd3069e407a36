// SPDX-License-Identifier: GPL-3.0-only

//! Persisted observable key-value cells.
//!
//! The keyboard keeps its focus state in a single cell shared by every part
//! of the extension. This module defines the cell contract and two backends:
//!
//! - [`MemoryStore`]: in-process cell, used by tests and short-lived sessions
//! - [`FileStore`]: JSON file shared between processes, one entry per key
//!
//! Every successful `set` is pushed to all live subscribers, so a rendering
//! layer can redraw whenever the value changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use kiosk_keyboard::store::{MemoryStore, Store, StoreOptions};
//! use futures::StreamExt;
//!
//! let store = MemoryStore::new(0u32, StoreOptions::default());
//! let mut updates = store.subscribe();
//! store.set(5).await?;
//! assert_eq!(updates.next().await, Some(5));
//! ```

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("storage I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored document could not be encoded or decoded.
    #[error("storage entry '{key}' is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The storage area does not accept writes.
    #[error("storage area {0:?} is read-only")]
    ReadOnly(StorageArea),
}

/// Storage tier a cell lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageArea {
    /// Device-local storage
    #[default]
    Local,
    /// Storage synced across the user's devices
    Sync,
    /// Storage dropped when the browser session ends
    Session,
    /// Administrator-provided, read-only storage
    Managed,
}

impl StorageArea {
    /// Whether writes are allowed in this area.
    pub fn is_writable(self) -> bool {
        !matches!(self, StorageArea::Managed)
    }
}

/// Options a cell was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Storage tier
    #[serde(default)]
    pub area: StorageArea,
    /// Pick up writes made by other contexts on every read
    #[serde(default = "default_live_update")]
    pub live_update: bool,
}

fn default_live_update() -> bool {
    true
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            area: StorageArea::Local,
            live_update: true,
        }
    }
}

impl StoreOptions {
    pub fn with_area(mut self, area: StorageArea) -> Self {
        self.area = area;
        self
    }

    pub fn with_live_update(mut self, live_update: bool) -> Self {
        self.live_update = live_update;
        self
    }
}

/// An asynchronous observable cell holding one value of type `T`.
#[async_trait]
pub trait Store<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// Returns the current value.
    async fn get(&self) -> StoreResult<T>;

    /// Replaces the value and notifies subscribers.
    async fn set(&self, value: T) -> StoreResult<()>;

    /// Returns a stream receiving every value written after this call.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<T>;

    /// Options this cell was created with.
    fn options(&self) -> &StoreOptions;
}

/// Fan-out list of subscriber channels shared by the backends.
#[derive(Debug)]
pub(crate) struct Subscribers<T> {
    senders: Mutex<Vec<mpsc::UnboundedSender<T>>>,
}

impl<T: Clone> Subscribers<T> {
    pub(crate) fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Sends `value` to every subscriber, dropping closed channels.
    pub(crate) fn notify(&self, value: &T) {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|tx| tx.unbounded_send(value.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

// ============================================================================
// Tests
// ============================================================================
