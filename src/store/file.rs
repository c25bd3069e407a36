// SPDX-License-Identifier: GPL-3.0-only

//! JSON file store backend.
//!
//! The file holds one JSON object whose members are the keyed cells, so
//! several cells can share a file the way they share a browser storage area:
//!
//! ```json
//! { "virtual-keyboard-storage-key": { "activeElementId": null, ... } }
//! ```
//!
//! Writes go through a fresh temporary file renamed over the original, so
//! readers never see a half-written document.

use super::{Store, StoreError, StoreOptions, StoreResult, Subscribers};
use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError};
use tokio::sync::Mutex;

/// A store cell persisted as one entry of a JSON file.
///
/// Cells of one process backed by the same file take turns writing it. With
/// `live_update` on, subscribers also hear about writes made through other
/// handles on the file, picked up by a watcher started on first `subscribe`.
pub struct FileStore<T> {
    shared: Arc<Shared<T>>,
    options: StoreOptions,
    watcher: std::sync::Mutex<Option<RecommendedWatcher>>,
}

/// State reachable from both the store and its watcher task.
struct Shared<T> {
    path: PathBuf,
    key: String,
    fallback: T,
    file_lock: Arc<Mutex<()>>,
    /// Last value read or written; only consulted when `live_update` is off.
    cache: Mutex<Option<T>>,
    /// Entry as last written or announced. Watcher events for it stay silent.
    announced: std::sync::Mutex<Option<Value>>,
    subscribers: Subscribers<T>,
}

impl<T> fmt::Debug for FileStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.shared.path)
            .field("key", &self.shared.key)
            .field("options", &self.options)
            .finish()
    }
}

/// Write lock shared by every cell of this process backed by `path`.
fn file_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Replaces `path` with `contents` through a uniquely named sibling file.
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl<T> Shared<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_err(&self, source: serde_json::Error) -> StoreError {
        StoreError::Json {
            key: self.key.clone(),
            source,
        }
    }

    fn parse_document(&self, contents: &str) -> StoreResult<Map<String, Value>> {
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(contents).map_err(|source| self.json_err(source))
    }

    async fn read_document(&self) -> StoreResult<Map<String, Value>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => self.parse_document(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(source) => Err(self.io_err(source)),
        }
    }

    /// Takes this cell's entry out of `document`, or encodes the fallback.
    fn entry_in(&self, document: &mut Map<String, Value>) -> StoreResult<Value> {
        match document.remove(&self.key) {
            Some(entry) => Ok(entry),
            None => serde_json::to_value(&self.fallback).map_err(|source| self.json_err(source)),
        }
    }

    async fn read_entry(&self) -> StoreResult<Value> {
        let mut document = self.read_document().await?;
        self.entry_in(&mut document)
    }

    fn decode(&self, entry: Value) -> StoreResult<T> {
        serde_json::from_value(entry).map_err(|source| self.json_err(source))
    }

    async fn write_document(&self, document: &Map<String, Value>) -> StoreResult<()> {
        let encoded = serde_json::to_vec_pretty(document).map_err(|source| self.json_err(source))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &encoded))
            .await
            .map_err(|e| self.io_err(std::io::Error::other(e)))?
            .map_err(|source| self.io_err(source))
    }

    /// Records the entry present when watching starts, unless a write already did.
    fn prime_announced(&self) {
        let entry = match std::fs::read_to_string(&self.path) {
            Ok(contents) => self
                .parse_document(&contents)
                .and_then(|mut document| self.entry_in(&mut document)),
            Err(e) if e.kind() == ErrorKind::NotFound => self.entry_in(&mut Map::new()),
            Err(source) => Err(self.io_err(source)),
        };

        match entry {
            Ok(entry) => {
                self.announced
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get_or_insert(entry);
            }
            Err(e) => tracing::warn!("Cannot read '{}' before watching: {}", self.key, e),
        }
    }

    /// Re-reads the entry and announces it when another handle changed it.
    async fn refresh(&self) {
        // Serializes with `set` on this cell, which announces its own writes.
        let _cell = self.cache.lock().await;

        let entry = match self.read_entry().await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot re-read '{}' from {}: {}", self.key, self.path.display(), e);
                return;
            }
        };

        {
            let mut announced = self.announced.lock().unwrap_or_else(PoisonError::into_inner);
            if announced.as_ref() == Some(&entry) {
                return;
            }
            *announced = Some(entry.clone());
        }

        match self.decode(entry) {
            Ok(value) => {
                tracing::debug!("'{}' changed in {}", self.key, self.path.display());
                self.subscribers.notify(&value);
            }
            Err(e) => tracing::warn!("Ignoring unreadable update: {}", e),
        }
    }
}

impl<T> FileStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Creates a cell stored under `key` in the file at `path`.
    ///
    /// The file is not touched until the first read or write. `fallback` is
    /// returned while the file or the key does not exist.
    pub fn new(
        path: impl Into<PathBuf>,
        key: impl Into<String>,
        fallback: T,
        options: StoreOptions,
    ) -> Self {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        Self {
            shared: Arc::new(Shared {
                file_lock: file_lock(&path),
                path,
                key: key.into(),
                fallback,
                cache: Mutex::new(None),
                announced: std::sync::Mutex::new(None),
                subscribers: Subscribers::new(),
            }),
            options,
            watcher: std::sync::Mutex::new(None),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Starts the file watcher once. Needs a running tokio runtime.
    fn watch(&self) {
        let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        if watcher.is_some() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                "No async runtime, {} will not be watched",
                self.shared.path.display()
            );
            return;
        };

        match self.spawn_watcher(&runtime) {
            Ok(started) => *watcher = Some(started),
            Err(e) => tracing::warn!("Cannot watch {}: {}", self.shared.path.display(), e),
        }
    }

    fn spawn_watcher(&self, runtime: &tokio::runtime::Handle) -> notify::Result<RecommendedWatcher> {
        let dir = parent_dir(&self.shared.path);
        std::fs::create_dir_all(dir)?;

        let file_name = self.shared.path.file_name().map(|n| n.to_os_string());
        let (tx, mut rx) = mpsc::unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                if event.paths.iter().any(|p| p.file_name() == file_name.as_deref()) {
                    let _ = tx.unbounded_send(());
                }
            }
        })?;

        // Writers replace the file by rename, so watch its directory.
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.shared.prime_announced();

        let shared = Arc::downgrade(&self.shared);
        runtime.spawn(async move {
            while rx.next().await.is_some() {
                // One re-read covers a burst of events.
                while let Ok(Some(())) = rx.try_next() {}
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.refresh().await;
            }
        });

        tracing::debug!("Watching {} for '{}'", dir.display(), self.shared.key);
        Ok(watcher)
    }
}

#[async_trait]
impl<T> Store<T> for FileStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self) -> StoreResult<T> {
        let shared = &self.shared;
        let mut cache = shared.cache.lock().await;

        if !self.options.live_update {
            if let Some(value) = cache.as_ref() {
                return Ok(value.clone());
            }
        }

        let value = shared.decode(shared.read_entry().await?)?;
        *cache = Some(value.clone());
        Ok(value)
    }

    async fn set(&self, value: T) -> StoreResult<()> {
        if !self.options.area.is_writable() {
            return Err(StoreError::ReadOnly(self.options.area));
        }

        let shared = &self.shared;
        let entry = serde_json::to_value(&value).map_err(|source| shared.json_err(source))?;

        // Every cell on this file rewrites the whole document.
        let _file = shared.file_lock.lock().await;
        let mut cache = shared.cache.lock().await;

        let mut document = shared.read_document().await?;
        document.insert(shared.key.clone(), entry.clone());
        shared.write_document(&document).await?;

        *cache = Some(value.clone());
        *shared.announced.lock().unwrap_or_else(PoisonError::into_inner) = Some(entry);

        tracing::debug!("Stored '{}' in {}", shared.key, shared.path.display());
        shared.subscribers.notify(&value);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let updates = self.shared.subscribers.subscribe();
        if self.options.live_update {
            self.watch();
        }
        updates
    }

    fn options(&self) -> &StoreOptions {
        &self.options
    }
}

// ============================================================================
// Tests
// ============================================================================
