// SPDX-License-Identifier: GPL-3.0-only

//! Tracks which page field the keyboard is typing into.
//!
//! The state lives in a shared [`Store`] cell so every context of the
//! extension (page listener, keyboard widget) sees the same target. The
//! tracker itself holds no state beyond the store handle.

use crate::app_settings::GENERATED_ID_PREFIX;
use crate::dom::{Document, NodeId};
use crate::store::{Store, StoreResult};
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Persisted focus state.
///
/// `is_active` is true exactly when `active_element_id` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    /// Id of the targeted element
    pub active_element_id: Option<String>,
    /// Lowercase tag name of the targeted element
    pub active_element_type: Option<String>,
    /// Whether the keyboard should be shown
    pub is_active: bool,
}

impl FocusState {
    /// State targeting the element with the given id and tag.
    pub fn focused(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            active_element_id: Some(id.into()),
            active_element_type: Some(tag.into()),
            is_active: true,
        }
    }
}

/// Shared handle to the focus state cell.
pub type FocusStore = Arc<dyn Store<FocusState>>;

/// Reads and writes the focus state.
#[derive(Clone)]
pub struct FocusTracker {
    store: FocusStore,
}

impl std::fmt::Debug for FocusTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusTracker")
            .field("options", self.store.options())
            .finish()
    }
}

impl FocusTracker {
    pub fn new(store: FocusStore) -> Self {
        Self { store }
    }

    /// Targets `element`, giving it an id first if it has none.
    ///
    /// Calling this again for the same element reuses the id it was given.
    /// Returns the targeted id, or `None` when the element refused an id and
    /// the state was left untouched.
    pub async fn focus_input<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        element: NodeId,
    ) -> StoreResult<Option<String>> {
        let id = match doc.element_id(element) {
            Some(id) => id,
            None => {
                let id = generate_element_id(doc);
                if let Err(e) = doc.set_element_id(element, &id) {
                    tracing::warn!("Cannot assign id to element {}: {}", element, e);
                    return Ok(None);
                }
                id
            }
        };

        let tag = doc
            .tag_name(element)
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_default();

        self.store.set(FocusState::focused(id.clone(), tag)).await?;
        tracing::debug!("Virtual keyboard focused on element: {}", id);
        Ok(Some(id))
    }

    /// Drops the current target and hides the keyboard.
    pub async fn clear_focus(&self) -> StoreResult<()> {
        self.store.set(FocusState::default()).await?;
        tracing::debug!("Virtual keyboard focus cleared");
        Ok(())
    }

    pub async fn is_active(&self) -> StoreResult<bool> {
        let state = self.store.get().await?;
        tracing::trace!("Checking if virtual keyboard is active: {:?}", state);
        Ok(state.is_active)
    }

    /// Snapshot of the current state.
    pub async fn get(&self) -> StoreResult<FocusState> {
        self.store.get().await
    }

    /// Stream of every state written after this call.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<FocusState> {
        self.store.subscribe()
    }
}

/// Builds a timestamp-derived id not yet used in `doc`.
fn generate_element_id<D: Document + ?Sized>(doc: &D) -> String {
    let base = format!("{}{}", GENERATED_ID_PREFIX, chrono::Utc::now().timestamp_millis());
    if doc.get_element_by_id(&base).is_none() {
        return base;
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if doc.get_element_by_id(&candidate).is_none() {
            return candidate;
        }
        suffix += 1;
    }
}

// ============================================================================
// Tests
// ============================================================================
