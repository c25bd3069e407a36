// SPDX-License-Identifier: GPL-3.0-only

//! Key model and the four embedded key tables.
//!
//! Tables are JSON files under `resources/layouts/`, compiled into the
//! binary. Each key either inserts text or triggers a control action:
//!
//! ```json
//! { "label": "q", "action": { "insert": "q" } }
//! { "label": "Backspace", "action": { "control": "backspace" }, "width": "140px" }
//! { "label": "?123", "action": { "control": { "switch_mode": "numeric" } } }
//! ```

use super::{KeyboardMode, LayoutVariant};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(RustEmbed)]
#[folder = "resources/layouts/"]
struct LayoutAssets;

/// Errors raised while loading key tables.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The table is not embedded.
    #[error("key table '{0}' is missing")]
    Missing(String),

    /// The table is not valid JSON for the key model.
    #[error("key table '{name}' is malformed at line {}: {source}", .source.line())]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The table parsed but breaks a structural rule.
    #[error("key table '{name}' is invalid: {message}")]
    Invalid { name: String, message: String },
}

/// Non-character key behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Delete backwards
    Backspace,
    /// Single tap: one-shot shift; double tap: latch
    Shift,
    /// Show the given mode
    SwitchMode(KeyboardMode),
    /// Drop focus and hide the keyboard
    Dismiss,
}

/// What a key does when activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Type this text at the caret
    Insert(String),
    /// Run a control action
    Control(ControlAction),
}

/// A key of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Text shown on the key
    pub label: String,
    pub action: KeyAction,
    /// Minimum rendered width (CSS length), if wider than standard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
}

impl Key {
    pub fn insert(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: KeyAction::Insert(text.into()),
            width: None,
        }
    }

    pub fn control(label: impl Into<String>, action: ControlAction) -> Self {
        Self {
            label: label.into(),
            action: KeyAction::Control(action),
            width: None,
        }
    }
}

/// One static key table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLayout {
    pub variant: LayoutVariant,
    pub rows: Vec<Vec<Key>>,
}

impl KeyLayout {
    /// Parses and validates a table expected to be `variant`.
    pub fn from_json(variant: LayoutVariant, json: &str) -> Result<Self, LayoutError> {
        let name = variant.file_stem();
        let layout: KeyLayout = serde_json::from_str(json).map_err(|source| LayoutError::Json {
            name: name.to_string(),
            source,
        })?;

        let invalid = |message: String| LayoutError::Invalid {
            name: name.to_string(),
            message,
        };

        if layout.variant != variant {
            return Err(invalid(format!(
                "declares variant {:?}, expected {:?}",
                layout.variant, variant
            )));
        }
        if layout.rows.is_empty() {
            return Err(invalid("has no rows".to_string()));
        }
        for (r, row) in layout.rows.iter().enumerate() {
            if row.is_empty() {
                return Err(invalid(format!("row {} is empty", r)));
            }
            for (k, key) in row.iter().enumerate() {
                if key.label.is_empty() {
                    return Err(invalid(format!("rows[{}][{}] has an empty label", r, k)));
                }
                if matches!(&key.action, KeyAction::Insert(text) if text.is_empty()) {
                    return Err(invalid(format!("rows[{}][{}] inserts empty text", r, k)));
                }
            }
        }

        Ok(layout)
    }

    /// Iterates all keys row by row.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.rows.iter().flatten()
    }

    /// First key with the given label.
    pub fn find_key(&self, label: &str) -> Option<&Key> {
        self.keys().find(|key| key.label == label)
    }
}

/// The four tables, indexed by [`LayoutVariant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTables {
    layouts: [KeyLayout; 4],
}

impl LayoutTables {
    /// Loads the embedded tables.
    pub fn load() -> Result<Self, LayoutError> {
        let mut layouts = Vec::with_capacity(LayoutVariant::ALL.len());
        for variant in LayoutVariant::ALL {
            let file = format!("{}.json", variant.file_stem());
            let asset = LayoutAssets::get(&file).ok_or_else(|| LayoutError::Missing(file.clone()))?;
            let json = String::from_utf8_lossy(&asset.data);
            layouts.push(KeyLayout::from_json(variant, &json)?);
        }
        tracing::debug!("Loaded {} key tables", layouts.len());
        Self::from_layouts(layouts)
    }

    /// Builds the set from tables given in [`LayoutVariant::ALL`] order.
    pub fn from_layouts(layouts: Vec<KeyLayout>) -> Result<Self, LayoutError> {
        for (layout, variant) in layouts.iter().zip(LayoutVariant::ALL) {
            if layout.variant != variant {
                return Err(LayoutError::Invalid {
                    name: variant.file_stem().to_string(),
                    message: format!("found {:?} in its slot", layout.variant),
                });
            }
        }
        let count = layouts.len();
        let layouts: [KeyLayout; 4] = layouts.try_into().map_err(|_| LayoutError::Invalid {
            name: "tables".to_string(),
            message: format!("expected 4 tables, got {}", count),
        })?;
        Ok(Self { layouts })
    }

    pub fn get(&self, variant: LayoutVariant) -> &KeyLayout {
        let index = match variant {
            LayoutVariant::AlphabeticLower => 0,
            LayoutVariant::AlphabeticUpper => 1,
            LayoutVariant::Numeric => 2,
            LayoutVariant::NumericShifted => 3,
        };
        &self.layouts[index]
    }
}

// ============================================================================
// Tests
// ============================================================================
