// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard mode and shift state.
//!
//! The displayed key table is a function of two things: the mode
//! (letters or numbers/symbols) and the effective shift. Shift has two
//! speeds:
//!
//! - **One-shot** (`temporary_shift`): a single tap on Shift, cleared after
//!   the next committed character
//! - **Latched** (`permanent_shift`): a double tap, stays until toggled off
//!
//! When the one-shot flag is unset the latched flag decides.
//!
//! # Example
//!
//! ```rust,ignore
//! use kiosk_keyboard::layout::{LayoutAction, LayoutState, LayoutVariant};
//!
//! let mut state = LayoutState::new();
//! state.apply(LayoutAction::ToggleTemporaryShift);
//! assert_eq!(state.variant(), LayoutVariant::AlphabeticUpper);
//!
//! // ... a character is typed ...
//! state.apply(LayoutAction::ResetTemporaryShift);
//! assert_eq!(state.variant(), LayoutVariant::AlphabeticLower);
//! ```

pub mod keys;

pub use keys::{ControlAction, Key, KeyAction, KeyLayout, LayoutError, LayoutTables};

use serde::{Deserialize, Serialize};

/// Which family of key tables is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardMode {
    /// Letters
    #[default]
    Alphabetic,
    /// Digits and symbols
    Numeric,
}

/// One of the four static key tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutVariant {
    AlphabeticLower,
    AlphabeticUpper,
    Numeric,
    NumericShifted,
}

impl LayoutVariant {
    pub const ALL: [LayoutVariant; 4] = [
        LayoutVariant::AlphabeticLower,
        LayoutVariant::AlphabeticUpper,
        LayoutVariant::Numeric,
        LayoutVariant::NumericShifted,
    ];

    /// File stem of the embedded table.
    pub fn file_stem(self) -> &'static str {
        match self {
            LayoutVariant::AlphabeticLower => "alphabetic_lower",
            LayoutVariant::AlphabeticUpper => "alphabetic_upper",
            LayoutVariant::Numeric => "numeric",
            LayoutVariant::NumericShifted => "numeric_shifted",
        }
    }
}

/// Picks the table for a mode and effective shift.
pub fn select_variant(mode: KeyboardMode, shift: bool) -> LayoutVariant {
    match (mode, shift) {
        (KeyboardMode::Alphabetic, false) => LayoutVariant::AlphabeticLower,
        (KeyboardMode::Alphabetic, true) => LayoutVariant::AlphabeticUpper,
        (KeyboardMode::Numeric, false) => LayoutVariant::Numeric,
        (KeyboardMode::Numeric, true) => LayoutVariant::NumericShifted,
    }
}

/// Reducer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutAction {
    /// Show another mode; drops a pending one-shot shift
    SwitchMode(KeyboardMode),
    /// Flip the one-shot shift (unset counts as off)
    ToggleTemporaryShift,
    /// Flip the latched shift; drops a pending one-shot shift
    TogglePermanentShift,
    /// Drop the one-shot shift, sent after every committed character
    ResetTemporaryShift,
}

/// Mode and shift state of one mounted keyboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutState {
    pub mode: KeyboardMode,
    pub permanent_shift: bool,
    pub temporary_shift: Option<bool>,
}

impl LayoutState {
    /// Letters, no shift.
    pub fn new() -> Self {
        Self::default()
    }

    /// One-shot shift if set, otherwise the latched shift.
    pub fn effective_shift(&self) -> bool {
        self.temporary_shift.unwrap_or(self.permanent_shift)
    }

    pub fn variant(&self) -> LayoutVariant {
        select_variant(self.mode, self.effective_shift())
    }

    /// Returns the state after `action`.
    #[must_use]
    pub fn reduce(self, action: LayoutAction) -> Self {
        match action {
            LayoutAction::SwitchMode(mode) => Self {
                mode,
                temporary_shift: None,
                ..self
            },
            LayoutAction::ToggleTemporaryShift => Self {
                temporary_shift: Some(!self.temporary_shift.unwrap_or(false)),
                ..self
            },
            LayoutAction::TogglePermanentShift => Self {
                permanent_shift: !self.permanent_shift,
                temporary_shift: None,
                ..self
            },
            LayoutAction::ResetTemporaryShift => Self {
                temporary_shift: None,
                ..self
            },
        }
    }

    /// Applies `action` in place.
    pub fn apply(&mut self, action: LayoutAction) {
        *self = self.reduce(action);
        tracing::trace!("Layout state after {:?}: {:?}", action, self);
    }
}

// ============================================================================
// Tests
// ============================================================================
