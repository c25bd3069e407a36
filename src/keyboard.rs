// SPDX-License-Identifier: GPL-3.0-only

//! Keyboard controller.
//!
//! Binds key presses from the rendered widget to the edit engine, the focus
//! tracker and the layout reducer. Each key is either text to insert or a
//! control action, so dispatch is a single exhaustive match.

use crate::dom::Document;
use crate::edit::{EditEngine, EditOutcome};
use crate::focus::FocusTracker;
use crate::layout::{
    ControlAction, Key, KeyAction, KeyLayout, LayoutAction, LayoutState, LayoutTables,
    LayoutVariant,
};
use crate::store::StoreResult;
use std::sync::Arc;

/// How a key was activated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Activation {
    #[default]
    Single,
    /// Double tap; only Shift treats it differently
    Double,
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Text was inserted or deleted (or skipped)
    Edited(EditOutcome),
    /// The displayed table may have changed
    Layout(LayoutVariant),
    /// Focus was cleared and the keyboard hidden
    Dismissed,
}

/// State of one mounted keyboard widget.
///
/// Layout state starts fresh for every instance and is never persisted.
#[derive(Debug, Clone)]
pub struct VirtualKeyboard {
    engine: EditEngine,
    state: LayoutState,
    tables: Arc<LayoutTables>,
}

impl VirtualKeyboard {
    pub fn new(tracker: FocusTracker, tables: Arc<LayoutTables>) -> Self {
        Self {
            engine: EditEngine::new(tracker),
            state: LayoutState::new(),
            tables,
        }
    }

    pub fn tracker(&self) -> &FocusTracker {
        self.engine.tracker()
    }

    pub fn layout_state(&self) -> LayoutState {
        self.state
    }

    /// The table to render for the current mode and shift.
    pub fn current_layout(&self) -> &KeyLayout {
        self.tables.get(self.state.variant())
    }

    /// Whether the widget should render at all.
    pub async fn is_visible(&self) -> StoreResult<bool> {
        self.tracker().is_active().await
    }

    /// Handles one key activation.
    pub async fn press<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        key: &Key,
        activation: Activation,
    ) -> StoreResult<KeyOutcome> {
        tracing::debug!("Key '{}' pressed ({:?})", key.label, activation);

        let outcome = match &key.action {
            KeyAction::Insert(text) => {
                let outcome = self.engine.type_character(doc, text).await?;
                self.state.apply(LayoutAction::ResetTemporaryShift);
                KeyOutcome::Edited(outcome)
            }
            KeyAction::Control(ControlAction::Backspace) => {
                KeyOutcome::Edited(self.engine.backspace(doc).await?)
            }
            KeyAction::Control(ControlAction::Shift) => {
                let action = match activation {
                    Activation::Single => LayoutAction::ToggleTemporaryShift,
                    Activation::Double => LayoutAction::TogglePermanentShift,
                };
                self.state.apply(action);
                KeyOutcome::Layout(self.state.variant())
            }
            KeyAction::Control(ControlAction::SwitchMode(mode)) => {
                self.state.apply(LayoutAction::SwitchMode(*mode));
                KeyOutcome::Layout(self.state.variant())
            }
            KeyAction::Control(ControlAction::Dismiss) => {
                self.tracker().clear_focus().await?;
                KeyOutcome::Dismissed
            }
        };

        Ok(outcome)
    }

    /// Presses the key labelled `label` in the current table, if present.
    pub async fn press_label<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        label: &str,
        activation: Activation,
    ) -> StoreResult<Option<KeyOutcome>> {
        let Some(key) = self.current_layout().find_key(label).cloned() else {
            tracing::debug!("No key labelled '{}' in {:?}", label, self.state.variant());
            return Ok(None);
        };
        self.press(doc, &key, activation).await.map(Some)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDocument, NodeId};
    use crate::focus::FocusState;
    use crate::layout::KeyboardMode;
    use crate::store::{MemoryStore, StoreOptions};

    async fn setup() -> (VirtualKeyboard, MemoryDocument, NodeId) {
        let tracker = FocusTracker::new(Arc::new(MemoryStore::new(
            FocusState::default(),
            StoreOptions::default(),
        )));
        let tables = Arc::new(LayoutTables::load().unwrap());
        let mut doc = MemoryDocument::new();
        let input = doc.append_input(doc.body(), "text").unwrap();
        tracker.focus_input(&mut doc, input).await.unwrap();
        (VirtualKeyboard::new(tracker, tables), doc, input)
    }

    /// Test 1: One-shot shift uppercases exactly one letter
    #[tokio::test]
    async fn test_one_shot_shift_applies_to_one_key() {
        let (mut kb, mut doc, input) = setup().await;

        kb.press_label(&mut doc, "Shift", Activation::Single).await.unwrap();
        assert_eq!(kb.current_layout().variant, LayoutVariant::AlphabeticUpper);

        kb.press_label(&mut doc, "H", Activation::Single).await.unwrap();
        assert_eq!(kb.current_layout().variant, LayoutVariant::AlphabeticLower);

        kb.press_label(&mut doc, "i", Activation::Single).await.unwrap();
        assert_eq!(doc.value(input).as_deref(), Some("Hi"));
    }

    /// Test 2: Double-tapping Shift latches capitals
    #[tokio::test]
    async fn test_double_shift_latches() {
        let (mut kb, mut doc, input) = setup().await;

        kb.press_label(&mut doc, "Shift", Activation::Double).await.unwrap();
        for label in ["O", "K"] {
            kb.press_label(&mut doc, label, Activation::Single).await.unwrap();
        }

        assert_eq!(doc.value(input).as_deref(), Some("OK"));
        assert!(kb.layout_state().permanent_shift);
        assert_eq!(kb.current_layout().variant, LayoutVariant::AlphabeticUpper);
    }

    /// Test 3: Mode switch shows the numeric table
    #[tokio::test]
    async fn test_switch_mode_key() {
        let (mut kb, mut doc, input) = setup().await;

        let outcome = kb.press_label(&mut doc, "?123", Activation::Single).await.unwrap();
        assert_eq!(outcome, Some(KeyOutcome::Layout(LayoutVariant::Numeric)));
        assert_eq!(kb.layout_state().mode, KeyboardMode::Numeric);

        kb.press_label(&mut doc, "4", Activation::Single).await.unwrap();
        kb.press_label(&mut doc, "2", Activation::Single).await.unwrap();
        kb.press_label(&mut doc, "ABC", Activation::Single).await.unwrap();

        assert_eq!(doc.value(input).as_deref(), Some("42"));
        assert_eq!(kb.current_layout().variant, LayoutVariant::AlphabeticLower);
    }

    /// Test 4: Backspace key deletes through the engine
    #[tokio::test]
    async fn test_backspace_key() {
        let (mut kb, mut doc, input) = setup().await;
        doc.set_field(input, "abc", (3, 3)).unwrap();

        kb.press_label(&mut doc, "Backspace", Activation::Single).await.unwrap();

        assert_eq!(doc.value(input).as_deref(), Some("ab"));
    }

    /// Test 5: Close key hides the keyboard
    #[tokio::test]
    async fn test_dismiss_key_clears_focus() {
        let (mut kb, mut doc, _input) = setup().await;
        assert!(kb.is_visible().await.unwrap());

        let outcome = kb.press_label(&mut doc, "Close", Activation::Single).await.unwrap();

        assert_eq!(outcome, Some(KeyOutcome::Dismissed));
        assert!(!kb.is_visible().await.unwrap());
    }

    /// Test 6: Typing without a target still consumes the one-shot shift
    #[tokio::test]
    async fn test_insert_without_target_resets_shift() {
        let (mut kb, mut doc, _input) = setup().await;
        kb.tracker().clear_focus().await.unwrap();

        kb.press_label(&mut doc, "Shift", Activation::Single).await.unwrap();
        let outcome = kb.press_label(&mut doc, "A", Activation::Single).await.unwrap();

        assert!(matches!(outcome, Some(KeyOutcome::Edited(EditOutcome::Skipped(_)))));
        assert_eq!(kb.layout_state().temporary_shift, None);
    }

    /// Test 7: Unknown labels are ignored
    #[tokio::test]
    async fn test_unknown_label() {
        let (mut kb, mut doc, _input) = setup().await;
        let outcome = kb.press_label(&mut doc, "F13", Activation::Single).await.unwrap();
        assert_eq!(outcome, None);
    }
}
