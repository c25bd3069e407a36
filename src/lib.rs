// SPDX-License-Identifier: GPL-3.0-only

//! Kiosk Keyboard - an on-screen keyboard for web pages
//!
//! This crate provides the logic behind a virtual keyboard injected into web
//! pages on kiosk devices. The keyboard types into whichever input or text
//! area the user last tapped, and tracks that target in a store shared by
//! every context of the extension.
//!
//! # Architecture
//!
//! Three cooperating parts:
//!
//! 1. **Focus tracking** (`focus`): which field is targeted and whether the
//!    keyboard is shown, kept in an observable store cell.
//!
//! 2. **Editing** (`edit`): caret-aware insertion and deletion in the target
//!    field, followed by the `input` event native typing would fire.
//!
//! 3. **Layout state** (`layout`): mode and shift reducer choosing one of
//!    four key tables.
//!
//! # Modules
//!
//! - `app_settings`: Centralized constants
//! - `config`: User configuration loaded from JSON
//! - `dom`: Page document boundary and an in-memory document
//! - `edit`: Text mutations and the edit engine
//! - `focus`: Focus state and tracker
//! - `keyboard`: Key press controller
//! - `layout`: Layout reducer, key model and embedded tables
//! - `page`: Page pointer-up listener
//! - `store`: Observable store cells (memory and JSON file)

pub mod app_settings;
pub mod config;
pub mod dom;
pub mod edit;
pub mod focus;
pub mod keyboard;
pub mod layout;
pub mod page;
pub mod store;

pub use focus::{FocusState, FocusTracker};
pub use keyboard::{Activation, VirtualKeyboard};

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod integration_tests {
    use crate::app_settings::{FOCUS_STORAGE_KEY, KEYBOARD_ROOT_ID};
    use crate::dom::{Document, InputType, MemoryDocument, NodeId};
    use crate::edit::{EditEngine, EditOutcome};
    use crate::focus::{FocusState, FocusTracker};
    use crate::keyboard::{Activation, VirtualKeyboard};
    use crate::layout::{KeyboardMode, LayoutAction, LayoutState, LayoutTables, LayoutVariant};
    use crate::page::{PageListener, PointerOutcome};
    use crate::store::{FileStore, MemoryStore, StoreOptions};
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn memory_tracker() -> FocusTracker {
        FocusTracker::new(Arc::new(MemoryStore::new(
            FocusState::default(),
            StoreOptions::default(),
        )))
    }

    struct Page {
        doc: MemoryDocument,
        input: NodeId,
        textarea: NodeId,
        heading: NodeId,
    }

    fn demo_page() -> Page {
        let mut doc = MemoryDocument::new();
        let form = doc.append_element(doc.body(), "form").unwrap();
        let input = doc.append_input(form, "text").unwrap();
        let textarea = doc.append_element(form, "textarea").unwrap();
        let heading = doc.append_element(doc.body(), "h1").unwrap();
        let root = doc.append_element(doc.body(), "div").unwrap();
        doc.set_element_id(root, KEYBOARD_ROOT_ID).unwrap();
        Page {
            doc,
            input,
            textarea,
            heading,
        }
    }

    /// Integration Test 1: Focusing the same element twice keeps one id
    #[tokio::test]
    async fn test_idempotent_identifier_assignment() {
        let tracker = memory_tracker();
        let mut page = demo_page();

        tracker.focus_input(&mut page.doc, page.input).await.unwrap();
        let first = tracker.get().await.unwrap().active_element_id;
        tracker.focus_input(&mut page.doc, page.input).await.unwrap();
        let second = tracker.get().await.unwrap().active_element_id;

        assert!(first.is_some());
        assert_eq!(first, second, "Second focus must not allocate a new id");
    }

    /// Integration Test 2: Insertion and selection replacement
    #[tokio::test]
    async fn test_insertion_and_selection_replace() {
        let tracker = memory_tracker();
        let engine = EditEngine::new(tracker.clone());
        let mut page = demo_page();
        tracker.focus_input(&mut page.doc, page.textarea).await.unwrap();

        page.doc.set_field(page.textarea, "helo", (2, 2)).unwrap();
        engine.type_character(&mut page.doc, "l").await.unwrap();
        assert_eq!(page.doc.value(page.textarea).as_deref(), Some("hello"));
        assert_eq!(page.doc.control(page.textarea).unwrap().selection(), (3, 3));

        page.doc.set_field(page.textarea, "hello world", (0, 5)).unwrap();
        engine.type_character(&mut page.doc, "X").await.unwrap();
        assert_eq!(page.doc.value(page.textarea).as_deref(), Some("X world"));
        assert_eq!(page.doc.control(page.textarea).unwrap().selection(), (1, 1));
    }

    /// Integration Test 3: Backspace variants and the no-op guard
    #[tokio::test]
    async fn test_backspace_properties() {
        let tracker = memory_tracker();
        let engine = EditEngine::new(tracker.clone());
        let mut page = demo_page();
        tracker.focus_input(&mut page.doc, page.input).await.unwrap();

        page.doc.set_field(page.input, "hello", (5, 5)).unwrap();
        engine.backspace(&mut page.doc).await.unwrap();
        assert_eq!(page.doc.value(page.input).as_deref(), Some("hell"));
        assert_eq!(page.doc.control(page.input).unwrap().selection(), (4, 4));

        page.doc.take_dispatched();
        page.doc.set_field(page.input, "hello", (0, 0)).unwrap();
        let outcome = engine.backspace(&mut page.doc).await.unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert_eq!(page.doc.value(page.input).as_deref(), Some("hello"));
        assert!(page.doc.dispatched().is_empty(), "No event at start of field");

        page.doc.set_field(page.input, "hello world", (6, 11)).unwrap();
        engine.backspace(&mut page.doc).await.unwrap();
        assert_eq!(page.doc.value(page.input).as_deref(), Some("hello "));
        assert_eq!(page.doc.control(page.input).unwrap().selection(), (6, 6));
        let delivered = page.doc.dispatched();
        assert_eq!(delivered[0].event.input_type, InputType::DeleteContentBackward);
        assert!(
            delivered.iter().any(|d| d.current_target == page.doc.body()),
            "Event should bubble to body"
        );
    }

    /// Integration Test 4: One-shot shift through the reducer
    #[test]
    fn test_one_shot_shift_property() {
        let state = LayoutState::new().reduce(LayoutAction::ToggleTemporaryShift);
        assert_eq!(state.variant(), LayoutVariant::AlphabeticUpper);

        let state = state.reduce(LayoutAction::ResetTemporaryShift);
        assert_eq!(state.effective_shift(), state.permanent_shift);
        assert_eq!(state.variant(), LayoutVariant::AlphabeticLower);
    }

    /// Integration Test 5: clear_focus invariant from any prior state
    #[tokio::test]
    async fn test_clear_focus_invariant() {
        let tracker = memory_tracker();
        let mut page = demo_page();

        tracker.clear_focus().await.unwrap();
        assert!(!tracker.is_active().await.unwrap());

        tracker.focus_input(&mut page.doc, page.input).await.unwrap();
        tracker.clear_focus().await.unwrap();
        let state = tracker.get().await.unwrap();
        assert!(!state.is_active);
        assert_eq!(state.active_element_id, None);
    }

    /// Integration Test 6: Typing with no target touches nothing
    #[tokio::test]
    async fn test_no_target_noop() {
        let tracker = memory_tracker();
        let engine = EditEngine::new(tracker);
        let mut page = demo_page();
        page.doc.set_field(page.input, "abc", (1, 1)).unwrap();
        let before = page.doc.clone();

        let outcome = engine.type_character(&mut page.doc, "x").await.unwrap();

        assert!(matches!(outcome, EditOutcome::Skipped(_)));
        assert_eq!(page.doc.value(page.input), before.value(page.input));
        assert_eq!(page.doc.control(page.input), before.control(page.input));
        assert!(page.doc.dispatched().is_empty());
    }

    /// Integration Test 7: Mode switch always clears the one-shot flag
    #[test]
    fn test_mode_switch_resets_temporary_shift() {
        let shifted = LayoutState::new().reduce(LayoutAction::ToggleTemporaryShift);
        let switched = shifted.reduce(LayoutAction::SwitchMode(KeyboardMode::Numeric));
        assert_eq!(switched.temporary_shift, None);
        assert_eq!(switched.variant(), LayoutVariant::Numeric);
    }

    /// Integration Test 8: Full session, tap field, type, tap away
    #[tokio::test]
    async fn test_full_session_workflow() {
        let tracker = memory_tracker();
        let mut updates = tracker.subscribe();
        let listener = PageListener::new(tracker.clone(), KEYBOARD_ROOT_ID);
        let mut keyboard = VirtualKeyboard::new(tracker.clone(), Arc::new(LayoutTables::load().unwrap()));
        let mut page = demo_page();

        let outcome = listener.on_pointer_up(&mut page.doc, page.input).await.unwrap();
        assert_eq!(outcome, PointerOutcome::Focused(page.input));
        assert!(keyboard.is_visible().await.unwrap());

        keyboard.press_label(&mut page.doc, "Shift", Activation::Single).await.unwrap();
        for label in ["H", "i", "@"] {
            keyboard.press_label(&mut page.doc, label, Activation::Single).await.unwrap();
        }
        keyboard.press_label(&mut page.doc, ".com", Activation::Single).await.unwrap();
        assert_eq!(page.doc.value(page.input).as_deref(), Some("Hi@.com"));

        let outcome = listener.on_pointer_up(&mut page.doc, page.heading).await.unwrap();
        assert_eq!(outcome, PointerOutcome::Cleared);
        assert!(!keyboard.is_visible().await.unwrap());

        let first = updates.next().await.unwrap();
        assert!(first.is_active);
        let second = updates.next().await.unwrap();
        assert_eq!(second, FocusState::default());
    }

    /// Integration Test 9: Focus state shared through a file reaches another tracker
    #[tokio::test]
    async fn test_focus_state_shared_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let page_side = FocusTracker::new(Arc::new(FileStore::new(
            &path,
            FOCUS_STORAGE_KEY,
            FocusState::default(),
            StoreOptions::default(),
        )));
        let widget_side = FocusTracker::new(Arc::new(FileStore::new(
            &path,
            FOCUS_STORAGE_KEY,
            FocusState::default(),
            StoreOptions::default(),
        )));
        let mut redraws = widget_side.subscribe();
        let mut page = demo_page();
        page.doc.set_element_id(page.textarea, "notes").unwrap();

        page_side.focus_input(&mut page.doc, page.textarea).await.unwrap();

        assert_eq!(
            widget_side.get().await.unwrap(),
            FocusState::focused("notes", "textarea")
        );
        let redraw = tokio::time::timeout(Duration::from_secs(5), redraws.next()).await;
        assert_eq!(
            redraw.ok().flatten(),
            Some(FocusState::focused("notes", "textarea")),
            "Widget should be told about focus set by the page"
        );

        let engine = EditEngine::new(widget_side);
        engine.type_character(&mut page.doc, "x").await.unwrap();
        assert_eq!(page.doc.value(page.textarea).as_deref(), Some("x"));
    }
}
