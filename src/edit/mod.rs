// SPDX-License-Identifier: GPL-3.0-only

//! Writes key presses into the focused page field.
//!
//! Each operation re-reads the focus state, looks the target up by id, edits
//! its value around the caret and then replays the `input` event native typing
//! would have fired, so frameworks bound to the field update their own model.
//!
//! The order of side effects is fixed: value, then focus and caret, then the
//! event. Listeners therefore see the final value and caret.
//!
//! A missing or non-editable target is never an error: the edit is skipped
//! and logged. Only store failures reach the caller.

pub mod text;

pub use text::{TextEdit, delete_backward, insert_text, resolve_selection};

use crate::dom::{ControlKind, Document, InputEvent, NodeId, TextControl, input_type_supports_selection};
use crate::focus::{FocusState, FocusTracker};
use crate::store::StoreResult;
use std::fmt;

/// Why an edit found nothing to write into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMissing {
    /// No element is focused
    NoActiveElement,
    /// The stored id no longer resolves to a connected element
    NotFound(String),
    /// The element is neither an input nor a text area
    NotEditable(String),
}

impl fmt::Display for TargetMissing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetMissing::NoActiveElement => write!(f, "no active element"),
            TargetMissing::NotFound(id) => write!(f, "element '{}' not found", id),
            TargetMissing::NotEditable(id) => write!(f, "element '{}' is not editable", id),
        }
    }
}

/// Result of an edit operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The field was rewritten and an input event dispatched
    Applied(TextEdit),
    /// Nothing to change; no event was dispatched
    Unchanged,
    /// No usable target
    Skipped(TargetMissing),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied(_))
    }
}

/// Applies key presses to the element the [`FocusTracker`] points at.
#[derive(Debug, Clone)]
pub struct EditEngine {
    tracker: FocusTracker,
}

impl EditEngine {
    pub fn new(tracker: FocusTracker) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &FocusTracker {
        &self.tracker
    }

    /// Inserts `text` at the caret, replacing any selection.
    pub async fn type_character<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        text: &str,
    ) -> StoreResult<EditOutcome> {
        let state = self.tracker.get().await?;
        let (node, value, start, end) = match read_target(doc, &state) {
            Ok(target) => target,
            Err(missing) => {
                tracing::warn!("No active element to type into: {}", missing);
                return Ok(EditOutcome::Skipped(missing));
            }
        };

        let edit = insert_text(&value, start, end, text);

        tracing::debug!(
            "Typing {:?} into {}: {:?} [{}..{}] -> {:?} caret {}",
            text,
            node,
            value,
            start,
            end,
            edit.value,
            edit.caret
        );

        commit(doc, node, &edit, &InputEvent::insert_text(text));
        Ok(EditOutcome::Applied(edit))
    }

    /// Deletes the selection, or the character before the caret.
    ///
    /// Nothing is written and no event fires when there is nothing to delete.
    pub async fn backspace<D: Document + ?Sized>(&self, doc: &mut D) -> StoreResult<EditOutcome> {
        let state = self.tracker.get().await?;
        let (node, value, start, end) = match read_target(doc, &state) {
            Ok(target) => target,
            Err(missing) => {
                tracing::warn!("No active element to backspace into: {}", missing);
                return Ok(EditOutcome::Skipped(missing));
            }
        };

        let edit = delete_backward(&value, start, end);
        if edit.value == value {
            tracing::debug!("Backspace at start of {} left it unchanged", node);
            return Ok(EditOutcome::Unchanged);
        }

        commit(doc, node, &edit, &InputEvent::delete_content_backward());
        Ok(EditOutcome::Applied(edit))
    }
}

/// Resolves the focused element and reads its value and selection.
fn read_target<D: Document + ?Sized>(
    doc: &mut D,
    state: &FocusState,
) -> Result<(NodeId, String, usize, usize), TargetMissing> {
    let id = state
        .active_element_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(TargetMissing::NoActiveElement)?;

    let node = doc
        .get_element_by_id(id)
        .ok_or_else(|| TargetMissing::NotFound(id.to_string()))?;

    let control = doc
        .text_control(node)
        .ok_or_else(|| TargetMissing::NotEditable(id.to_string()))?;

    let value = control.value();
    let (start, end) = resolve_selection(&value, control.selection_start(), control.selection_end());
    Ok((node, value, start, end))
}

/// Writes the edit, restores focus and caret, then dispatches `event`.
fn commit<D: Document + ?Sized>(doc: &mut D, node: NodeId, edit: &TextEdit, event: &InputEvent) {
    if let Some(control) = doc.text_control(node) {
        control.set_value(&edit.value);
    }

    // Selection can only be placed on the focused element.
    doc.focus(node);

    if let Some(control) = doc.text_control(node) {
        restore_caret(control, edit.caret);
    }

    doc.dispatch_input_event(node, event);
}

/// Collapses the selection at `caret`.
///
/// Input types without selection support (email, number, ...) are switched
/// to `text` for the call and switched back afterwards.
fn restore_caret(control: &mut dyn TextControl, caret: usize) {
    let coerce = control.kind() == ControlKind::Input
        && !input_type_supports_selection(&control.control_type());

    let result = if coerce {
        let original = control.control_type();
        control.set_control_type("text");
        let result = control.set_selection_range(caret, caret);
        control.set_control_type(&original);
        result
    } else {
        control.set_selection_range(caret, caret)
    };

    if let Err(e) = result {
        tracing::warn!("Could not restore caret to {}: {}", caret, e);
    }
}

// ============================================================================
// Tests
// ============================================================================
