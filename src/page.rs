// SPDX-License-Identifier: GPL-3.0-only

//! Page-level pointer handling.
//!
//! A pointer-up on an input or text area makes it the keyboard's target. A
//! pointer-up anywhere else, outside the keyboard widget, hides the keyboard.
//! Pointer-ups inside the widget are left alone so key presses do not steal
//! focus from the field being typed into.

use crate::dom::{Document, NodeId};
use crate::focus::FocusTracker;
use crate::store::StoreResult;

/// What a pointer-up did to the focus state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// The target field is now focused
    Focused(NodeId),
    /// Focus was cleared
    Cleared,
    /// Nothing changed
    Ignored,
}

/// Routes page pointer-ups to the focus tracker.
#[derive(Debug, Clone)]
pub struct PageListener {
    tracker: FocusTracker,
    keyboard_root_id: String,
}

impl PageListener {
    /// `keyboard_root_id` is the id of the element hosting the widget.
    pub fn new(tracker: FocusTracker, keyboard_root_id: impl Into<String>) -> Self {
        Self {
            tracker,
            keyboard_root_id: keyboard_root_id.into(),
        }
    }

    pub async fn on_pointer_up<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        target: NodeId,
    ) -> StoreResult<PointerOutcome> {
        if doc.is_editable(target) {
            return Ok(match self.tracker.focus_input(doc, target).await? {
                Some(_) => PointerOutcome::Focused(target),
                None => PointerOutcome::Ignored,
            });
        }

        let Some(root) = doc.get_element_by_id(&self.keyboard_root_id) else {
            tracing::debug!("Keyboard root '{}' not on page", self.keyboard_root_id);
            return Ok(PointerOutcome::Ignored);
        };

        if is_child_element(doc, target, root) {
            tracing::trace!("Pointer-up {} inside keyboard widget", target);
            return Ok(PointerOutcome::Ignored);
        }

        self.tracker.clear_focus().await?;
        Ok(PointerOutcome::Cleared)
    }
}

/// Whether `child` is `ancestor` or lies anywhere beneath it.
pub fn is_child_element<D: Document + ?Sized>(doc: &D, child: NodeId, ancestor: NodeId) -> bool {
    let mut current = Some(child);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        current = doc.parent_element(node);
    }
    false
}
