// SPDX-License-Identifier: GPL-3.0-only

//! Single-field document whose platform calls can be made to fail.

use super::{ControlKind, Document, DomError, InputEvent, NodeId, TextControl};

/// Node of the only field.
pub const FIELD: NodeId = NodeId(1);

/// A text input that reports a caret but refuses to move it.
#[derive(Debug, Default)]
pub struct StubControl {
    pub value: String,
    pub caret_moves: usize,
}

impl TextControl for StubControl {
    fn kind(&self) -> ControlKind {
        ControlKind::Input
    }

    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    fn selection_start(&self) -> Option<usize> {
        Some(self.value.chars().count())
    }

    fn selection_end(&self) -> Option<usize> {
        Some(self.value.chars().count())
    }

    fn control_type(&self) -> String {
        "text".to_string()
    }

    fn set_control_type(&mut self, _control_type: &str) {}

    fn set_selection_range(&mut self, _start: usize, _end: usize) -> Result<(), DomError> {
        self.caret_moves += 1;
        Err(DomError::InvalidState("selection is locked".to_string()))
    }
}

/// Document holding one `<input>` whose id, once set, never changes.
#[derive(Debug, Default)]
pub struct StubDocument {
    pub id: Option<String>,
    pub control: StubControl,
    pub focused: Option<NodeId>,
    pub dispatched: Vec<InputEvent>,
}

impl StubDocument {
    /// A field already carrying `id`.
    pub fn with_id(id: &str, value: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            control: StubControl {
                value: value.to_string(),
                caret_moves: 0,
            },
            ..Self::default()
        }
    }
}

impl Document for StubDocument {
    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        (self.id.as_deref() == Some(id)).then_some(FIELD)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        (node == FIELD).then(|| "INPUT".to_string())
    }

    fn element_id(&self, node: NodeId) -> Option<String> {
        self.id.clone().filter(|_| node == FIELD)
    }

    fn set_element_id(&mut self, node: NodeId, _id: &str) -> Result<(), DomError> {
        Err(DomError::InvalidState(format!("{} does not accept an id", node)))
    }

    fn parent_element(&self, _node: NodeId) -> Option<NodeId> {
        None
    }

    fn text_control(&mut self, node: NodeId) -> Option<&mut dyn TextControl> {
        (node == FIELD).then_some(&mut self.control as &mut dyn TextControl)
    }

    fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    fn active_element(&self) -> Option<NodeId> {
        self.focused
    }

    fn dispatch_input_event(&mut self, _target: NodeId, event: &InputEvent) {
        self.dispatched.push(event.clone());
    }
}
