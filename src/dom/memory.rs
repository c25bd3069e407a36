// SPDX-License-Identifier: GPL-3.0-only

//! Arena-backed document used by tests and the scripted driver.
//!
//! Follows the browser rules the edit engine depends on: programmatic value
//! writes move the caret to the end, only some input types expose a
//! selection, removed subtrees are invisible to id lookup, and input events
//! bubble to every ancestor.

use super::{
    ControlKind, Document, DomError, InputEvent, NodeId, TextControl,
    input_type_supports_selection,
};

/// State of an `<input>` or `<textarea>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryControl {
    kind: ControlKind,
    value: String,
    selection: (usize, usize),
    control_type: String,
}

impl MemoryControl {
    fn new(kind: ControlKind, control_type: &str) -> Self {
        Self {
            kind,
            value: String::new(),
            selection: (0, 0),
            control_type: control_type.to_string(),
        }
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn supports_selection(&self) -> bool {
        match self.kind {
            ControlKind::TextArea => true,
            ControlKind::Input => input_type_supports_selection(&self.control_type),
        }
    }

    /// Selection as stored, regardless of whether the type exposes it.
    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }
}

impl TextControl for MemoryControl {
    fn kind(&self) -> ControlKind {
        self.kind
    }

    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        let end = self.len();
        self.selection = (end, end);
    }

    fn selection_start(&self) -> Option<usize> {
        self.supports_selection().then_some(self.selection.0)
    }

    fn selection_end(&self) -> Option<usize> {
        self.supports_selection().then_some(self.selection.1)
    }

    fn control_type(&self) -> String {
        match self.kind {
            ControlKind::TextArea => self.kind.tag_name().to_string(),
            ControlKind::Input => self.control_type.clone(),
        }
    }

    fn set_control_type(&mut self, control_type: &str) {
        if self.kind == ControlKind::Input {
            self.control_type = control_type.to_string();
        }
    }

    fn set_selection_range(&mut self, start: usize, end: usize) -> Result<(), DomError> {
        if !self.supports_selection() {
            return Err(DomError::InvalidState(format!(
                "input type '{}' does not support selection",
                self.control_type
            )));
        }
        let len = self.len();
        let end = end.min(len);
        let start = start.min(end);
        self.selection = (start, end);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct MemoryNode {
    tag: String,
    id: Option<String>,
    parent: Option<NodeId>,
    control: Option<MemoryControl>,
}

/// One delivery of an input event to a node on its propagation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEvent {
    /// Node the event was dispatched at
    pub target: NodeId,
    /// Node observing the event (the target or one of its ancestors)
    pub current_target: NodeId,
    /// DOM event name
    pub event_type: &'static str,
    pub event: InputEvent,
    /// Target value when the event was delivered
    pub value: String,
    /// Target selection when the event was delivered
    pub selection: (usize, usize),
}

/// In-memory page document rooted at a `<body>` node.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<MemoryNode>,
    body: NodeId,
    focused: Option<NodeId>,
    dispatched: Vec<DispatchedEvent>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates a document holding only `<body>`.
    pub fn new() -> Self {
        let body = MemoryNode {
            tag: "BODY".to_string(),
            id: None,
            parent: None,
            control: None,
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            focused: None,
            dispatched: Vec::new(),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Creates a detached element. `<input>` elements default to type `text`.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let control = ControlKind::from_tag_name(tag).map(|kind| match kind {
            ControlKind::Input => MemoryControl::new(kind, "text"),
            ControlKind::TextArea => MemoryControl::new(kind, kind.tag_name()),
        });
        self.nodes.push(MemoryNode {
            tag: tag.to_ascii_uppercase(),
            id: None,
            parent: None,
            control,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Moves `child` under `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(DomError::InvalidState(format!(
                "cannot append {} inside itself",
                child
            )));
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Creates an element and appends it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let node = self.create_element(tag);
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Appends an `<input>` of the given type to `parent`.
    pub fn append_input(&mut self, parent: NodeId, input_type: &str) -> Result<NodeId, DomError> {
        let node = self.append_element(parent, "input")?;
        if let Some(control) = self.control_mut(node) {
            control.set_control_type(input_type);
        }
        Ok(node)
    }

    /// Detaches `node` and its subtree from the document.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node_mut(node)?.parent = None;
        if self.focused.is_some_and(|f| !self.is_connected(f)) {
            self.focused = None;
        }
        Ok(())
    }

    /// Whether `node` is attached under `<body>`.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.body || self.is_ancestor(self.body, node)
    }

    pub fn control(&self, node: NodeId) -> Option<&MemoryControl> {
        self.nodes.get(node.0)?.control.as_ref()
    }

    pub fn control_mut(&mut self, node: NodeId) -> Option<&mut MemoryControl> {
        self.nodes.get_mut(node.0)?.control.as_mut()
    }

    /// Sets a control's value and selection as if the user had typed it.
    pub fn set_field(
        &mut self,
        node: NodeId,
        value: &str,
        selection: (usize, usize),
    ) -> Result<(), DomError> {
        let control = self
            .nodes
            .get_mut(node.0)
            .and_then(|n| n.control.as_mut())
            .ok_or(DomError::UnknownNode(node))?;
        control.set_value(value);
        let len = control.len();
        let end = selection.1.min(len);
        control.selection = (selection.0.min(end), end);
        Ok(())
    }

    /// Current value of a control.
    pub fn value(&self, node: NodeId) -> Option<String> {
        self.control(node).map(|c| c.value.clone())
    }

    /// Every event delivery so far, in order.
    pub fn dispatched(&self) -> &[DispatchedEvent] {
        &self.dispatched
    }

    /// Drains the recorded event deliveries.
    pub fn take_dispatched(&mut self) -> Vec<DispatchedEvent> {
        std::mem::take(&mut self.dispatched)
    }

    fn node(&self, node: NodeId) -> Result<&MemoryNode, DomError> {
        self.nodes.get(node.0).ok_or(DomError::UnknownNode(node))
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut MemoryNode, DomError> {
        self.nodes.get_mut(node.0).ok_or(DomError::UnknownNode(node))
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent_element(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent_element(parent);
        }
        false
    }
}

impl Document for MemoryDocument {
    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        (0..self.nodes.len())
            .map(NodeId)
            .find(|&n| self.nodes[n.0].id.as_deref() == Some(id) && self.is_connected(n))
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(node.0).map(|n| n.tag.clone())
    }

    fn element_id(&self, node: NodeId) -> Option<String> {
        self.nodes
            .get(node.0)?
            .id
            .clone()
            .filter(|id| !id.is_empty())
    }

    fn set_element_id(&mut self, node: NodeId, id: &str) -> Result<(), DomError> {
        self.node_mut(node)?.id = Some(id.to_string());
        Ok(())
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn text_control(&mut self, node: NodeId) -> Option<&mut dyn TextControl> {
        self.nodes
            .get_mut(node.0)?
            .control
            .as_mut()
            .map(|c| c as &mut dyn TextControl)
    }

    fn focus(&mut self, node: NodeId) {
        if self.is_connected(node) {
            self.focused = Some(node);
        }
    }

    fn active_element(&self) -> Option<NodeId> {
        self.focused
    }

    fn dispatch_input_event(&mut self, target: NodeId, event: &InputEvent) {
        let Some(control) = self.control(target) else {
            return;
        };
        let value = control.value.clone();
        let selection = control.selection;

        let mut path = vec![target];
        if event.bubbles {
            let mut current = self.parent_element(target);
            while let Some(parent) = current {
                path.push(parent);
                current = self.parent_element(parent);
            }
        }

        for current_target in path {
            self.dispatched.push(DispatchedEvent {
                target,
                current_target,
                event_type: InputEvent::EVENT_TYPE,
                event: event.clone(),
                value: value.clone(),
                selection,
            });
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
