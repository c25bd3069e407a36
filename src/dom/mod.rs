// SPDX-License-Identifier: GPL-3.0-only

//! Page document boundary.
//!
//! The keyboard never holds on to live page nodes. It stores an element id
//! and resolves it through [`Document::get_element_by_id`] every time it
//! edits, so a page that replaces its own fields between two key presses
//! cannot leave the keyboard writing into a dangling node.
//!
//! Only `<input>` and `<textarea>` are editable; [`Document::text_control`]
//! returns `None` for everything else.

pub mod memory;
#[cfg(test)]
pub(crate) mod stub;

pub use memory::{DispatchedEvent, MemoryDocument};

use crate::app_settings::SELECTION_INPUT_TYPES;
use std::fmt;
use thiserror::Error;

/// Arena handle for a node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised by document operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The operation is not allowed in the element's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The node handle does not belong to the document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}

/// Kinds of editable form controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// `<input>`
    Input,
    /// `<textarea>`
    TextArea,
}

impl ControlKind {
    /// Maps a tag name (any case) to a control kind.
    pub fn from_tag_name(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("input") {
            Some(ControlKind::Input)
        } else if tag.eq_ignore_ascii_case("textarea") {
            Some(ControlKind::TextArea)
        } else {
            None
        }
    }

    /// Lowercase tag name.
    pub fn tag_name(self) -> &'static str {
        match self {
            ControlKind::Input => "input",
            ControlKind::TextArea => "textarea",
        }
    }
}

/// Whether an `<input>` of the given `type` supports selection ranges.
///
/// Unknown and empty types behave as `text`.
pub fn input_type_supports_selection(input_type: &str) -> bool {
    let input_type = input_type.trim();
    input_type.is_empty()
        || SELECTION_INPUT_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(input_type))
        || !is_known_input_type(input_type)
}

fn is_known_input_type(input_type: &str) -> bool {
    const KNOWN: [&str; 22] = [
        "button", "checkbox", "color", "date", "datetime-local", "email", "file", "hidden",
        "image", "month", "number", "password", "radio", "range", "reset", "search", "submit",
        "tel", "text", "time", "url", "week",
    ];
    KNOWN.iter().any(|t| t.eq_ignore_ascii_case(input_type))
}

/// The `inputType` carried by a synthetic input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    /// Text typed at the caret, replacing any selection
    InsertText,
    /// Backward deletion of a character or of the selection
    DeleteContentBackward,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::InsertText => "insertText",
            InputType::DeleteContentBackward => "deleteContentBackward",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A synthetic `input` event, shaped like the one native typing produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub input_type: InputType,
    pub data: Option<String>,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl InputEvent {
    /// DOM event name.
    pub const EVENT_TYPE: &'static str = "input";

    /// An `insertText` event carrying the inserted text.
    pub fn insert_text(data: impl Into<String>) -> Self {
        Self {
            input_type: InputType::InsertText,
            data: Some(data.into()),
            bubbles: true,
            cancelable: true,
        }
    }

    /// A `deleteContentBackward` event with null data.
    pub fn delete_content_backward() -> Self {
        Self {
            input_type: InputType::DeleteContentBackward,
            data: None,
            bubbles: true,
            cancelable: true,
        }
    }
}

/// An editable `<input>` or `<textarea>` element.
///
/// Offsets are counted in Unicode scalar values.
pub trait TextControl {
    fn kind(&self) -> ControlKind;

    fn value(&self) -> String;

    /// Replaces the value. Implementations place the caret at the end, as
    /// browsers do for programmatic writes.
    fn set_value(&mut self, value: &str);

    /// `None` when the control does not expose a selection.
    fn selection_start(&self) -> Option<usize>;

    /// `None` when the control does not expose a selection.
    fn selection_end(&self) -> Option<usize>;

    /// The `type` attribute. Text areas report `"textarea"`.
    fn control_type(&self) -> String;

    fn set_control_type(&mut self, control_type: &str);

    fn set_selection_range(&mut self, start: usize, end: usize) -> Result<(), DomError>;
}

/// The page document as seen by the keyboard.
pub trait Document {
    /// Finds a connected element by id.
    fn get_element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Tag name as the page reports it (usually upper case).
    fn tag_name(&self, node: NodeId) -> Option<String>;

    /// The element's id attribute, `None` when absent or empty.
    fn element_id(&self, node: NodeId) -> Option<String>;

    fn set_element_id(&mut self, node: NodeId, id: &str) -> Result<(), DomError>;

    fn parent_element(&self, node: NodeId) -> Option<NodeId>;

    /// Editable view of `node`, `None` unless it is an input or text area.
    fn text_control(&mut self, node: NodeId) -> Option<&mut dyn TextControl>;

    fn focus(&mut self, node: NodeId);

    fn active_element(&self) -> Option<NodeId>;

    /// Dispatches `event` at `target`, bubbling when the event asks for it.
    fn dispatch_input_event(&mut self, target: NodeId, event: &InputEvent);

    /// Whether `node` is an input or text area.
    fn is_editable(&self, node: NodeId) -> bool {
        self.tag_name(node)
            .and_then(|tag| ControlKind::from_tag_name(&tag))
            .is_some()
    }
}
