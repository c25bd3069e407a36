// SPDX-License-Identifier: GPL-3.0-only

//! Caret-aware text mutations.
//!
//! These functions compute the value and caret a field should have after a
//! key press. They do not touch the page; [`super::EditEngine`] applies the
//! result. All offsets count Unicode scalar values.

/// Resulting value and collapsed caret position of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub value: String,
    pub caret: usize,
}

/// Normalizes raw selection bounds against `value`.
///
/// A missing bound means "at the end". Bounds are clamped to the value length
/// and returned in ascending order.
pub fn resolve_selection(value: &str, start: Option<usize>, end: Option<usize>) -> (usize, usize) {
    let len = value.chars().count();
    let start = start.unwrap_or(len).min(len);
    let end = end.unwrap_or(len).min(len);
    (start.min(end), start.max(end))
}

/// Inserts `text` at the selection, replacing whatever it covers.
pub fn insert_text(value: &str, start: usize, end: usize, text: &str) -> TextEdit {
    let (head, tail) = split_around(value, start, end);
    let mut new_value = String::with_capacity(head.len() + text.len() + tail.len());
    new_value.push_str(head);
    new_value.push_str(text);
    new_value.push_str(tail);

    TextEdit {
        value: new_value,
        caret: start + text.chars().count(),
    }
}

/// Deletes the selection, or the character before a collapsed caret.
///
/// A collapsed caret at offset 0 leaves the value unchanged.
pub fn delete_backward(value: &str, start: usize, end: usize) -> TextEdit {
    if start != end {
        let (head, tail) = split_around(value, start, end);
        return TextEdit {
            value: [head, tail].concat(),
            caret: start,
        };
    }

    if start == 0 {
        return TextEdit {
            value: value.to_string(),
            caret: 0,
        };
    }

    let (head, tail) = split_around(value, start - 1, start);
    TextEdit {
        value: [head, tail].concat(),
        caret: start - 1,
    }
}

/// Splits `value` into the text before `start` and after `end`.
fn split_around(value: &str, start: usize, end: usize) -> (&str, &str) {
    let head = &value[..byte_offset(value, start)];
    let tail = &value[byte_offset(value, end)..];
    (head, tail)
}

/// Byte index of the `chars`-th scalar value, or the length past the end.
fn byte_offset(value: &str, chars: usize) -> usize {
    value
        .char_indices()
        .nth(chars)
        .map_or(value.len(), |(index, _)| index)
}
