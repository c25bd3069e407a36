// SPDX-License-Identifier: GPL-3.0-only

//! Centralized application settings and constants.

/// Storage key under which the focus state is persisted.
pub const FOCUS_STORAGE_KEY: &str = "virtual-keyboard-storage-key";

/// Element id of the injected keyboard root container.
pub const KEYBOARD_ROOT_ID: &str = "kiosk-keyboard-root";

/// Prefix for ids assigned to page fields that have none.
pub const GENERATED_ID_PREFIX: &str = "vk-input-";

/// Default tracing directive when no filter is configured.
pub const DEFAULT_LOG_DIRECTIVE: &str = "kiosk_keyboard=info";

/// Input types that allow selection APIs without coercion.
pub const SELECTION_INPUT_TYPES: [&str; 5] = ["text", "search", "url", "tel", "password"];
