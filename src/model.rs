//! Shared data types for the frame/host wire format.
//!
//! These types are the shared "wire format" used across the crate:
//! - The host pushes [`Snapshot`] values carrying the session mode and the
//!   full property bag.
//! - [`HostState`] is the typed view of the host-pushed base properties that
//!   every composed context embeds.
//! - Picker/modal/toast option types shape the payloads of host capability
//!   calls (see [`crate::host`]).
//!
//! Wire naming is camelCase; unknown properties are preserved in `extra`
//! bags so a newer host can round-trip data through an older SDK.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::mode::Mode;

// ============================================================================
// Snapshot
// ============================================================================

/// The latest host-pushed state: the session mode plus the flat property bag
/// the host serialized next to it.
///
/// Rebuilt wholesale on every change notification, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Mode discriminant, fixed for the life of the session.
    pub mode: Mode,

    /// Every other property the host pushed alongside the mode.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Snapshot {
    /// Build a snapshot from a mode and a property bag.
    #[must_use]
    pub fn new(mode: Mode, properties: Map<String, Value>) -> Self {
        Self { mode, properties }
    }

    /// Parse the typed base-state view out of the property bag.
    ///
    /// Missing groups collapse to their defaults; the host is allowed to
    /// push partial state.
    #[must_use]
    pub fn host_state(&self) -> HostState {
        serde_json::from_value(Value::Object(self.properties.clone())).unwrap_or_default()
    }
}

// ============================================================================
// Host base state
// ============================================================================

/// Typed view of the host-pushed base properties shared by every mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct HostState {
    /// Installation id of this plugin.
    pub plugin_id: Option<String>,

    /// Plugin-level configuration parameters.
    pub plugin_parameters: Value,

    /// The user the host is acting for, when known.
    pub current_user: Option<User>,

    /// Host UI theme colors.
    pub theme: Theme,

    /// Interface locale of the host UI.
    pub ui_locale: Option<String>,

    /// Live index of item types, keyed by id.
    pub item_types: HashMap<String, ItemType>,

    /// Live index of fields, keyed by id.
    pub fields: HashMap<String, Field>,

    /// Properties this SDK version does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A content model owning fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemType {
    pub id: String,
    pub name: String,
    pub api_key: Option<String>,
    pub singleton: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A field belonging to an item type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub label: String,
    pub api_key: Option<String>,
    pub field_type: String,
    /// Id of the owning item type, resolved against [`HostState::item_types`].
    pub item_type_id: String,
    pub localized: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The host-side user on whose behalf the frame operates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Host UI theme colors, passed through to author rendering code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
    pub semi_transparent_accent_color: Option<String>,
    pub light_color: Option<String>,
    pub dark_color: Option<String>,
}

// ============================================================================
// Capability call payloads
// ============================================================================

/// Options for opening a host-rendered modal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ModalOptions {
    /// Modal id the host resolves to a registered frame modal.
    pub id: String,
    pub title: Option<String>,
    /// One of the host's modal width presets, e.g. `"small"` or `"fullWidth"`.
    pub width: Option<String>,
    /// Parameters handed to the modal's own render context.
    pub parameters: Value,
}

/// Options for the host's record picker dialog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemPickerOptions {
    /// Restrict the picker to these item types; empty means any.
    pub item_type_ids: Vec<String>,
    pub multiple: bool,
}

/// Options for the host's asset picker dialog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadPickerOptions {
    pub multiple: bool,
}

/// A toast notification with an optional call-to-action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Toast {
    pub message: String,
    /// Label of the call-to-action button, when present.
    pub cta: Option<String>,
    pub dismiss_after_ms: Option<u64>,
}
