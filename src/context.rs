//! Context composition.
//!
//! A context is the capability-and-data object handed to an author
//! callback: host base state, mode-specific extras, and (for rendering
//! modes) frame height controls. Contexts are rebuilt from the latest
//! snapshot on every invocation, never mutated in place.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::height::HeightTracker;
use crate::host::HostHandle;
use crate::model::{HostState, Snapshot};

/// Capability and data groups shared by every mode.
#[derive(Debug, Clone)]
pub struct BaseCtx {
    /// Host capability methods.
    pub host: HostHandle,
    /// Typed view of the host-pushed base properties.
    pub state: HostState,
}

impl BaseCtx {
    #[must_use]
    pub fn from_snapshot(host: HostHandle, snapshot: &Snapshot) -> Self {
        Self {
            host,
            state: snapshot.host_state(),
        }
    }
}

/// Height controls attached to every rendering mode's context.
#[derive(Clone)]
pub struct FrameControls {
    tracker: Arc<HeightTracker>,
}

impl FrameControls {
    #[must_use]
    pub fn new(tracker: Arc<HeightTracker>) -> Self {
        Self { tracker }
    }

    /// Report an explicit height to the host.
    pub fn set_height(&self, height: u32) {
        self.tracker.force_update(Some(height));
    }

    /// Recompute the rendered height and report it if changed.
    pub fn update_height(&self) {
        self.tracker.force_update(None);
    }

    /// Start observing layout and content changes.
    pub fn start_auto_resizer(&self) {
        self.tracker.start();
    }

    /// Stop observing layout and content changes.
    pub fn stop_auto_resizer(&self) {
        self.tracker.stop();
    }

    /// Whether the auto-resizer is currently observing.
    #[must_use]
    pub fn is_auto_resizing(&self) -> bool {
        self.tracker.is_active()
    }
}

impl std::fmt::Debug for FrameControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameControls")
            .field("active", &self.tracker.is_active())
            .finish()
    }
}

/// Context for a persistent render mode: base groups, the mode's extras,
/// and the frame height controls.
#[derive(Debug, Clone)]
pub struct RenderCtx<E> {
    pub base: BaseCtx,
    pub extras: E,
    pub frame: FrameControls,
}

/// Parse a mode's extras out of the snapshot's property bag.
///
/// Hosts may push partial state; anything missing collapses to the extras'
/// defaults rather than failing the render.
pub(crate) fn parse_extras<E: DeserializeOwned + Default>(snapshot: &Snapshot) -> E {
    match serde_json::from_value(Value::Object(snapshot.properties.clone())) {
        Ok(extras) => extras,
        Err(err) => {
            tracing::warn!(mode = %snapshot.mode, error = %err, "malformed mode extras");
            E::default()
        }
    }
}

/// Build a full render context from the latest snapshot.
pub(crate) fn compose<E: DeserializeOwned + Default>(
    host: HostHandle,
    snapshot: &Snapshot,
    frame: FrameControls,
) -> RenderCtx<E> {
    RenderCtx {
        base: BaseCtx::from_snapshot(host, snapshot),
        extras: parse_extras(snapshot),
        frame,
    }
}

// ============================================================================
// Per-mode extras
// ============================================================================

/// Extras for `renderPage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PageExtras {
    pub page_id: String,
}

/// Extras for `renderModal`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ModalExtras {
    pub modal_id: String,
    pub parameters: Value,
}

/// Extras for `renderAssetSource`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetSourceExtras {
    pub asset_source_id: String,
}

/// State shared by every record-form placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemFormExtras {
    /// The record being edited, as the host last serialized it.
    pub item: Value,
    pub item_type_id: String,
    pub locale: Option<String>,
}

/// Extras for `renderItemFormSidebar`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemFormSidebarExtras {
    #[serde(flatten)]
    pub item_form: ItemFormExtras,
    pub sidebar_id: String,
    pub parameters: Value,
}

/// Extras for `renderItemFormSidebarPanel`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemFormSidebarPanelExtras {
    #[serde(flatten)]
    pub item_form: ItemFormExtras,
    pub sidebar_pane_id: String,
    pub parameters: Value,
}

/// Extras for `renderItemFormOutlet`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemFormOutletExtras {
    #[serde(flatten)]
    pub item_form: ItemFormExtras,
    pub outlet_id: String,
}

/// Extras for `renderItemCollectionOutlet`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemCollectionOutletExtras {
    pub outlet_id: String,
    pub item_type_id: Option<String>,
}

/// Extras for `renderFieldExtension`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldExtensionExtras {
    #[serde(flatten)]
    pub item_form: ItemFormExtras,
    pub field_id: String,
    /// Path of the edited value inside the record payload.
    pub field_path: String,
    pub parameters: Value,
}

/// Extras for `renderFieldExtensionConfigScreen`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldExtensionConfigExtras {
    pub field_extension_id: String,
    pub parameters: Value,
}

/// Extras for `renderInspector`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct InspectorExtras {
    pub item_id: String,
    pub item_type_id: Option<String>,
}

/// Extras for `renderInspectorPanel`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct InspectorPanelExtras {
    #[serde(flatten)]
    pub inspector: InspectorExtras,
    pub panel_id: String,
    pub parameters: Value,
}

/// Extras for `renderUploadSidebar`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadSidebarExtras {
    pub upload_id: String,
}

/// Extras for `renderUploadSidebarPanel`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadSidebarPanelExtras {
    pub upload_id: String,
    pub sidebar_pane_id: String,
    pub parameters: Value,
}

/// `renderConfigScreen` carries no extras beyond the base groups.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigScreenExtras {}
