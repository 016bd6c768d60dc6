//! Sill - frame-side SDK for sandboxed plugin frames
//!
//! This library lets untrusted, independently-authored plugin code running
//! inside a sandboxed frame cooperate with a host application across a
//! process/window boundary:
//! - A bidirectional call channel over newline-delimited JSON envelopes
//! - A per-session mode dispatcher invoking exactly one author callback
//! - Context composition merging host state, mode extras, and frame
//!   height controls
//! - A height side-channel keeping the host informed of rendered height
//! - Multi-field fan-out projecting per-field callbacks into id-indexed
//!   result maps
//!
//! A plugin registers hooks and hands the session a transport:
//!
//! ```no_run
//! use std::sync::Arc;
//! use sill::{ConnectOptions, FramePlatform, PluginHooks};
//!
//! # fn platform() -> FramePlatform { unimplemented!() }
//! # async fn demo() -> sill::Result<()> {
//! let hooks = PluginHooks::new().render_page(|ctx| async move {
//!     ctx.frame.start_auto_resizer();
//! });
//! sill::run_stdio(hooks, platform(), ConnectOptions::default()).await
//! # }
//! ```

#![forbid(unsafe_code)]
#![allow(
    clippy::must_use_candidate,
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

pub mod channel;
pub mod context;
pub mod error;
pub mod field_fanout;
pub mod height;
pub mod hooks;
pub mod host;
pub mod merged;
pub mod mode;
pub mod model;
pub mod protocol;
pub mod session;
pub mod settings;

pub use channel::{Channel, HostCaller};
pub use context::{
    AssetSourceExtras, BaseCtx, ConfigScreenExtras, FieldExtensionConfigExtras,
    FieldExtensionExtras, FrameControls, InspectorExtras, InspectorPanelExtras,
    ItemCollectionOutletExtras, ItemFormExtras, ItemFormOutletExtras, ItemFormSidebarExtras,
    ItemFormSidebarPanelExtras, ModalExtras, PageExtras, RenderCtx, UploadSidebarExtras,
    UploadSidebarPanelExtras,
};
pub use error::{Error, Result};
pub use field_fanout::{fan_out, FieldHookCtx};
pub use height::{HeightTracker, LayoutProbe, ObserverCallback, ObserverHandle, ObserverHost};
pub use hooks::PluginHooks;
pub use host::HostHandle;
pub use merged::MergedCtx;
pub use mode::Mode;
pub use model::{
    Field, HostState, ItemPickerOptions, ItemType, ModalOptions, Snapshot, Theme, Toast,
    UploadPickerOptions, User,
};
pub use protocol::Envelope;
pub use session::{run, run_stdio, ConnectOptions, FramePlatform, SDK_VERSION};
pub use settings::SettingsStore;
