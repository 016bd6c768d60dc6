//! Session mode discriminants.
//!
//! A frame instance operates in exactly one mode, fixed at session start by
//! the first host-pushed snapshot. Unknown wire values map to
//! [`Mode::Unsupported`], an explicit terminal state: the session still
//! completes startup and serves the probe surface, but nothing renders.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Every mode a frame instance can be started in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mode {
    /// One-shot boot lifecycle hook; fires once, never re-invoked.
    OnBoot,
    /// Non-rendering initialization phase serving declarative hooks only.
    Init,
    /// Full-page canvas.
    RenderPage,
    /// Host-opened modal owned by this plugin.
    RenderModal,
    /// Browser pane for an external asset source.
    RenderAssetSource,
    /// Whole custom sidebar on the record editing form.
    RenderItemFormSidebar,
    /// Single panel inside the default record-form sidebar.
    RenderItemFormSidebarPanel,
    /// Outlet region on the record editing form.
    RenderItemFormOutlet,
    /// Outlet region on the record collection view.
    RenderItemCollectionOutlet,
    /// Custom editor replacing a field's default input.
    RenderFieldExtension,
    /// Configuration screen for a manually installed field extension.
    RenderFieldExtensionConfigScreen,
    /// Plugin-wide configuration screen.
    RenderConfigScreen,
    /// Inspector view for a single resource.
    RenderInspector,
    /// Single panel inside the inspector view.
    RenderInspectorPanel,
    /// Whole custom sidebar on the upload detail view.
    RenderUploadSidebar,
    /// Single panel inside the default upload sidebar.
    RenderUploadSidebarPanel,
    /// Terminal state for a wire value this SDK does not know.
    Unsupported(String),
}

impl Mode {
    /// Parse a wire discriminant. Never fails; unknown values become
    /// [`Mode::Unsupported`].
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "onBoot" => Self::OnBoot,
            "init" => Self::Init,
            "renderPage" => Self::RenderPage,
            "renderModal" => Self::RenderModal,
            "renderAssetSource" => Self::RenderAssetSource,
            "renderItemFormSidebar" => Self::RenderItemFormSidebar,
            "renderItemFormSidebarPanel" => Self::RenderItemFormSidebarPanel,
            "renderItemFormOutlet" => Self::RenderItemFormOutlet,
            "renderItemCollectionOutlet" => Self::RenderItemCollectionOutlet,
            "renderFieldExtension" => Self::RenderFieldExtension,
            "renderFieldExtensionConfigScreen" => Self::RenderFieldExtensionConfigScreen,
            "renderConfigScreen" => Self::RenderConfigScreen,
            "renderInspector" => Self::RenderInspector,
            "renderInspectorPanel" => Self::RenderInspectorPanel,
            "renderUploadSidebar" => Self::RenderUploadSidebar,
            "renderUploadSidebarPanel" => Self::RenderUploadSidebarPanel,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Wire discriminant for this mode.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::OnBoot => "onBoot",
            Self::Init => "init",
            Self::RenderPage => "renderPage",
            Self::RenderModal => "renderModal",
            Self::RenderAssetSource => "renderAssetSource",
            Self::RenderItemFormSidebar => "renderItemFormSidebar",
            Self::RenderItemFormSidebarPanel => "renderItemFormSidebarPanel",
            Self::RenderItemFormOutlet => "renderItemFormOutlet",
            Self::RenderItemCollectionOutlet => "renderItemCollectionOutlet",
            Self::RenderFieldExtension => "renderFieldExtension",
            Self::RenderFieldExtensionConfigScreen => "renderFieldExtensionConfigScreen",
            Self::RenderConfigScreen => "renderConfigScreen",
            Self::RenderInspector => "renderInspector",
            Self::RenderInspectorPanel => "renderInspectorPanel",
            Self::RenderUploadSidebar => "renderUploadSidebar",
            Self::RenderUploadSidebarPanel => "renderUploadSidebarPanel",
            Self::Unsupported(other) => other,
        }
    }

    /// Whether the mode's callback fires exactly once and ignores later
    /// change notifications.
    #[must_use]
    pub const fn is_one_shot(&self) -> bool {
        matches!(self, Self::OnBoot)
    }

    /// Whether the mode holds a resident render callback that re-runs on
    /// every change notification.
    #[must_use]
    pub const fn is_rendering(&self) -> bool {
        !matches!(self, Self::OnBoot | Self::Init | Self::Unsupported(_))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModeVisitor;

        impl Visitor<'_> for ModeVisitor {
            type Value = Mode;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a mode discriminant string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Mode, E> {
                Ok(Mode::from_wire(value))
            }
        }

        deserializer.deserialize_str(ModeVisitor)
    }
}
