//! Author-supplied hook registry.
//!
//! A plugin registers only the hooks it implements; everything else is a
//! silent no-op. The registry also answers the host's capability probe with
//! a name→implemented map.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::context::{
    AssetSourceExtras, BaseCtx, ConfigScreenExtras, FieldExtensionConfigExtras,
    FieldExtensionExtras, InspectorExtras, InspectorPanelExtras, ItemCollectionOutletExtras,
    ItemFormOutletExtras, ItemFormSidebarExtras, ItemFormSidebarPanelExtras, ModalExtras,
    PageExtras, RenderCtx, UploadSidebarExtras, UploadSidebarPanelExtras,
};
use crate::error::Result;
use crate::field_fanout::FieldHookCtx;
use crate::merged::MergedCtx;
use crate::model::Field;

/// One-shot boot callback.
pub type BootHook = Box<dyn Fn(BaseCtx) -> BoxFuture<'static, ()> + Send + Sync>;

/// Resident render callback for one mode; re-invoked per snapshot.
pub type RenderHook<E> = Box<dyn Fn(RenderCtx<E>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Merged-execution handler invoked by the host per action.
pub type MergedHook =
    Box<dyn Fn(Value, MergedCtx) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Declarative hook returning data without activating the dispatcher.
pub type DeclarativeHook = Box<dyn Fn(&Value, &BaseCtx) -> Result<Value> + Send + Sync>;

/// Per-field callback projected by the fan-out.
pub type FieldHook = Box<dyn Fn(&Field, &FieldHookCtx<'_>) -> Value + Send + Sync>;

/// Everything the plugin author registered.
#[derive(Default)]
pub struct PluginHooks {
    pub(crate) on_boot: Option<BootHook>,
    pub(crate) render_page: Option<RenderHook<PageExtras>>,
    pub(crate) render_modal: Option<RenderHook<ModalExtras>>,
    pub(crate) render_asset_source: Option<RenderHook<AssetSourceExtras>>,
    pub(crate) render_item_form_sidebar: Option<RenderHook<ItemFormSidebarExtras>>,
    pub(crate) render_item_form_sidebar_panel: Option<RenderHook<ItemFormSidebarPanelExtras>>,
    pub(crate) render_item_form_outlet: Option<RenderHook<ItemFormOutletExtras>>,
    pub(crate) render_item_collection_outlet: Option<RenderHook<ItemCollectionOutletExtras>>,
    pub(crate) render_field_extension: Option<RenderHook<FieldExtensionExtras>>,
    pub(crate) render_field_extension_config_screen:
        Option<RenderHook<FieldExtensionConfigExtras>>,
    pub(crate) render_config_screen: Option<RenderHook<ConfigScreenExtras>>,
    pub(crate) render_inspector: Option<RenderHook<InspectorExtras>>,
    pub(crate) render_inspector_panel: Option<RenderHook<InspectorPanelExtras>>,
    pub(crate) render_upload_sidebar: Option<RenderHook<UploadSidebarExtras>>,
    pub(crate) render_upload_sidebar_panel: Option<RenderHook<UploadSidebarPanelExtras>>,
    pub(crate) merged: HashMap<String, MergedHook>,
    pub(crate) declarative: HashMap<String, DeclarativeHook>,
    pub(crate) field_extension_overrides: Option<FieldHook>,
    pub(crate) field_decorators: Option<FieldHook>,
    pub(crate) field_block_styles: Option<FieldHook>,
}

macro_rules! render_hook_builder {
    ($(#[$doc:meta])* $name:ident, $field:ident, $extras:ty) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name<F, Fut>(mut self, hook: F) -> Self
        where
            F: Fn(RenderCtx<$extras>) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = ()> + Send + 'static,
        {
            self.$field = Some(Box::new(move |ctx| -> BoxFuture<'static, ()> {
                Box::pin(hook(ctx))
            }));
            self
        }
    };
}

impl PluginHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the one-shot boot callback.
    #[must_use]
    pub fn on_boot<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(BaseCtx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_boot = Some(Box::new(move |ctx| -> BoxFuture<'static, ()> {
            Box::pin(hook(ctx))
        }));
        self
    }

    render_hook_builder!(
        /// Register the `renderPage` callback.
        render_page, render_page, PageExtras
    );
    render_hook_builder!(
        /// Register the `renderModal` callback.
        render_modal, render_modal, ModalExtras
    );
    render_hook_builder!(
        /// Register the `renderAssetSource` callback.
        render_asset_source, render_asset_source, AssetSourceExtras
    );
    render_hook_builder!(
        /// Register the `renderItemFormSidebar` callback.
        render_item_form_sidebar, render_item_form_sidebar, ItemFormSidebarExtras
    );
    render_hook_builder!(
        /// Register the `renderItemFormSidebarPanel` callback.
        render_item_form_sidebar_panel, render_item_form_sidebar_panel, ItemFormSidebarPanelExtras
    );
    render_hook_builder!(
        /// Register the `renderItemFormOutlet` callback.
        render_item_form_outlet, render_item_form_outlet, ItemFormOutletExtras
    );
    render_hook_builder!(
        /// Register the `renderItemCollectionOutlet` callback.
        render_item_collection_outlet, render_item_collection_outlet, ItemCollectionOutletExtras
    );
    render_hook_builder!(
        /// Register the `renderFieldExtension` callback.
        render_field_extension, render_field_extension, FieldExtensionExtras
    );
    render_hook_builder!(
        /// Register the `renderFieldExtensionConfigScreen` callback.
        render_field_extension_config_screen,
        render_field_extension_config_screen,
        FieldExtensionConfigExtras
    );
    render_hook_builder!(
        /// Register the `renderConfigScreen` callback.
        render_config_screen, render_config_screen, ConfigScreenExtras
    );
    render_hook_builder!(
        /// Register the `renderInspector` callback.
        render_inspector, render_inspector, InspectorExtras
    );
    render_hook_builder!(
        /// Register the `renderInspectorPanel` callback.
        render_inspector_panel, render_inspector_panel, InspectorPanelExtras
    );
    render_hook_builder!(
        /// Register the `renderUploadSidebar` callback.
        render_upload_sidebar, render_upload_sidebar, UploadSidebarExtras
    );
    render_hook_builder!(
        /// Register the `renderUploadSidebarPanel` callback.
        render_upload_sidebar_panel, render_upload_sidebar_panel, UploadSidebarPanelExtras
    );

    /// Register a merged-execution handler, e.g. `onBeforeItemUpsert`.
    #[must_use]
    pub fn merged_hook<F, Fut>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(Value, MergedCtx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.merged.insert(
            name.into(),
            Box::new(move |args, ctx| -> BoxFuture<'static, Result<Value>> {
                Box::pin(hook(args, ctx))
            }),
        );
        self
    }

    /// Register a no-render declarative hook, e.g. `mainNavigationTabs`.
    #[must_use]
    pub fn declarative_hook<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Value, &BaseCtx) -> Result<Value> + Send + Sync + 'static,
    {
        self.declarative.insert(name.into(), Box::new(hook));
        self
    }

    /// Register the per-field extension-override callback.
    #[must_use]
    pub fn field_extension_overrides<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Field, &FieldHookCtx<'_>) -> Value + Send + Sync + 'static,
    {
        self.field_extension_overrides = Some(Box::new(hook));
        self
    }

    /// Register the per-field decorator callback.
    #[must_use]
    pub fn field_decorators<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Field, &FieldHookCtx<'_>) -> Value + Send + Sync + 'static,
    {
        self.field_decorators = Some(Box::new(hook));
        self
    }

    /// Register the per-field block-style callback.
    #[must_use]
    pub fn field_block_styles<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Field, &FieldHookCtx<'_>) -> Value + Send + Sync + 'static,
    {
        self.field_block_styles = Some(Box::new(hook));
        self
    }

    /// Name→implemented map served by the capability probe.
    #[must_use]
    pub fn implemented(&self) -> BTreeMap<String, bool> {
        let mut map = BTreeMap::new();
        let mut flag = |name: &str, present: bool| {
            if present {
                map.insert(name.to_string(), true);
            }
        };

        flag("onBoot", self.on_boot.is_some());
        flag("renderPage", self.render_page.is_some());
        flag("renderModal", self.render_modal.is_some());
        flag("renderAssetSource", self.render_asset_source.is_some());
        flag(
            "renderItemFormSidebar",
            self.render_item_form_sidebar.is_some(),
        );
        flag(
            "renderItemFormSidebarPanel",
            self.render_item_form_sidebar_panel.is_some(),
        );
        flag(
            "renderItemFormOutlet",
            self.render_item_form_outlet.is_some(),
        );
        flag(
            "renderItemCollectionOutlet",
            self.render_item_collection_outlet.is_some(),
        );
        flag(
            "renderFieldExtension",
            self.render_field_extension.is_some(),
        );
        flag(
            "renderFieldExtensionConfigScreen",
            self.render_field_extension_config_screen.is_some(),
        );
        flag("renderConfigScreen", self.render_config_screen.is_some());
        flag("renderInspector", self.render_inspector.is_some());
        flag(
            "renderInspectorPanel",
            self.render_inspector_panel.is_some(),
        );
        flag("renderUploadSidebar", self.render_upload_sidebar.is_some());
        flag(
            "renderUploadSidebarPanel",
            self.render_upload_sidebar_panel.is_some(),
        );
        flag(
            "fieldExtensionOverrides",
            self.field_extension_overrides.is_some(),
        );
        flag("fieldDecorators", self.field_decorators.is_some());
        flag("fieldBlockStyles", self.field_block_styles.is_some());

        for name in self.merged.keys() {
            map.insert(name.clone(), true);
        }
        for name in self.declarative.keys() {
            map.insert(name.clone(), true);
        }

        map
    }
}

impl std::fmt::Debug for PluginHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHooks")
            .field("implemented", &self.implemented())
            .finish_non_exhaustive()
    }
}
