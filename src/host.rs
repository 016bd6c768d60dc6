//! Typed wrappers for the host-exposed capability surface.
//!
//! Every composed context carries a [`HostHandle`]; author code calls these
//! methods instead of touching the wire. All of them ride
//! [`crate::channel::HostCaller`], so a stub caller is enough to test any
//! consumer.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::channel::HostCaller;
use crate::error::Result;
use crate::model::{
    Field, ItemPickerOptions, ItemType, ModalOptions, Snapshot, Toast, UploadPickerOptions, User,
};

/// Cloneable handle over the host capability methods.
#[derive(Clone)]
pub struct HostHandle {
    caller: Arc<dyn HostCaller>,
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHandle").finish_non_exhaustive()
    }
}

impl HostHandle {
    #[must_use]
    pub fn new(caller: Arc<dyn HostCaller>) -> Self {
        Self { caller }
    }

    /// Underlying caller, for consumers that need raw access.
    #[must_use]
    pub fn caller(&self) -> &Arc<dyn HostCaller> {
        &self.caller
    }

    /// Fetch the initial `{mode, ...properties}` snapshot. Issued exactly
    /// once per session, during the startup handshake.
    pub async fn get_settings(&self) -> Result<Snapshot> {
        let value = self.caller.call("getSettings", json!({})).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Show a success toast.
    pub async fn notice(&self, message: &str) -> Result<()> {
        self.caller
            .call("notice", json!({ "message": message }))
            .await?;
        Ok(())
    }

    /// Show an error toast.
    pub async fn alert(&self, message: &str) -> Result<()> {
        self.caller
            .call("alert", json!({ "message": message }))
            .await?;
        Ok(())
    }

    /// Show a toast with an optional call-to-action. Resolves `true` when
    /// the CTA was clicked.
    pub async fn custom_toast(&self, toast: &Toast) -> Result<bool> {
        let value = self
            .caller
            .call("customToast", serde_json::to_value(toast)?)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Open a host-rendered modal owned by this plugin. Resolves with the
    /// value the modal was closed with.
    pub async fn open_modal(&self, options: &ModalOptions) -> Result<Value> {
        self.caller
            .call("openModal", serde_json::to_value(options)?)
            .await
    }

    /// Open the host's record picker. Resolves with the selected records,
    /// `null` when dismissed.
    pub async fn select_item(&self, options: &ItemPickerOptions) -> Result<Value> {
        self.caller
            .call("selectItem", serde_json::to_value(options)?)
            .await
    }

    /// Open the host's asset picker. Resolves with the selected uploads,
    /// `null` when dismissed.
    pub async fn select_upload(&self, options: &UploadPickerOptions) -> Result<Value> {
        self.caller
            .call("selectUpload", serde_json::to_value(options)?)
            .await
    }

    /// Navigate the host application to `path`.
    pub async fn navigate_to(&self, path: &str) -> Result<()> {
        self.caller
            .call("navigateTo", json!({ "path": path }))
            .await?;
        Ok(())
    }

    /// Reload the item-type index from the host.
    pub async fn load_item_types(&self) -> Result<Vec<ItemType>> {
        let value = self.caller.call("loadItemTypes", json!({})).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Load the fields belonging to one item type.
    pub async fn load_fields(&self, item_type_id: &str) -> Result<Vec<Field>> {
        let value = self
            .caller
            .call("loadFields", json!({ "itemTypeId": item_type_id }))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Load the project's collaborators.
    pub async fn load_users(&self) -> Result<Vec<User>> {
        let value = self.caller.call("loadUsers", json!({})).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Persist new plugin-level parameters.
    pub async fn update_parameters(&self, parameters: Value) -> Result<()> {
        self.caller
            .call("updateParameters", json!({ "parameters": parameters }))
            .await?;
        Ok(())
    }

    /// Persist appearance changes for a manual field extension.
    pub async fn update_field_appearance(&self, field_id: &str, changes: Value) -> Result<()> {
        self.caller
            .call(
                "updateFieldAppearance",
                json!({ "fieldId": field_id, "changes": changes }),
            )
            .await?;
        Ok(())
    }

    /// Report the frame's rendered height. Fire-and-forget: layout churn
    /// must never block on the host.
    pub fn set_height(&self, height: u32) {
        self.caller.notify("setHeight", json!({ "height": height }));
    }

    /// Forward a member invocation the frame does not recognize back to the
    /// host's generic forwarder.
    pub async fn forward_call(&self, call_id: &str, member: &str, args: Vec<Value>) -> Result<Value> {
        self.caller
            .call(
                "forwardCall",
                json!({ "callId": call_id, "member": member, "args": args }),
            )
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingCaller;
    use super::*;

    #[tokio::test]
    async fn get_settings_parses_snapshot() {
        let caller = Arc::new(RecordingCaller::with_responses(vec![Ok(serde_json::json!({
            "mode": "renderPage",
            "pageId": "welcome",
        }))]));
        let host = HostHandle::new(caller.clone());

        let snapshot = host.get_settings().await.expect("snapshot");
        assert_eq!(snapshot.mode.as_str(), "renderPage");

        let calls = caller.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "getSettings");
    }

    #[tokio::test]
    async fn set_height_is_a_notification() {
        let caller = Arc::new(RecordingCaller::new());
        let host = HostHandle::new(caller.clone());

        host.set_height(480);

        assert!(caller.calls.lock().unwrap().is_empty());
        let notifications = caller.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].0, "setHeight");
        assert_eq!(notifications[0].1["height"], 480);
    }

    #[tokio::test]
    async fn forward_call_carries_correlation_and_member() {
        let caller = Arc::new(RecordingCaller::new());
        let host = HostHandle::new(caller.clone());

        host.forward_call("corr-1", "futureMethod", vec![serde_json::json!(1)])
            .await
            .expect("forward");

        let calls = caller.calls.lock().unwrap();
        assert_eq!(calls[0].0, "forwardCall");
        assert_eq!(calls[0].1["callId"], "corr-1");
        assert_eq!(calls[0].1["member"], "futureMethod");
        assert_eq!(calls[0].1["args"][0], 1);
    }
}
