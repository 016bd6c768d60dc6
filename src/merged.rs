//! Merged boot-time execution contexts.
//!
//! Certain lifecycle hooks are not served by a resident render callback;
//! the host calls back into the frame per action, supplying fresh extra
//! state and a correlation id. The context built here merges the current
//! snapshot with the per-call extra state and exposes one uniform
//! invocation surface: members with a local binding run locally, every
//! other member resolves to a forwarding call against the host. Member
//! access never dead-ends.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::host::HostHandle;
use crate::model::HostState;

/// Member names served locally by [`MergedCtx::invoke`].
const LOCAL_MEMBERS: &[&str] = &[
    "notice",
    "alert",
    "customToast",
    "openModal",
    "selectItem",
    "selectUpload",
    "navigateTo",
    "loadItemTypes",
    "loadFields",
    "loadUsers",
    "updateParameters",
    "updateFieldAppearance",
];

/// Context handed to merged-execution hooks.
#[derive(Debug, Clone)]
pub struct MergedCtx {
    host: HostHandle,
    call_id: String,
    properties: Map<String, Value>,
}

impl MergedCtx {
    /// Merge the session's current properties with the per-call extra
    /// state. Shallow merge; extra state overrides on key collision.
    #[must_use]
    pub fn new(
        host: HostHandle,
        call_id: impl Into<String>,
        session_properties: Map<String, Value>,
        extra_state: Map<String, Value>,
    ) -> Self {
        let mut properties = session_properties;
        for (key, value) in extra_state {
            properties.insert(key, value);
        }
        Self {
            host,
            call_id: call_id.into(),
            properties,
        }
    }

    /// Correlation id of the invocation that produced this context.
    #[must_use]
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Host capability methods.
    #[must_use]
    pub fn host(&self) -> &HostHandle {
        &self.host
    }

    /// Read a data member from the merged property bag.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// The full merged property bag.
    #[must_use]
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Typed view over the merged properties.
    #[must_use]
    pub fn state(&self) -> HostState {
        serde_json::from_value(Value::Object(self.properties.clone())).unwrap_or_default()
    }

    /// Whether `member` is served by a local binding rather than the
    /// forwarder.
    #[must_use]
    pub fn is_local(member: &str) -> bool {
        LOCAL_MEMBERS.contains(&member)
    }

    /// Invoke a member through the capability table.
    ///
    /// Known members dispatch to their local host-capability binding;
    /// unknown members issue exactly one forwarding call carrying
    /// `(call_id, member, args)` and resolve to the host's response. Call
    /// sites cannot tell which branch served them.
    pub async fn invoke(&self, member: &str, args: Vec<Value>) -> Result<Value> {
        match member {
            "notice" => {
                self.host.notice(&string_arg(member, &args, 0)?).await?;
                Ok(Value::Null)
            }
            "alert" => {
                self.host.alert(&string_arg(member, &args, 0)?).await?;
                Ok(Value::Null)
            }
            "customToast" => {
                let toast = typed_arg(member, &args, 0)?;
                Ok(Value::Bool(self.host.custom_toast(&toast).await?))
            }
            "openModal" => {
                let options = typed_arg(member, &args, 0)?;
                self.host.open_modal(&options).await
            }
            "selectItem" => {
                let options = typed_arg(member, &args, 0)?;
                self.host.select_item(&options).await
            }
            "selectUpload" => {
                let options = typed_arg(member, &args, 0)?;
                self.host.select_upload(&options).await
            }
            "navigateTo" => {
                self.host
                    .navigate_to(&string_arg(member, &args, 0)?)
                    .await?;
                Ok(Value::Null)
            }
            "loadItemTypes" => {
                let item_types = self.host.load_item_types().await?;
                Ok(serde_json::to_value(item_types)?)
            }
            "loadFields" => {
                let fields = self
                    .host
                    .load_fields(&string_arg(member, &args, 0)?)
                    .await?;
                Ok(serde_json::to_value(fields)?)
            }
            "loadUsers" => {
                let users = self.host.load_users().await?;
                Ok(serde_json::to_value(users)?)
            }
            "updateParameters" => {
                let parameters = args.first().cloned().unwrap_or(Value::Null);
                self.host.update_parameters(parameters).await?;
                Ok(Value::Null)
            }
            "updateFieldAppearance" => {
                let field_id = string_arg(member, &args, 0)?;
                let changes = args.get(1).cloned().unwrap_or(Value::Null);
                self.host
                    .update_field_appearance(&field_id, changes)
                    .await?;
                Ok(Value::Null)
            }
            unknown => self.host.forward_call(&self.call_id, unknown, args).await,
        }
    }
}

fn string_arg(member: &str, args: &[Value], index: usize) -> Result<String> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::validation(format!("{member}: argument {index} must be a string")))
}

fn typed_arg<T: serde::de::DeserializeOwned>(
    member: &str,
    args: &[Value],
    index: usize,
) -> Result<T> {
    let value = args.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|err| Error::validation(format!("{member}: bad argument {index}: {err}")))
}
