//! Wire envelopes for the frame/host channel.
//!
//! Every line crossing the boundary is one JSON envelope: a `call` (with an
//! id when the caller expects a response, without one for notifications) or
//! a `response` correlated by id. Both directions use the same shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// One message on the wire, in either direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Envelope {
    /// Invoke a method on the peer.
    Call {
        /// Correlation id; absent for fire-and-forget notifications.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        method: String,
        #[serde(default)]
        params: Value,
    },

    /// Outcome of a previously received call.
    Response {
        id: String,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Envelope {
    /// Build a call expecting a response.
    #[must_use]
    pub fn call(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self::Call {
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Build a fire-and-forget notification.
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self::Call {
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Build a success response.
    #[must_use]
    pub fn response_ok(id: impl Into<String>, data: Option<Value>) -> Self {
        Self::Response {
            id: id.into(),
            ok: true,
            data,
            code: None,
            message: None,
        }
    }

    /// Build a failure response.
    #[must_use]
    pub fn response_error(
        id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Response {
            id: id.into(),
            ok: false,
            data: None,
            code: Some(code.into()),
            message: Some(message.into()),
        }
    }

    /// Parse one wire line.
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|err| Error::protocol(format!("bad envelope: {err}")))
    }

    /// Serialize to one wire line (no trailing newline).
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Convert a received response envelope into the call's outcome.
pub fn response_outcome(
    ok: bool,
    data: Option<Value>,
    code: Option<String>,
    message: Option<String>,
) -> Result<Value> {
    if ok {
        Ok(data.unwrap_or(Value::Null))
    } else {
        Err(Error::host(
            code.unwrap_or_else(|| "unknown".to_string()),
            message.unwrap_or_default(),
        ))
    }
}
