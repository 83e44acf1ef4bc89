//! Command dispatcher surface.
//!
//! Commands arrive as JSON bodies with an `"action"` verb and reply with
//! `{"ok": true, ...}` or `{"ok": false, "error": "<code>"}` plus an
//! HTTP-style status. Handlers return [`Reply`] so the hosting layer can
//! translate into its own envelope without re-inspecting errors.

pub mod kanban;
pub mod request_checkpoints;
pub mod task_panel;

use atelier_types::{ClientRequest, Principal, Role};
use serde_json::Value;

use crate::error::{AtelierError, Result};

/// A dispatcher reply: HTTP-style status plus the JSON body to send.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    /// Success reply; `"ok": true` is merged into the body object.
    pub fn ok(mut body: Value) -> Self {
        if let Value::Object(map) = &mut body {
            map.insert("ok".to_string(), Value::Bool(true));
        }
        Reply { status: 200, body }
    }

    /// Error reply carrying the stable wire code. Internal errors are
    /// logged here; the code on the wire stays opaque.
    pub fn error(err: &AtelierError) -> Self {
        let status = err.http_status();
        if status >= 500 {
            tracing::error!(error = %err, "command failed");
        }
        Reply {
            status,
            body: serde_json::json!({
                "ok": false,
                "error": err.error_code(),
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status < 400
    }
}

/// Collapse a handler result into a reply.
pub(crate) fn reply_with(result: Result<Value>) -> Reply {
    match result {
        Ok(body) => Reply::ok(body),
        Err(err) => Reply::error(&err),
    }
}

/// Parse a raw command body. An empty body is an empty object (commands
/// with a default action accept it); anything else must be valid JSON.
pub(crate) fn parse_body(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|_| AtelierError::InvalidJson)
}

/// Required string field of a command body.
pub(crate) fn str_field<'a>(body: &'a Value, key: &str) -> Result<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AtelierError::InvalidPayload(format!("'{}' is required", key)))
}

/// Optional string field; absent and null both read as `None`.
pub(crate) fn opt_str_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// The `"ids"` sequence of a reorder command.
pub(crate) fn ids_field(body: &Value) -> Result<Vec<String>> {
    let list = body
        .get("ids")
        .and_then(Value::as_array)
        .ok_or(AtelierError::IdsListRequired)?;
    list.iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or(AtelierError::IdsListRequired)
        })
        .collect()
}

pub(crate) fn require_manager(principal: &Principal) -> Result<()> {
    if principal.role == Role::Manager {
        Ok(())
    } else {
        Err(AtelierError::Forbidden("manager role required".into()))
    }
}

/// Who may read a request: its owning client, or any manager.
pub(crate) fn authorize_request_access(
    principal: &Principal,
    request: &ClientRequest,
) -> Result<()> {
    match principal.role {
        Role::Manager => Ok(()),
        Role::Client if request.client_id.as_deref() == Some(principal.user_id.as_str()) => Ok(()),
        _ => Err(AtelierError::Forbidden(format!(
            "no access to request {}",
            request.id
        ))),
    }
}
