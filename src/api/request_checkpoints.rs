//! Request panel commands: the checkpoint dispatcher plus the client-facing
//! detail and chat surface.

use atelier_types::{CreateCheckpoint, ParentType, Principal, UpdateCheckpoint};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::api::{
    Reply, authorize_request_access, ids_field, opt_str_field, parse_body, reply_with,
    require_manager, str_field,
};
use crate::db::ordering;
use crate::error::{AtelierError, Result};
use crate::services::{chat_service, checkpoint_service, request_service};

/// Checkpoint command dispatcher: `{"action": "create" | "update" |
/// "delete" | "reorder", ...}`. Manager-only.
pub async fn handle(pool: &SqlitePool, principal: &Principal, request_id: &str, raw: &str) -> Reply {
    reply_with(dispatch(pool, principal, request_id, raw).await)
}

async fn dispatch(
    pool: &SqlitePool,
    principal: &Principal,
    request_id: &str,
    raw: &str,
) -> Result<Value> {
    require_manager(principal)?;
    let _request = request_service::get_request(pool, request_id).await?;
    let body = parse_body(raw)?;
    let action = str_field(&body, "action")?;
    let scope = ordering::REQUEST_CHECKPOINTS;

    match action {
        "create" => {
            let checkpoint = checkpoint_service::create_checkpoint(
                pool,
                scope,
                request_id,
                CreateCheckpoint {
                    title: opt_str_field(&body, "title").unwrap_or_default(),
                    comment: opt_str_field(&body, "comment").unwrap_or_default(),
                },
            )
            .await?;
            Ok(serde_json::json!({ "checkpoint": checkpoint }))
        }
        "update" => {
            let id = str_field(&body, "id")?;
            let updates = UpdateCheckpoint {
                title: opt_str_field(&body, "title"),
                comment: opt_str_field(&body, "comment"),
                is_done: body.get("is_done").and_then(Value::as_bool),
            };
            checkpoint_service::update_checkpoint(pool, scope, request_id, id, updates).await?;
            Ok(serde_json::json!({}))
        }
        "delete" => {
            let id = str_field(&body, "id")?;
            checkpoint_service::delete_checkpoint(pool, scope, request_id, id).await?;
            Ok(serde_json::json!({}))
        }
        "reorder" => {
            let ids = ids_field(&body)?;
            checkpoint_service::reorder_checkpoints(pool, scope, request_id, &ids).await?;
            Ok(serde_json::json!({}))
        }
        other => Err(AtelierError::BadAction(other.to_string())),
    }
}

/// Request detail read model: summary, checkpoints, recent chat. Readable
/// by any manager or the owning client.
pub async fn detail(pool: &SqlitePool, principal: &Principal, request_id: &str) -> Reply {
    reply_with(detail_inner(pool, principal, request_id).await)
}

async fn detail_inner(pool: &SqlitePool, principal: &Principal, request_id: &str) -> Result<Value> {
    let request = request_service::get_request(pool, request_id).await?;
    authorize_request_access(principal, &request)?;
    let detail = request_service::request_detail(pool, request_id).await?;
    Ok(serde_json::to_value(detail)?)
}

/// Append a chat message under a request. Same access rule as `detail`.
pub async fn chat_add(
    pool: &SqlitePool,
    principal: &Principal,
    request_id: &str,
    raw: &str,
) -> Reply {
    reply_with(chat_add_inner(pool, principal, request_id, raw).await)
}

async fn chat_add_inner(
    pool: &SqlitePool,
    principal: &Principal,
    request_id: &str,
    raw: &str,
) -> Result<Value> {
    let request = request_service::get_request(pool, request_id).await?;
    authorize_request_access(principal, &request)?;

    let body = parse_body(raw)?;
    let text = opt_str_field(&body, "text").unwrap_or_default();
    let message = chat_service::post_message(
        pool,
        ParentType::Request,
        request_id,
        Some(principal),
        &text,
    )
    .await?;
    Ok(serde_json::json!({
        "id": message.id,
        "text": message.text,
        "created_at": message.created_at,
    }))
}
