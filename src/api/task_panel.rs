//! Task side-panel dispatcher: detail read model, checkpoint commands and
//! chat, all addressed to one task. Manager-only; a missing action reads as
//! `detail`.

use atelier_types::{CreateCheckpoint, ParentType, Principal, UpdateCheckpoint};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::api::{
    Reply, ids_field, opt_str_field, parse_body, reply_with, require_manager, str_field,
};
use crate::db::ordering;
use crate::error::{AtelierError, Result};
use crate::services::{chat_service, checkpoint_service, task_service};

pub async fn handle(pool: &SqlitePool, principal: &Principal, task_id: &str, raw: &str) -> Reply {
    reply_with(dispatch(pool, principal, task_id, raw).await)
}

async fn dispatch(
    pool: &SqlitePool,
    principal: &Principal,
    task_id: &str,
    raw: &str,
) -> Result<Value> {
    require_manager(principal)?;
    let _task = task_service::get_task(pool, task_id).await?;
    let body = parse_body(raw)?;
    let action = body.get("action").and_then(Value::as_str).unwrap_or("detail");
    let scope = ordering::TASK_CHECKPOINTS;

    match action {
        "detail" => {
            let detail = task_service::task_detail(pool, task_id).await?;
            Ok(serde_json::to_value(detail)?)
        }
        "checkpoint_create" => {
            let checkpoint = checkpoint_service::create_checkpoint(
                pool,
                scope,
                task_id,
                CreateCheckpoint {
                    title: opt_str_field(&body, "title").unwrap_or_default(),
                    comment: opt_str_field(&body, "comment").unwrap_or_default(),
                },
            )
            .await?;
            Ok(serde_json::json!({ "checkpoint": checkpoint }))
        }
        "checkpoint_update" => {
            let id = str_field(&body, "id")?;
            let updates = UpdateCheckpoint {
                title: opt_str_field(&body, "title"),
                comment: opt_str_field(&body, "comment"),
                is_done: body.get("is_done").and_then(Value::as_bool),
            };
            checkpoint_service::update_checkpoint(pool, scope, task_id, id, updates).await?;
            Ok(serde_json::json!({}))
        }
        "checkpoint_delete" => {
            let id = str_field(&body, "id")?;
            checkpoint_service::delete_checkpoint(pool, scope, task_id, id).await?;
            Ok(serde_json::json!({}))
        }
        "checkpoint_reorder" => {
            let ids = ids_field(&body)?;
            checkpoint_service::reorder_checkpoints(pool, scope, task_id, &ids).await?;
            Ok(serde_json::json!({}))
        }
        "chat_add" => {
            let text = opt_str_field(&body, "text").unwrap_or_default();
            let message =
                chat_service::post_message(pool, ParentType::Task, task_id, Some(principal), &text)
                    .await?;
            Ok(serde_json::json!({
                "id": message.id,
                "text": message.text,
                "created_at": message.created_at,
            }))
        }
        other => Err(AtelierError::BadAction(other.to_string())),
    }
}
