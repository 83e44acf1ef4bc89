//! Kanban move command: `{"id": "<task>", "status": "<column>"}`.

use atelier_types::Principal;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::api::{Reply, parse_body, reply_with, str_field};
use crate::error::Result;
use crate::services::task_service;

pub async fn move_card(pool: &SqlitePool, principal: &Principal, raw: &str) -> Reply {
    reply_with(move_card_inner(pool, principal, raw).await)
}

async fn move_card_inner(pool: &SqlitePool, principal: &Principal, raw: &str) -> Result<Value> {
    let body = parse_body(raw)?;
    let task_id = str_field(&body, "id")?;
    let status = str_field(&body, "status")?;

    let task = task_service::move_task(pool, principal, task_id, status).await?;
    Ok(serde_json::json!({
        "id": task.id,
        "status": task.status,
        "order": task.ord,
    }))
}
