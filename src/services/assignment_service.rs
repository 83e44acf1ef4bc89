use atelier_types::{Principal, Role, Task};
use sqlx::SqlitePool;

use crate::db::{
    self,
    events::{CreateEvent, EntityType, EventType},
};
use crate::error::{AtelierError, Result};
use crate::services::{get_task, require_role};

/// The claimable set for a developer: unassigned `todo` tasks matching
/// their specialization (fullstack covers frontend, backend and fullstack
/// work), oldest projects first.
pub async fn open_tasks(pool: &SqlitePool, principal: &Principal) -> Result<Vec<Task>> {
    require_role(principal, Role::Developer)?;
    let task_types = principal.developer_type.claimable_task_types();
    db::tasks::list_open_for_types(pool, task_types).await
}

/// Claim a task. A developer holds at most one non-`done` assigned task at
/// a time, and a task can be claimed only while it is still an unassigned
/// `todo` item. Both guards are re-checked atomically at claim time, so
/// under concurrent attempts the first claim wins and the loser gets a
/// `Conflict` with the task untouched.
pub async fn claim_task(pool: &SqlitePool, principal: &Principal, task_id: &str) -> Result<Task> {
    require_role(principal, Role::Developer)?;
    let _task = get_task(pool, task_id).await?;

    let claimed = db::tasks::claim(pool, task_id, &principal.user_id).await?;
    if !claimed {
        // Either guard failed; look once more to report which.
        if db::tasks::has_active_task(pool, &principal.user_id).await? {
            return Err(AtelierError::Conflict(format!(
                "{} already holds an active task",
                principal.username
            )));
        }
        return Err(AtelierError::Conflict(format!(
            "Task {} is no longer available",
            task_id
        )));
    }

    tracing::info!(task_id, developer = %principal.username, "task claimed");
    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::TaskClaimed,
            entity_type: EntityType::Task,
            entity_id: task_id.to_string(),
            actor: Some(principal.user_id.clone()),
            payload: serde_json::json!({}),
        },
    )
    .await?;

    get_task(pool, task_id).await
}
