use atelier_types::{Checkpoint, CreateCheckpoint, UpdateCheckpoint, generate_checkpoint_id};
use sqlx::SqlitePool;

use crate::db::{
    self, counters,
    events::{CreateEvent, EntityType, EventType},
    ordering::ListScope,
};
use crate::error::{AtelierError, Result};

/// Append a checkpoint to the bottom of a parent's timeline. Callers have
/// already resolved the parent (request or task) to a live row.
pub async fn create_checkpoint(
    pool: &SqlitePool,
    scope: ListScope,
    parent_id: &str,
    input: CreateCheckpoint,
) -> Result<Checkpoint> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(AtelierError::TitleRequired);
    }

    let counter_scope = format!("{}:cp", parent_id);
    let number = counters::next(pool, &counter_scope).await?;
    let id = generate_checkpoint_id(parent_id, number);

    let checkpoint =
        db::checkpoints::create(pool, scope, parent_id, &id, title, input.comment.trim()).await?;

    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::CheckpointCreated,
            entity_type: EntityType::Checkpoint,
            entity_id: id,
            actor: None,
            payload: serde_json::json!({
                "parent_id": parent_id,
                "title": checkpoint.title,
            }),
        },
    )
    .await?;

    Ok(checkpoint)
}

/// Get a checkpoint scoped to its claimed parent; a mismatched parent is
/// indistinguishable from a missing checkpoint.
pub async fn get_checkpoint(
    pool: &SqlitePool,
    scope: ListScope,
    parent_id: &str,
    id: &str,
) -> Result<Checkpoint> {
    db::checkpoints::get(pool, scope, parent_id, id)
        .await?
        .ok_or_else(|| AtelierError::CheckpointNotFound(id.to_string()))
}

/// List a parent's checkpoints in display order.
pub async fn list_checkpoints(
    pool: &SqlitePool,
    scope: ListScope,
    parent_id: &str,
) -> Result<Vec<Checkpoint>> {
    db::checkpoints::list(pool, scope, parent_id).await
}

/// Apply a partial update. Omitted fields keep their value; supplying
/// nothing is a no-op. An explicit empty title is rejected.
pub async fn update_checkpoint(
    pool: &SqlitePool,
    scope: ListScope,
    parent_id: &str,
    id: &str,
    mut updates: UpdateCheckpoint,
) -> Result<()> {
    let current = get_checkpoint(pool, scope, parent_id, id).await?;

    if updates.is_empty() {
        return Ok(());
    }
    if let Some(title) = &updates.title {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(AtelierError::TitleRequired);
        }
        updates.title = Some(trimmed.to_string());
    }
    if let Some(comment) = &updates.comment {
        updates.comment = Some(comment.trim().to_string());
    }

    db::checkpoints::update(pool, scope, parent_id, &current, &updates).await?;

    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::CheckpointUpdated,
            entity_type: EntityType::Checkpoint,
            entity_id: id.to_string(),
            actor: None,
            payload: serde_json::json!({ "parent_id": parent_id }),
        },
    )
    .await?;

    Ok(())
}

/// Delete a checkpoint. Sibling ranks are left alone, so the remaining
/// list keeps its order with a gap.
pub async fn delete_checkpoint(
    pool: &SqlitePool,
    scope: ListScope,
    parent_id: &str,
    id: &str,
) -> Result<()> {
    let deleted = db::checkpoints::delete(pool, scope, parent_id, id).await?;
    if !deleted {
        return Err(AtelierError::CheckpointNotFound(id.to_string()));
    }

    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::CheckpointDeleted,
            entity_type: EntityType::Checkpoint,
            entity_id: id.to_string(),
            actor: None,
            payload: serde_json::json!({ "parent_id": parent_id }),
        },
    )
    .await?;

    Ok(())
}

/// Reassign ranks 1..N following the given id sequence. Ids that do not
/// belong to the parent are ignored; ids left out keep their rank.
pub async fn reorder_checkpoints(
    pool: &SqlitePool,
    scope: ListScope,
    parent_id: &str,
    ids: &[String],
) -> Result<()> {
    db::ordering::reorder(pool, scope, parent_id, ids).await?;

    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::CheckpointReordered,
            entity_type: EntityType::Checkpoint,
            entity_id: parent_id.to_string(),
            actor: None,
            payload: serde_json::json!({ "count": ids.len() }),
        },
    )
    .await?;

    Ok(())
}
