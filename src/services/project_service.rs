use atelier_types::{Principal, Project, Role};
use sqlx::SqlitePool;

use crate::db::{
    self,
    events::{CreateEvent, EntityType, EventType},
};
use crate::error::{AtelierError, Result};
use crate::services::require_role;

/// Get a project by ID
pub async fn get_project(pool: &SqlitePool, id: &str) -> Result<Project> {
    db::projects::get(pool, id)
        .await?
        .ok_or_else(|| AtelierError::ProjectNotFound(id.to_string()))
}

/// List projects, oldest first. Archived boards are hidden unless asked
/// for explicitly.
pub async fn list_projects(pool: &SqlitePool, include_archived: bool) -> Result<Vec<Project>> {
    db::projects::list(pool, include_archived).await
}

/// Archive or unarchive a project. Archiving hides the board from the
/// active list but leaves its tasks and chat intact.
pub async fn set_archived(
    pool: &SqlitePool,
    principal: &Principal,
    project_id: &str,
    archived: bool,
) -> Result<Project> {
    require_role(principal, Role::Manager)?;
    let _project = get_project(pool, project_id).await?;

    db::projects::set_archived(pool, project_id, archived).await?;
    tracing::info!(project_id, archived, "project archive flag changed");

    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::ProjectArchived,
            entity_type: EntityType::Project,
            entity_id: project_id.to_string(),
            actor: Some(principal.user_id.clone()),
            payload: serde_json::json!({ "archived": archived }),
        },
    )
    .await?;

    get_project(pool, project_id).await
}
