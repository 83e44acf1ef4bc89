use atelier_types::{
    ChatMessage, Checkpoint, CreateTask, Principal, Role, Task, TaskStatus, clamp_story_points,
    generate_task_id,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{
    self, counters,
    events::{CreateEvent, EntityType, EventType},
    ordering,
};
use crate::error::{AtelierError, Result};
use crate::services::{chat_service, get_project, require_role};

/// Create a task on a project board. Starts in `todo` at the bottom of the
/// column; story points are clamped into [0, 100]; an assignee, when given,
/// must resolve to an active developer.
pub async fn create_task(
    pool: &SqlitePool,
    principal: &Principal,
    project_id: &str,
    input: CreateTask,
) -> Result<Task> {
    require_role(principal, Role::Manager)?;
    let _project = get_project(pool, project_id).await?;

    let title = input.title.trim();
    if title.is_empty() {
        return Err(AtelierError::TitleRequired);
    }

    if let Some(assignee_id) = &input.assignee {
        db::users::get_active_developer(pool, assignee_id)
            .await?
            .ok_or_else(|| AtelierError::UserNotFound(assignee_id.clone()))?;
    }

    let scope = format!("project:{}:task", project_id);
    let task_number = counters::next(pool, &scope).await?;
    let id = generate_task_id(project_id, task_number);
    let now = chrono::Utc::now().to_rfc3339();

    let task = Task {
        id: id.clone(),
        project_id: project_id.to_string(),
        sprint_id: None,
        task_number,
        title: title.to_string(),
        description: input.description.trim().to_string(),
        task_type: input.task_type.as_str().to_string(),
        status: TaskStatus::Todo.as_str().to_string(),
        created_by: Some(principal.user_id.clone()),
        assignee: input.assignee,
        due_date: input.due_date,
        story_points: clamp_story_points(input.story_points),
        ord: 0, // assigned by the insert
        starts_after_task_id: input.starts_after_task_id,
        created_at: now.clone(),
        updated_at: now,
    };

    db::tasks::create(pool, &task).await?;
    tracing::info!(task_id = %id, project_id, "task created");

    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::TaskCreated,
            entity_type: EntityType::Task,
            entity_id: id.clone(),
            actor: Some(principal.user_id.clone()),
            payload: serde_json::json!({
                "title": task.title,
                "task_type": task.task_type,
                "project_id": project_id,
            }),
        },
    )
    .await?;

    get_task(pool, &id).await
}

/// Get a task by ID
pub async fn get_task(pool: &SqlitePool, id: &str) -> Result<Task> {
    db::tasks::get(pool, id)
        .await?
        .ok_or_else(|| AtelierError::TaskNotFound(id.to_string()))
}

/// Move a task to another kanban column. Any column accepts a move from
/// any other; the task is always appended to the bottom of the destination
/// column, whatever drop position the board requested. Only `status`,
/// `ord` and `updated_at` are written.
pub async fn move_task(
    pool: &SqlitePool,
    principal: &Principal,
    task_id: &str,
    new_status: &str,
) -> Result<Task> {
    require_role(principal, Role::Manager)?;
    let status: TaskStatus = new_status
        .parse()
        .map_err(|()| AtelierError::BadStatus(new_status.to_string()))?;

    let task = get_task(pool, task_id).await?;
    let old_status = task.status.clone();

    db::tasks::move_to(pool, task_id, status).await?;

    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::TaskMoved,
            entity_type: EntityType::Task,
            entity_id: task_id.to_string(),
            actor: Some(principal.user_id.clone()),
            payload: serde_json::json!({
                "old_status": old_status,
                "new_status": status.as_str(),
            }),
        },
    )
    .await?;

    get_task(pool, task_id).await
}

/// Kanban board read model: a project's tasks bucketed by column.
#[derive(Debug, Serialize)]
pub struct Board {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub review: Vec<Task>,
    pub done: Vec<Task>,
}

pub async fn board(pool: &SqlitePool, project_id: &str) -> Result<Board> {
    let _project = get_project(pool, project_id).await?;
    Ok(Board {
        todo: db::tasks::list_column(pool, project_id, TaskStatus::Todo).await?,
        in_progress: db::tasks::list_column(pool, project_id, TaskStatus::InProgress).await?,
        review: db::tasks::list_column(pool, project_id, TaskStatus::Review).await?,
        done: db::tasks::list_column(pool, project_id, TaskStatus::Done).await?,
    })
}

/// Task summary for the side panel, with display labels and usernames
/// resolved.
#[derive(Debug, Serialize)]
pub struct TaskSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub status_label: String,
    pub task_type: String,
    pub task_type_label: String,
    pub story_points: i64,
    pub assignee: Option<String>,
    pub created_by: Option<String>,
    pub due_date: Option<String>,
    pub project_id: String,
}

/// Read model for the task side panel: summary, checkpoint list, recent
/// chat (most recent 50, oldest-first).
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    pub task: TaskSummary,
    pub checkpoints: Vec<Checkpoint>,
    pub chat: Vec<ChatMessage>,
}

pub async fn task_detail(pool: &SqlitePool, task_id: &str) -> Result<TaskDetail> {
    let task = get_task(pool, task_id).await?;

    let assignee = match &task.assignee {
        Some(id) => db::users::get(pool, id).await?.map(|u| u.username),
        None => None,
    };
    let created_by = match &task.created_by {
        Some(id) => db::users::get(pool, id).await?.map(|u| u.username),
        None => None,
    };

    let status = task.status_enum();
    let task_type_label = task
        .task_type_enum()
        .map(|t| t.label().to_string())
        .unwrap_or_default();

    let checkpoints = db::checkpoints::list(pool, ordering::TASK_CHECKPOINTS, task_id).await?;
    let chat =
        chat_service::recent_chat(pool, atelier_types::ParentType::Task, task_id).await?;

    Ok(TaskDetail {
        task: TaskSummary {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            status_label: status.label().to_string(),
            task_type: task.task_type,
            task_type_label,
            story_points: task.story_points,
            assignee,
            created_by,
            due_date: task.due_date,
            project_id: task.project_id,
        },
        checkpoints,
        chat,
    })
}
