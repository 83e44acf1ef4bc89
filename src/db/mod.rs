pub mod connection;
pub mod ordering;

use sqlx::SqlitePool;

use crate::error::Result;

/// Database operations for users (read-mostly; accounts are managed by the
/// surrounding service, the engine only consults and seeds them)
pub mod users {
    use atelier_types::User;

    use super::*;

    pub async fn create(pool: &SqlitePool, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, role, developer_type, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.role)
        .bind(&user.developer_type)
        .bind(user.is_active)
        .bind(&user.created_at)
        .bind(&user.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Resolve an id to an active developer, or nothing.
    pub async fn get_active_developer(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ? AND role = 'developer' AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }
}

/// Database operations for client requests
pub mod requests {
    use atelier_types::ClientRequest;

    use super::*;

    pub async fn create(pool: &SqlitePool, request: &ClientRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO client_requests (id, project_type, title, description, contact_email,
                contact_telegram, status, client_id, manager_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.project_type)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.contact_email)
        .bind(&request.contact_telegram)
        .bind(&request.status)
        .bind(&request.client_id)
        .bind(&request.manager_id)
        .bind(&request.created_at)
        .bind(&request.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<ClientRequest>> {
        let request =
            sqlx::query_as::<_, ClientRequest>("SELECT * FROM client_requests WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(request)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<ClientRequest>> {
        let requests = sqlx::query_as::<_, ClientRequest>(
            "SELECT * FROM client_requests ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    pub async fn list_by_client(pool: &SqlitePool, client_id: &str) -> Result<Vec<ClientRequest>> {
        let requests = sqlx::query_as::<_, ClientRequest>(
            "SELECT * FROM client_requests WHERE client_id = ? ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    /// Move a request into `discuss` under the acting manager.
    pub async fn set_discuss(pool: &SqlitePool, id: &str, manager_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE client_requests SET status = 'discuss', manager_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(manager_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Accept a request: move it to `in_progress` and create its project,
    /// in one transaction. The UNIQUE constraint on
    /// `projects.client_request_id` plus ON CONFLICT DO NOTHING makes the
    /// project creation exactly-once under concurrent duplicate calls.
    pub async fn accept(
        pool: &SqlitePool,
        request_id: &str,
        manager_id: &str,
        project_id: &str,
        name: &str,
        description: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE client_requests SET status = 'in_progress', manager_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(manager_id)
        .bind(&now)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO projects (id, client_request_id, name, description, is_archived, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            ON CONFLICT(client_request_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(request_id)
        .bind(name)
        .bind(description)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Close a request. `done` is terminal; callers guard the transition.
    pub async fn set_done(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE client_requests SET status = 'done', updated_at = ? WHERE id = ? AND status != 'done'",
        )
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Database operations for projects
pub mod projects {
    use atelier_types::Project;

    use super::*;

    pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(project)
    }

    pub async fn get_by_request(pool: &SqlitePool, request_id: &str) -> Result<Option<Project>> {
        let project =
            sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE client_request_id = ?")
                .bind(request_id)
                .fetch_optional(pool)
                .await?;
        Ok(project)
    }

    pub async fn list(pool: &SqlitePool, include_archived: bool) -> Result<Vec<Project>> {
        let projects = if include_archived {
            sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at ASC")
                .fetch_all(pool)
                .await?
        } else {
            sqlx::query_as::<_, Project>(
                "SELECT * FROM projects WHERE is_archived = 0 ORDER BY created_at ASC",
            )
            .fetch_all(pool)
            .await?
        };
        Ok(projects)
    }

    pub async fn set_archived(pool: &SqlitePool, id: &str, archived: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE projects SET is_archived = ?, updated_at = ? WHERE id = ?")
                .bind(archived)
                .bind(chrono::Utc::now().to_rfc3339())
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Database operations for tasks
pub mod tasks {
    use atelier_types::{Task, TaskStatus, TaskType};

    use super::*;

    /// Insert a task at the bottom of its project's `todo` column. The rank
    /// is computed by a correlated subquery inside the INSERT, so two
    /// concurrent creates never share a rank.
    pub async fn create(pool: &SqlitePool, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, project_id, sprint_id, task_number, title, description,
                task_type, status, created_by, assignee, due_date, story_points, ord,
                starts_after_task_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                COALESCE((SELECT MAX(t2.ord) FROM tasks t2 WHERE t2.project_id = ? AND t2.status = ?), 0) + 1,
                ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.project_id)
        .bind(&task.sprint_id)
        .bind(task.task_number)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.task_type)
        .bind(&task.status)
        .bind(&task.created_by)
        .bind(&task.assignee)
        .bind(&task.due_date)
        .bind(task.story_points)
        .bind(&task.project_id)
        .bind(&task.status)
        .bind(&task.starts_after_task_id)
        .bind(&task.created_at)
        .bind(&task.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get(pool: &SqlitePool, id: &str) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(task)
    }

    /// One kanban column, ordered by rank then age.
    pub async fn list_column(
        pool: &SqlitePool,
        project_id: &str,
        status: TaskStatus,
    ) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE project_id = ? AND status = ? ORDER BY ord, created_at",
        )
        .bind(project_id)
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
        Ok(tasks)
    }

    /// Move a task to another column, appending it to the bottom. One
    /// statement: the destination rank is read and written atomically.
    pub async fn move_to(pool: &SqlitePool, id: &str, new_status: TaskStatus) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = ?2,
                ord = COALESCE((SELECT MAX(t2.ord) FROM tasks t2
                    WHERE t2.project_id = tasks.project_id AND t2.status = ?2 AND t2.id != tasks.id), 0) + 1,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(new_status.as_str())
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Claimable work for a set of task types: unassigned `todo` tasks,
    /// oldest projects first.
    pub async fn list_open_for_types(
        pool: &SqlitePool,
        task_types: &[TaskType],
    ) -> Result<Vec<Task>> {
        if task_types.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; task_types.len()].join(", ");
        let sql = format!(
            r#"
            SELECT t.* FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.status = 'todo' AND t.assignee IS NULL AND t.task_type IN ({})
            ORDER BY p.created_at ASC, t.created_at ASC
            "#,
            placeholders
        );
        let mut query = sqlx::query_as::<_, Task>(&sql);
        for task_type in task_types {
            query = query.bind(task_type.as_str());
        }
        let tasks = query.fetch_all(pool).await?;
        Ok(tasks)
    }

    /// Atomically claim a task for a developer. The WHERE clause re-checks
    /// both guards (task still claimable, developer holds no other active
    /// task) so the first claim wins and nobody ends up with two active
    /// tasks. Returns false when either guard failed.
    pub async fn claim(pool: &SqlitePool, task_id: &str, developer_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET assignee = ?2, status = 'in_progress', updated_at = ?3
            WHERE id = ?1 AND status = 'todo' AND assignee IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM tasks t2 WHERE t2.assignee = ?2 AND t2.status != 'done'
              )
            "#,
        )
        .bind(task_id)
        .bind(developer_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the developer currently holds a non-terminal assigned task.
    pub async fn has_active_task(pool: &SqlitePool, developer_id: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE assignee = ? AND status != 'done')",
        )
        .bind(developer_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }
}

/// Database operations for checkpoints. Both checkpoint tables share one
/// shape; the [`ordering::ListScope`] picks the table and parent column.
pub mod checkpoints {
    use atelier_types::{Checkpoint, UpdateCheckpoint};

    use super::ordering::ListScope;
    use super::*;

    fn columns(scope: ListScope) -> String {
        format!(
            "id, {} AS parent_id, title, comment, is_done, ord, created_at, updated_at",
            scope.parent_col
        )
    }

    /// Append a checkpoint at the bottom of the parent's list. The rank is
    /// assigned inside the INSERT so concurrent appends stay unique.
    pub async fn create(
        pool: &SqlitePool,
        scope: ListScope,
        parent_id: &str,
        id: &str,
        title: &str,
        comment: &str,
    ) -> Result<Checkpoint> {
        let now = chrono::Utc::now().to_rfc3339();
        let sql = format!(
            r#"
            INSERT INTO {t} (id, {p}, title, comment, is_done, ord, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0,
                COALESCE((SELECT MAX(c2.ord) FROM {t} c2 WHERE c2.{p} = ?), 0) + 1,
                ?, ?)
            RETURNING {cols}
            "#,
            t = scope.table,
            p = scope.parent_col,
            cols = columns(scope),
        );
        let checkpoint = sqlx::query_as::<_, Checkpoint>(&sql)
            .bind(id)
            .bind(parent_id)
            .bind(title)
            .bind(comment)
            .bind(parent_id)
            .bind(&now)
            .bind(&now)
            .fetch_one(pool)
            .await?;
        Ok(checkpoint)
    }

    /// Fetch a checkpoint, scoped to its claimed parent. A checkpoint that
    /// exists under a different parent is treated as absent.
    pub async fn get(
        pool: &SqlitePool,
        scope: ListScope,
        parent_id: &str,
        id: &str,
    ) -> Result<Option<Checkpoint>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND {} = ?",
            columns(scope),
            scope.table,
            scope.parent_col
        );
        let checkpoint = sqlx::query_as::<_, Checkpoint>(&sql)
            .bind(id)
            .bind(parent_id)
            .fetch_optional(pool)
            .await?;
        Ok(checkpoint)
    }

    pub async fn list(
        pool: &SqlitePool,
        scope: ListScope,
        parent_id: &str,
    ) -> Result<Vec<Checkpoint>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY ord, created_at",
            columns(scope),
            scope.table,
            scope.parent_col
        );
        let checkpoints = sqlx::query_as::<_, Checkpoint>(&sql)
            .bind(parent_id)
            .fetch_all(pool)
            .await?;
        Ok(checkpoints)
    }

    /// Write the merged fields of a partial update. Rank is untouched;
    /// reorders go through [`ordering::reorder`].
    pub async fn update(
        pool: &SqlitePool,
        scope: ListScope,
        parent_id: &str,
        current: &Checkpoint,
        updates: &UpdateCheckpoint,
    ) -> Result<bool> {
        let title = updates.title.as_deref().unwrap_or(&current.title);
        let comment = updates.comment.as_deref().unwrap_or(&current.comment);
        let is_done = updates.is_done.unwrap_or(current.is_done);

        let sql = format!(
            "UPDATE {} SET title = ?, comment = ?, is_done = ?, updated_at = ? WHERE id = ? AND {} = ?",
            scope.table, scope.parent_col
        );
        let result = sqlx::query(&sql)
            .bind(title)
            .bind(comment)
            .bind(is_done)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(&current.id)
            .bind(parent_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete without renumbering the surviving siblings.
    pub async fn delete(
        pool: &SqlitePool,
        scope: ListScope,
        parent_id: &str,
        id: &str,
    ) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE id = ? AND {} = ?",
            scope.table, scope.parent_col
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(parent_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Database operations for chat messages
pub mod comments {
    use atelier_types::{ChatMessage, Comment, ParentType};

    use super::*;

    pub async fn create(pool: &SqlitePool, comment: &Comment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, parent_type, parent_id, comment_number, author_id, text, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.parent_type)
        .bind(&comment.parent_id)
        .bind(comment.comment_number)
        .bind(&comment.author_id)
        .bind(&comment.text)
        .bind(&comment.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// The most recent `limit` messages for a parent, returned oldest-first
    /// with author usernames resolved (None for deleted accounts).
    pub async fn recent(
        pool: &SqlitePool,
        parent_type: ParentType,
        parent_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>> {
        let mut messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT c.id, c.text, c.created_at, u.username AS author
            FROM comments c
            LEFT JOIN users u ON u.id = c.author_id
            WHERE c.parent_type = ? AND c.parent_id = ?
            ORDER BY c.created_at DESC, c.comment_number DESC
            LIMIT ?
            "#,
        )
        .bind(parent_type.as_str())
        .bind(parent_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        messages.reverse();
        Ok(messages)
    }
}

/// Database operations for the append-only event log
pub mod events {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EventType {
        RequestSubmitted,
        RequestStatusChanged,
        ProjectCreated,
        ProjectArchived,
        TaskCreated,
        TaskMoved,
        TaskClaimed,
        CheckpointCreated,
        CheckpointUpdated,
        CheckpointDeleted,
        CheckpointReordered,
        MessagePosted,
    }

    impl EventType {
        pub fn as_str(&self) -> &'static str {
            match self {
                EventType::RequestSubmitted => "request.submitted",
                EventType::RequestStatusChanged => "request.status_changed",
                EventType::ProjectCreated => "project.created",
                EventType::ProjectArchived => "project.archived",
                EventType::TaskCreated => "task.created",
                EventType::TaskMoved => "task.moved",
                EventType::TaskClaimed => "task.claimed",
                EventType::CheckpointCreated => "checkpoint.created",
                EventType::CheckpointUpdated => "checkpoint.updated",
                EventType::CheckpointDeleted => "checkpoint.deleted",
                EventType::CheckpointReordered => "checkpoint.reordered",
                EventType::MessagePosted => "message.posted",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EntityType {
        Request,
        Project,
        Task,
        Checkpoint,
        Comment,
    }

    impl EntityType {
        pub fn as_str(&self) -> &'static str {
            match self {
                EntityType::Request => "request",
                EntityType::Project => "project",
                EntityType::Task => "task",
                EntityType::Checkpoint => "checkpoint",
                EntityType::Comment => "comment",
            }
        }
    }

    #[derive(Debug)]
    pub struct CreateEvent {
        pub event_type: EventType,
        pub entity_type: EntityType,
        pub entity_id: String,
        pub actor: Option<String>,
        pub payload: serde_json::Value,
    }

    pub async fn create(pool: &SqlitePool, event: &CreateEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (event_type, entity_type, entity_id, actor, payload, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.event_type.as_str())
        .bind(event.entity_type.as_str())
        .bind(&event.entity_id)
        .bind(&event.actor)
        .bind(event.payload.to_string())
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Database operations for counters (monotonic child numbering)
pub mod counters {
    use super::*;

    pub async fn next(pool: &SqlitePool, scope: &str) -> Result<i64> {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO counters (scope, value) VALUES (?, 1)
            ON CONFLICT(scope) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(scope)
        .fetch_one(pool)
        .await?;
        Ok(value)
    }
}
