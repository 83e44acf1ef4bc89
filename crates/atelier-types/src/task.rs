use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Kanban column. Any column accepts a move from any other column; the
/// board is free-form, not a strict pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To do",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Review => "Review / QA",
            TaskStatus::Done => "Done",
        }
    }

}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" | "in-progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" | "completed" => Ok(TaskStatus::Done),
            _ => Err(()),
        }
    }
}

/// What kind of work a task is, matched against developer specializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Frontend,
    Backend,
    Fullstack,
    Devops,
    Qa,
    Android,
    Db,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Frontend => "frontend",
            TaskType::Backend => "backend",
            TaskType::Fullstack => "fullstack",
            TaskType::Devops => "devops",
            TaskType::Qa => "qa",
            TaskType::Android => "android",
            TaskType::Db => "db",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskType::Frontend => "Frontend",
            TaskType::Backend => "Backend",
            TaskType::Fullstack => "Fullstack",
            TaskType::Devops => "DevOps",
            TaskType::Qa => "QA",
            TaskType::Android => "Android",
            TaskType::Db => "Database",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "frontend" => Ok(TaskType::Frontend),
            "backend" => Ok(TaskType::Backend),
            "fullstack" => Ok(TaskType::Fullstack),
            "devops" => Ok(TaskType::Devops),
            "qa" => Ok(TaskType::Qa),
            "android" => Ok(TaskType::Android),
            "db" => Ok(TaskType::Db),
            _ => Err(()),
        }
    }
}

/// Story points are clamped into this range on create.
pub const STORY_POINTS_MAX: i64 = 100;

/// Clamp raw story points into the allowed `[0, 100]` range.
pub fn clamp_story_points(raw: i64) -> i64 {
    raw.clamp(0, STORY_POINTS_MAX)
}

/// A unit of work on a project's kanban board.
///
/// `ord` is the position within the `(project, status)` column: unique per
/// column, not necessarily contiguous. `starts_after_task_id` is a weak
/// predecessor reference; it never constrains column moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub sprint_id: Option<String>,
    pub task_number: i64,
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub status: String,
    pub created_by: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
    pub story_points: i64,
    pub ord: i64,
    pub starts_after_task_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn status_enum(&self) -> TaskStatus {
        self.status.parse().unwrap_or_default()
    }

    pub fn task_type_enum(&self) -> Option<TaskType> {
        self.task_type.parse().ok()
    }
}

/// Input for creating a task on a project board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub task_type: TaskType,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub story_points: i64,
    #[serde(default)]
    pub starts_after_task_id: Option<String>,
}
