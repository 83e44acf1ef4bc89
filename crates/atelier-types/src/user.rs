use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use crate::task::TaskType;

/// User role with snake_case serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Client,
    Manager,
    Developer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Manager => "manager",
            Role::Developer => "developer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "manager" => Ok(Role::Manager),
            "developer" => Ok(Role::Developer),
            _ => Err(()),
        }
    }
}

/// Developer specialization. `None` for users that are not developers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeveloperType {
    #[default]
    None,
    Frontend,
    Backend,
    Fullstack,
    Devops,
    Qa,
    Android,
    Db,
}

impl DeveloperType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeveloperType::None => "none",
            DeveloperType::Frontend => "frontend",
            DeveloperType::Backend => "backend",
            DeveloperType::Fullstack => "fullstack",
            DeveloperType::Devops => "devops",
            DeveloperType::Qa => "qa",
            DeveloperType::Android => "android",
            DeveloperType::Db => "db",
        }
    }

    /// Task types this specialization may claim. Fullstack developers cover
    /// frontend and backend work in addition to fullstack tasks; everyone
    /// else claims exactly their own type.
    pub fn claimable_task_types(&self) -> &'static [TaskType] {
        match self {
            DeveloperType::Fullstack => {
                &[TaskType::Frontend, TaskType::Backend, TaskType::Fullstack]
            }
            DeveloperType::Frontend => &[TaskType::Frontend],
            DeveloperType::Backend => &[TaskType::Backend],
            DeveloperType::Devops => &[TaskType::Devops],
            DeveloperType::Qa => &[TaskType::Qa],
            DeveloperType::Android => &[TaskType::Android],
            DeveloperType::Db => &[TaskType::Db],
            DeveloperType::None => &[],
        }
    }
}

impl std::fmt::Display for DeveloperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeveloperType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(DeveloperType::None),
            "frontend" => Ok(DeveloperType::Frontend),
            "backend" => Ok(DeveloperType::Backend),
            "fullstack" => Ok(DeveloperType::Fullstack),
            "devops" => Ok(DeveloperType::Devops),
            "qa" => Ok(DeveloperType::Qa),
            "android" => Ok(DeveloperType::Android),
            "db" => Ok(DeveloperType::Db),
            _ => Err(()),
        }
    }
}

/// A user account. The engine consumes these read-only; account management
/// lives in the surrounding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: String,
    pub developer_type: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// The authenticated identity the surrounding layer attaches to every
/// command. The engine trusts who the principal is but re-checks role
/// preconditions itself before mutating anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub developer_type: DeveloperType,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            role,
            developer_type: DeveloperType::None,
        }
    }

    pub fn developer(
        user_id: impl Into<String>,
        username: impl Into<String>,
        developer_type: DeveloperType,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            role: Role::Developer,
            developer_type,
        }
    }
}
