use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Parent type for chat messages. Request chat and task chat share one
/// table, discriminated by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParentType {
    Request,
    #[default]
    Task,
}

impl ParentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentType::Request => "request",
            ParentType::Task => "task",
        }
    }
}

impl std::fmt::Display for ParentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ParentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "request" => Ok(ParentType::Request),
            "task" => Ok(ParentType::Task),
            _ => Err(()),
        }
    }
}

/// An append-only chat message attached to a request or task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Comment {
    pub id: String,
    pub parent_type: String,
    pub parent_id: String,
    pub comment_number: i64,
    pub author_id: Option<String>,
    pub text: String,
    pub created_at: String,
}

/// Read model for chat rendering: message text plus the author's username
/// resolved at query time (None once the account is gone).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub created_at: String,
    pub author: Option<String>,
}
