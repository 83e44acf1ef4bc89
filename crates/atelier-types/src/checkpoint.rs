use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// An ordered milestone item on a request or task timeline.
///
/// `ord` is the display rank within the parent: unique, positive, and only
/// guaranteed contiguous immediately after a reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Checkpoint {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub comment: String,
    pub is_done: bool,
    pub ord: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckpoint {
    pub title: String,
    #[serde(default)]
    pub comment: String,
}

/// Partial update for a checkpoint. Only supplied fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCheckpoint {
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_done: Option<bool>,
}

impl UpdateCheckpoint {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.comment.is_none() && self.is_done.is_none()
    }
}
