use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// A project opened from an accepted client request. Exactly one project
/// exists per request; the pairing is enforced by a UNIQUE constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Project {
    pub id: String,
    pub client_request_id: String,
    pub name: String,
    pub description: String,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: String,
}
