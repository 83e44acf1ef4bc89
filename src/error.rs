use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtelierError {
    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unknown status: {0}")]
    BadStatus(String),

    #[error("Unknown action: {0}")]
    BadAction(String),

    #[error("Request body is not valid JSON")]
    InvalidJson,

    #[error("Malformed payload: {0}")]
    InvalidPayload(String),

    #[error("Title must not be empty")]
    TitleRequired,

    #[error("Message text must not be empty")]
    TextRequired,

    #[error("'ids' must be a list")]
    IdsListRequired,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AtelierError {
    /// Stable error code surfaced on the wire. Internal errors collapse to
    /// a single opaque code; storage details never leave the process.
    pub fn error_code(&self) -> &'static str {
        match self {
            AtelierError::RequestNotFound(_)
            | AtelierError::ProjectNotFound(_)
            | AtelierError::TaskNotFound(_)
            | AtelierError::CheckpointNotFound(_)
            | AtelierError::UserNotFound(_) => "not_found",

            AtelierError::Forbidden(_) => "forbidden",
            AtelierError::Conflict(_) => "conflict",
            AtelierError::BadStatus(_) => "bad_status",
            AtelierError::BadAction(_) => "bad_action",
            AtelierError::InvalidJson => "invalid_json",
            AtelierError::InvalidPayload(_) => "invalid_payload",
            AtelierError::TitleRequired => "title_required",
            AtelierError::TextRequired => "text_required",
            AtelierError::IdsListRequired => "ids_list_required",
            AtelierError::InvalidArgument(_) => "invalid_payload",

            AtelierError::Database(_) | AtelierError::Json(_) | AtelierError::Io(_) => "internal",
        }
    }

    /// HTTP-style status for the response envelope.
    pub fn http_status(&self) -> u16 {
        match self {
            AtelierError::RequestNotFound(_)
            | AtelierError::ProjectNotFound(_)
            | AtelierError::TaskNotFound(_)
            | AtelierError::CheckpointNotFound(_)
            | AtelierError::UserNotFound(_) => 404,

            AtelierError::Forbidden(_) => 403,
            AtelierError::Conflict(_) => 409,

            AtelierError::BadStatus(_)
            | AtelierError::BadAction(_)
            | AtelierError::InvalidJson
            | AtelierError::InvalidPayload(_)
            | AtelierError::TitleRequired
            | AtelierError::TextRequired
            | AtelierError::IdsListRequired
            | AtelierError::InvalidArgument(_) => 400,

            AtelierError::Database(_) | AtelierError::Json(_) | AtelierError::Io(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, AtelierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(
            AtelierError::TaskNotFound("t".into()).error_code(),
            "not_found"
        );
        assert_eq!(AtelierError::TitleRequired.error_code(), "title_required");
        assert_eq!(AtelierError::InvalidJson.error_code(), "invalid_json");
        assert_eq!(
            AtelierError::BadStatus("x".into()).error_code(),
            "bad_status"
        );
    }

    #[test]
    fn test_http_statuses() {
        assert_eq!(AtelierError::RequestNotFound("r".into()).http_status(), 404);
        assert_eq!(AtelierError::Forbidden("f".into()).http_status(), 403);
        assert_eq!(AtelierError::Conflict("c".into()).http_status(), 409);
        assert_eq!(AtelierError::IdsListRequired.http_status(), 400);
    }
}
