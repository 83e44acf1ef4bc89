use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// What kind of product the client is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Website,
    Bot,
    Mobile,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Website => "website",
            ProjectType::Bot => "bot",
            ProjectType::Mobile => "mobile",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectType::Website => "Website",
            ProjectType::Bot => "Bot (Telegram etc.)",
            ProjectType::Mobile => "Mobile app",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProjectType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "website" => Ok(ProjectType::Website),
            "bot" => Ok(ProjectType::Bot),
            "mobile" => Ok(ProjectType::Mobile),
            _ => Err(()),
        }
    }
}

/// Client request lifecycle state. Requests only move forward through
/// these states; `done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    New,
    Discuss,
    InProgress,
    Done,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::New => "new",
            RequestStatus::Discuss => "discuss",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Done => "done",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::New => "New",
            RequestStatus::Discuss => "In discussion",
            RequestStatus::InProgress => "In progress",
            RequestStatus::Done => "Completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Done)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(RequestStatus::New),
            "discuss" => Ok(RequestStatus::Discuss),
            "in_progress" | "in-progress" => Ok(RequestStatus::InProgress),
            "done" | "completed" => Ok(RequestStatus::Done),
            _ => Err(()),
        }
    }
}

/// A work request submitted by a client, triaged by a manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct ClientRequest {
    pub id: String,
    pub project_type: String,
    pub title: String,
    pub description: String,
    pub contact_email: String,
    pub contact_telegram: String,
    pub status: String,
    pub client_id: Option<String>,
    pub manager_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ClientRequest {
    pub fn status_enum(&self) -> RequestStatus {
        self.status.parse().unwrap_or_default()
    }

    pub fn project_type_enum(&self) -> Option<ProjectType> {
        self.project_type.parse().ok()
    }
}

/// Input for submitting a new client request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    pub project_type: ProjectType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub contact_email: String,
    #[serde(default)]
    pub contact_telegram: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_done_is_terminal() {
        assert!(RequestStatus::Done.is_terminal());
        assert!(!RequestStatus::New.is_terminal());
        assert!(!RequestStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "in_progress".parse::<RequestStatus>().unwrap(),
            RequestStatus::InProgress
        );
        assert_eq!("DONE".parse::<RequestStatus>().unwrap(), RequestStatus::Done);
        assert!("archived".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_project_type_parse() {
        assert_eq!("website".parse::<ProjectType>().unwrap(), ProjectType::Website);
        assert!("desktop".parse::<ProjectType>().is_err());
    }
}
