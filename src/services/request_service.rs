use atelier_types::{
    ChatMessage, Checkpoint, ClientRequest, CreateRequest, Principal, Project, RequestStatus, Role,
    generate_project_id, generate_request_id,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{
    self,
    events::{CreateEvent, EntityType, EventType},
    ordering,
};
use crate::error::{AtelierError, Result};
use crate::services::{chat_service, require_role};

/// Submit a new client request. The public form is unauthenticated; when a
/// logged-in client submits, their account is recorded on the request.
pub async fn submit_request(
    pool: &SqlitePool,
    input: CreateRequest,
    client: Option<&Principal>,
) -> Result<ClientRequest> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(AtelierError::TitleRequired);
    }
    let contact_email = input.contact_email.trim();
    if contact_email.is_empty() {
        return Err(AtelierError::InvalidArgument(
            "contact_email is required".into(),
        ));
    }

    let id = generate_request_id();
    let now = chrono::Utc::now().to_rfc3339();

    let request = ClientRequest {
        id: id.clone(),
        project_type: input.project_type.as_str().to_string(),
        title: title.to_string(),
        description: input.description.trim().to_string(),
        contact_email: contact_email.to_string(),
        contact_telegram: input.contact_telegram.trim().to_string(),
        status: RequestStatus::New.as_str().to_string(),
        client_id: client.map(|p| p.user_id.clone()),
        manager_id: None,
        created_at: now.clone(),
        updated_at: now,
    };

    db::requests::create(pool, &request).await?;
    tracing::info!(request_id = %request.id, "client request submitted");

    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::RequestSubmitted,
            entity_type: EntityType::Request,
            entity_id: request.id.clone(),
            actor: client.map(|p| p.user_id.clone()),
            payload: serde_json::json!({
                "project_type": request.project_type,
                "title": request.title,
            }),
        },
    )
    .await?;

    Ok(request)
}

/// Get a request by ID
pub async fn get_request(pool: &SqlitePool, id: &str) -> Result<ClientRequest> {
    db::requests::get(pool, id)
        .await?
        .ok_or_else(|| AtelierError::RequestNotFound(id.to_string()))
}

/// List all requests, newest first (manager triage queue)
pub async fn list_requests(pool: &SqlitePool) -> Result<Vec<ClientRequest>> {
    db::requests::list(pool).await
}

/// List requests owned by one client, newest first
pub async fn list_client_requests(
    pool: &SqlitePool,
    client_id: &str,
) -> Result<Vec<ClientRequest>> {
    db::requests::list_by_client(pool, client_id).await
}

/// Move a request into discussion under the acting manager. A no-op when
/// the request already left `new`; rejected once the request is closed.
pub async fn to_discuss(
    pool: &SqlitePool,
    principal: &Principal,
    request_id: &str,
) -> Result<ClientRequest> {
    require_role(principal, Role::Manager)?;
    let request = get_request(pool, request_id).await?;

    match request.status_enum() {
        RequestStatus::New => {
            db::requests::set_discuss(pool, request_id, &principal.user_id).await?;
            db::events::create(
                pool,
                &CreateEvent {
                    event_type: EventType::RequestStatusChanged,
                    entity_type: EntityType::Request,
                    entity_id: request_id.to_string(),
                    actor: Some(principal.user_id.clone()),
                    payload: serde_json::json!({
                        "old_status": "new",
                        "new_status": "discuss",
                    }),
                },
            )
            .await?;
        }
        RequestStatus::Discuss | RequestStatus::InProgress => {}
        RequestStatus::Done => {
            return Err(AtelierError::Conflict(format!(
                "Request {} is closed",
                request_id
            )));
        }
    }

    get_request(pool, request_id).await
}

/// Accept a request into work: status `in_progress`, acting manager
/// recorded, and the owned project created from the request's title and
/// description. Accepting straight from `new` is allowed (fast-track
/// without a discussion phase); repeating the action is harmless and never
/// creates a second project.
pub async fn to_work(
    pool: &SqlitePool,
    principal: &Principal,
    request_id: &str,
) -> Result<(ClientRequest, Project)> {
    require_role(principal, Role::Manager)?;
    let request = get_request(pool, request_id).await?;
    let old_status = request.status.clone();

    if request.status_enum().is_terminal() {
        return Err(AtelierError::Conflict(format!(
            "Request {} is closed",
            request_id
        )));
    }

    let candidate_id = generate_project_id(&request.title);
    db::requests::accept(
        pool,
        request_id,
        &principal.user_id,
        &candidate_id,
        &request.title,
        &request.description,
    )
    .await?;

    // The insert is silently skipped when the project already exists, so
    // the stored row decides whether this call actually created it.
    let project = db::projects::get_by_request(pool, request_id)
        .await?
        .ok_or_else(|| AtelierError::ProjectNotFound(request_id.to_string()))?;

    if old_status != "in_progress" {
        db::events::create(
            pool,
            &CreateEvent {
                event_type: EventType::RequestStatusChanged,
                entity_type: EntityType::Request,
                entity_id: request_id.to_string(),
                actor: Some(principal.user_id.clone()),
                payload: serde_json::json!({
                    "old_status": old_status,
                    "new_status": "in_progress",
                }),
            },
        )
        .await?;
    }
    if project.id == candidate_id {
        tracing::info!(request_id, project_id = %project.id, "project opened from request");
        db::events::create(
            pool,
            &CreateEvent {
                event_type: EventType::ProjectCreated,
                entity_type: EntityType::Project,
                entity_id: project.id.clone(),
                actor: Some(principal.user_id.clone()),
                payload: serde_json::json!({
                    "client_request_id": request_id,
                    "name": project.name,
                }),
            },
        )
        .await?;
    }

    let request = get_request(pool, request_id).await?;
    Ok((request, project))
}

/// Close a request. `done` is terminal: closing twice is a conflict, and
/// no later status write is accepted.
pub async fn close_request(
    pool: &SqlitePool,
    principal: &Principal,
    request_id: &str,
) -> Result<ClientRequest> {
    require_role(principal, Role::Manager)?;
    let request = get_request(pool, request_id).await?;

    if request.status_enum().is_terminal() {
        return Err(AtelierError::Conflict(format!(
            "Request {} is already closed",
            request_id
        )));
    }

    db::requests::set_done(pool, request_id).await?;
    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::RequestStatusChanged,
            entity_type: EntityType::Request,
            entity_id: request_id.to_string(),
            actor: Some(principal.user_id.clone()),
            payload: serde_json::json!({
                "old_status": request.status,
                "new_status": "done",
            }),
        },
    )
    .await?;

    get_request(pool, request_id).await
}

/// Request fields plus display labels, as shown on the detail screen.
#[derive(Debug, Serialize)]
pub struct RequestSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub project_type: String,
    pub project_type_label: String,
    pub status: String,
    pub status_label: String,
    pub contact_email: String,
    pub contact_telegram: String,
    pub client_id: Option<String>,
    pub manager_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Read model for the request detail screen: the request, its checkpoint
/// timeline and the recent chat.
#[derive(Debug, Serialize)]
pub struct RequestDetail {
    pub request: RequestSummary,
    pub checkpoints: Vec<Checkpoint>,
    pub chat: Vec<ChatMessage>,
}

pub async fn request_detail(pool: &SqlitePool, request_id: &str) -> Result<RequestDetail> {
    let request = get_request(pool, request_id).await?;

    let status = request.status_enum();
    let project_type_label = request
        .project_type_enum()
        .map(|t| t.label().to_string())
        .unwrap_or_default();

    let checkpoints =
        db::checkpoints::list(pool, ordering::REQUEST_CHECKPOINTS, request_id).await?;
    let chat = chat_service::recent_chat(
        pool,
        atelier_types::ParentType::Request,
        request_id,
    )
    .await?;
    Ok(RequestDetail {
        request: RequestSummary {
            id: request.id,
            title: request.title,
            description: request.description,
            project_type: request.project_type,
            project_type_label,
            status: request.status,
            status_label: status.label().to_string(),
            contact_email: request.contact_email,
            contact_telegram: request.contact_telegram,
            client_id: request.client_id,
            manager_id: request.manager_id,
            created_at: request.created_at,
            updated_at: request.updated_at,
        },
        checkpoints,
        chat,
    })
}
