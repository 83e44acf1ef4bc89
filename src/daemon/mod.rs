//! Daemon hosting the command dispatcher behind a Unix socket.
//!
//! One connection serves any number of request/response pairs; each
//! request runs as its own logical operation against the shared pool.

pub mod listener;
pub mod protocol;

use atelier_types::{Principal, Role};
use sqlx::SqlitePool;

use crate::api::{self, Reply, reply_with};
use crate::error::{AtelierError, Result};
use crate::services::{assignment_service, project_service, request_service, task_service};

pub use listener::{IpcConnection, IpcListener};

use protocol::{Operation, Request, Response};

/// Serve one client connection: any number of request/response pairs
/// until EOF or a `Shutdown` operation. Returns true when the daemon
/// should stop.
pub async fn handle_connection(pool: &SqlitePool, conn: &mut IpcConnection) -> Result<bool> {
    loop {
        // EOF here is the normal end of a client session
        let request = match conn.recv_request().await {
            Ok(request) => request,
            Err(_) => return Ok(false),
        };

        let (response, shutdown) = handle_request(pool, request).await;
        conn.send_response(&response).await?;
        if shutdown {
            return Ok(true);
        }
    }
}

/// Route one request. The second element of the pair is true when the
/// daemon should stop after this response is flushed.
pub async fn handle_request(pool: &SqlitePool, request: Request) -> (Response, bool) {
    let Request { id, principal, op } = request;

    match op {
        Operation::Ping => (Response::ok_empty(id), false),
        Operation::Shutdown => (Response::ok_empty(id), true),
        op => {
            let reply = handle_operation(pool, principal.as_ref(), op).await;
            (Response::from_reply(id, reply), false)
        }
    }
}

fn need_principal(principal: Option<&Principal>) -> Result<&Principal> {
    principal.ok_or_else(|| AtelierError::Forbidden("authentication required".into()))
}

/// Execute one operation against the engine and fold the outcome into a
/// dispatcher reply.
pub async fn handle_operation(
    pool: &SqlitePool,
    principal: Option<&Principal>,
    op: Operation,
) -> Reply {
    match op {
        Operation::Ping | Operation::Shutdown => Reply::ok(serde_json::json!({})),

        Operation::SubmitRequest(input) => reply_with(async {
            let request = request_service::submit_request(pool, input, principal).await?;
            Ok(serde_json::json!({ "request": request }))
        }
        .await),

        Operation::ListRequests => reply_with(async {
            let principal = need_principal(principal)?;
            let requests = match principal.role {
                Role::Manager => request_service::list_requests(pool).await?,
                Role::Client => {
                    request_service::list_client_requests(pool, &principal.user_id).await?
                }
                Role::Developer => {
                    return Err(AtelierError::Forbidden(
                        "developers have no request queue".into(),
                    ));
                }
            };
            Ok(serde_json::json!({ "requests": requests }))
        }
        .await),

        Operation::RequestDetail { request_id } => {
            match need_principal(principal) {
                Ok(principal) => api::request_checkpoints::detail(pool, principal, &request_id).await,
                Err(err) => Reply::error(&err),
            }
        }

        Operation::RequestToDiscuss { request_id } => reply_with(async {
            let principal = need_principal(principal)?;
            let request = request_service::to_discuss(pool, principal, &request_id).await?;
            Ok(serde_json::json!({ "request": request }))
        }
        .await),

        Operation::RequestToWork { request_id } => reply_with(async {
            let principal = need_principal(principal)?;
            let (request, project) = request_service::to_work(pool, principal, &request_id).await?;
            Ok(serde_json::json!({ "request": request, "project": project }))
        }
        .await),

        Operation::RequestClose { request_id } => reply_with(async {
            let principal = need_principal(principal)?;
            let request = request_service::close_request(pool, principal, &request_id).await?;
            Ok(serde_json::json!({ "request": request }))
        }
        .await),

        Operation::RequestCheckpoints { request_id, body } => match need_principal(principal) {
            Ok(principal) => {
                api::request_checkpoints::handle(pool, principal, &request_id, &body).await
            }
            Err(err) => Reply::error(&err),
        },

        Operation::RequestChatAdd { request_id, body } => match need_principal(principal) {
            Ok(principal) => {
                api::request_checkpoints::chat_add(pool, principal, &request_id, &body).await
            }
            Err(err) => Reply::error(&err),
        },

        Operation::ListProjects { include_archived } => reply_with(async {
            need_principal(principal)?;
            let projects = project_service::list_projects(pool, include_archived).await?;
            Ok(serde_json::json!({ "projects": projects }))
        }
        .await),

        Operation::SetProjectArchived {
            project_id,
            archived,
        } => reply_with(async {
            let principal = need_principal(principal)?;
            let project = project_service::set_archived(pool, principal, &project_id, archived).await?;
            Ok(serde_json::json!({ "project": project }))
        }
        .await),

        Operation::Board { project_id } => reply_with(async {
            need_principal(principal)?;
            let board = task_service::board(pool, &project_id).await?;
            Ok(serde_json::to_value(board)?)
        }
        .await),

        Operation::CreateTask { project_id, input } => reply_with(async {
            let principal = need_principal(principal)?;
            let task = task_service::create_task(pool, principal, &project_id, input).await?;
            Ok(serde_json::json!({ "task": task }))
        }
        .await),

        Operation::KanbanMove { body } => match need_principal(principal) {
            Ok(principal) => api::kanban::move_card(pool, principal, &body).await,
            Err(err) => Reply::error(&err),
        },

        Operation::TaskPanel { task_id, body } => match need_principal(principal) {
            Ok(principal) => api::task_panel::handle(pool, principal, &task_id, &body).await,
            Err(err) => Reply::error(&err),
        },

        Operation::OpenTasks => reply_with(async {
            let principal = need_principal(principal)?;
            let tasks = assignment_service::open_tasks(pool, principal).await?;
            Ok(serde_json::json!({ "tasks": tasks }))
        }
        .await),

        Operation::ClaimTask { task_id } => reply_with(async {
            let principal = need_principal(principal)?;
            let task = assignment_service::claim_task(pool, principal, &task_id).await?;
            Ok(serde_json::json!({ "task": task }))
        }
        .await),
    }
}
