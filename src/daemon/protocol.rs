//! IPC protocol types and framing for daemon communication.
//!
//! Messages are length-delimited JSON frames:
//! - 4 bytes: message length (big-endian u32)
//! - N bytes: JSON-encoded message
//!
//! Each [`Request`] carries the authenticated principal resolved by the
//! surrounding layer (None for anonymous commands such as the public
//! request form) and one operation; the daemon answers with a matching
//! [`Response`].

use atelier_types::{CreateRequest, CreateTask, Principal};
use serde::{Deserialize, Serialize};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::api::Reply;

/// Maximum message size (16 MB) to prevent memory exhaustion
pub const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

/// Request envelope sent from a client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique request identifier for correlating responses
    pub id: u64,
    /// Authenticated identity; None for anonymous commands
    #[serde(default)]
    pub principal: Option<Principal>,
    /// The operation to perform
    pub op: Operation,
}

impl Request {
    pub fn new(id: u64, principal: Option<Principal>, op: Operation) -> Self {
        Self { id, principal, op }
    }
}

/// Response envelope sent from the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID this response corresponds to
    pub id: u64,
    /// Whether the operation succeeded
    pub ok: bool,
    /// HTTP-style status carried alongside the body
    pub status: u16,
    /// Response body (operation-specific data)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Stable error code if ok is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok_empty(id: u64) -> Self {
        Self {
            id,
            ok: true,
            status: 200,
            body: None,
            error: None,
        }
    }

    /// Translate a dispatcher reply into the wire envelope. The error code
    /// is lifted out of the body so clients can branch without parsing it.
    pub fn from_reply(id: u64, reply: Reply) -> Self {
        let ok = reply.is_ok();
        let error = if ok {
            None
        } else {
            reply
                .body
                .get("error")
                .and_then(serde_json::Value::as_str)
                .map(|code| code.to_string())
        };
        Self {
            id,
            ok,
            status: reply.status,
            body: Some(reply.body),
            error,
        }
    }
}

/// Operations supported by the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Operation {
    /// Check if the daemon is alive
    Ping,
    /// Request daemon shutdown
    Shutdown,

    // Request lifecycle
    /// Submit a new client request (anonymous or client-authenticated)
    SubmitRequest(CreateRequest),
    /// List requests: all for managers, own for clients
    ListRequests,
    /// Request detail read model (summary, checkpoints, chat)
    RequestDetail { request_id: String },
    /// Move a request into discussion
    RequestToDiscuss { request_id: String },
    /// Accept a request into work, creating its project
    RequestToWork { request_id: String },
    /// Close a request
    RequestClose { request_id: String },
    /// Request checkpoint command (`{"action": ...}` body)
    RequestCheckpoints { request_id: String, body: String },
    /// Append a chat message under a request
    RequestChatAdd { request_id: String, body: String },

    // Projects and the board
    /// List projects
    ListProjects { include_archived: bool },
    /// Archive or unarchive a project
    SetProjectArchived { project_id: String, archived: bool },
    /// Kanban board read model for a project
    Board { project_id: String },

    // Tasks
    /// Create a task on a project board
    CreateTask {
        project_id: String,
        input: CreateTask,
    },
    /// Kanban move command (`{"id", "status"}` body)
    KanbanMove { body: String },
    /// Task panel command (`{"action": ...}` body, defaults to detail)
    TaskPanel { task_id: String, body: String },

    // Assignment
    /// Claimable tasks for the acting developer
    OpenTasks,
    /// Claim a task
    ClaimTask { task_id: String },
}

/// Write a length-delimited frame to an async writer.
///
/// # Errors
///
/// Returns an error if the data exceeds MAX_MESSAGE_SIZE or if writing
/// fails.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    if data.len() > MAX_MESSAGE_SIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "message too large: {} bytes (max {})",
                data.len(),
                MAX_MESSAGE_SIZE
            ),
        ));
    }

    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a length-delimited frame from an async reader.
///
/// # Errors
///
/// Returns an error on EOF, on an oversized length header, or when
/// reading fails.
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message too large: {} bytes (max {})", len, MAX_MESSAGE_SIZE),
        ));
    }

    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Serialize and write a request.
pub async fn write_request<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    request: &Request,
) -> io::Result<()> {
    let json =
        serde_json::to_vec(request).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_frame(writer, &json).await
}

/// Read and deserialize a request.
pub async fn read_request<R: AsyncReadExt + Unpin>(reader: &mut R) -> io::Result<Request> {
    let data = read_frame(reader).await?;
    serde_json::from_slice(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Serialize and write a response.
pub async fn write_response<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
) -> io::Result<()> {
    let json =
        serde_json::to_vec(response).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_frame(writer, &json).await
}

/// Read and deserialize a response.
pub async fn read_response<R: AsyncReadExt + Unpin>(reader: &mut R) -> io::Result<Response> {
    let data = read_frame(reader).await?;
    serde_json::from_slice(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
