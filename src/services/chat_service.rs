use atelier_types::{ChatMessage, Comment, ParentType, Principal, generate_comment_id};
use sqlx::SqlitePool;

use crate::db::{
    self, counters,
    events::{CreateEvent, EntityType, EventType},
};
use crate::error::{AtelierError, Result};

/// How far back a chat read reaches: the most recent messages up to this
/// count, returned oldest-first.
pub const RECENT_CHAT_LIMIT: i64 = 50;

/// Post a chat message under a request or task. Callers have already
/// resolved the parent and checked the author may see it.
pub async fn post_message(
    pool: &SqlitePool,
    parent_type: ParentType,
    parent_id: &str,
    author: Option<&Principal>,
    text: &str,
) -> Result<Comment> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AtelierError::TextRequired);
    }

    let counter_scope = format!("{}:msg", parent_id);
    let number = counters::next(pool, &counter_scope).await?;
    let id = generate_comment_id(parent_id, number);

    let comment = Comment {
        id: id.clone(),
        parent_type: parent_type.as_str().to_string(),
        parent_id: parent_id.to_string(),
        comment_number: number,
        author_id: author.map(|p| p.user_id.clone()),
        text: text.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    db::comments::create(pool, &comment).await?;

    db::events::create(
        pool,
        &CreateEvent {
            event_type: EventType::MessagePosted,
            entity_type: EntityType::Comment,
            entity_id: id,
            actor: author.map(|p| p.user_id.clone()),
            payload: serde_json::json!({
                "parent_type": parent_type.as_str(),
                "parent_id": parent_id,
            }),
        },
    )
    .await?;

    Ok(comment)
}

/// The recent chat window for a parent: at most [`RECENT_CHAT_LIMIT`]
/// messages, oldest-first, with author usernames resolved (anonymous
/// messages carry no author).
pub async fn recent_chat(
    pool: &SqlitePool,
    parent_type: ParentType,
    parent_id: &str,
) -> Result<Vec<ChatMessage>> {
    db::comments::recent(pool, parent_type, parent_id, RECENT_CHAT_LIMIT).await
}
