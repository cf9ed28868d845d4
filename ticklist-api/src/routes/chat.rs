/// Chat endpoints for natural-language task entry
///
/// Each turn maps the user's instruction onto at most one task operation via
/// the agent dispatcher and records both sides of the exchange in the
/// transcript tables. The agent runs under the caller's own subject: it sees
/// and touches exactly what the caller could through the REST endpoints.
///
/// # Endpoints
///
/// - `POST /chat` - Send an instruction (optionally continuing a conversation)
/// - `GET /chat/:conversation_id` - Fetch a conversation transcript
use crate::{
    agent,
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticklist_shared::{
    auth::middleware::AuthContext,
    models::{
        conversation::Conversation,
        message::{Message, MessageRole},
    },
};
use uuid::Uuid;

/// Maximum characters of the first message used as the conversation title
const TITLE_PREVIEW_CHARS: usize = 50;

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Free-text instruction
    pub message: String,

    /// Conversation to continue; a new one is created when absent
    pub conversation_id: Option<Uuid>,
}

/// Chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Conversation this turn was recorded in
    pub conversation_id: Uuid,

    /// Assistant reply
    pub reply: String,

    /// Task the turn touched, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
}

/// One transcript entry
#[derive(Debug, Serialize)]
pub struct MessageView {
    /// Author role ("user" or "assistant")
    pub role: String,

    /// Message text
    pub content: String,

    /// When the message was recorded
    pub created_at: DateTime<Utc>,
}

/// Conversation transcript response
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    /// Conversation ID
    pub conversation_id: Uuid,

    /// Conversation title
    pub title: String,

    /// Messages in chronological order
    pub messages: Vec<MessageView>,
}

/// Send an instruction
///
/// Resolves (or creates) the conversation, records the user message,
/// interprets the instruction into at most one tool call, executes it under
/// the caller's subject, and records the assistant reply.
///
/// # Errors
///
/// - `404 Not Found`: `conversation_id` absent or owned by another user
/// - `422 Unprocessable Entity`: Empty message
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let text = req.message.trim();
    if text.is_empty() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "message".to_string(),
            message: "Message must not be empty".to_string(),
        }]));
    }

    let conversation = match req.conversation_id {
        Some(id) => Conversation::find_for_owner(&state.db, id, auth.subject)
            .await?
            .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?,
        None => Conversation::create(&state.db, auth.subject, &title_preview(text)).await?,
    };

    Message::append(&state.db, conversation.id, MessageRole::User, text).await?;

    let outcome = match agent::interpret(text) {
        Some(call) => agent::dispatch(&state.db, auth.subject, call).await?,
        None => agent::ToolOutcome {
            reply: agent::HELP_REPLY.to_string(),
            task_id: None,
        },
    };

    Message::append(
        &state.db,
        conversation.id,
        MessageRole::Assistant,
        &outcome.reply,
    )
    .await?;
    Conversation::touch(&state.db, conversation.id).await?;

    Ok(Json(ChatResponse {
        conversation_id: conversation.id,
        reply: outcome.reply,
        task_id: outcome.task_id,
    }))
}

/// Fetch a conversation transcript
///
/// # Errors
///
/// - `404 Not Found`: Conversation absent or owned by another user
pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(conversation_id): Path<Uuid>,
) -> ApiResult<Json<ConversationResponse>> {
    let conversation = Conversation::find_for_owner(&state.db, conversation_id, auth.subject)
        .await?
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

    let messages = Message::list_for_conversation(&state.db, conversation.id).await?;

    Ok(Json(ConversationResponse {
        conversation_id: conversation.id,
        title: conversation.title,
        messages: messages
            .into_iter()
            .map(|m| MessageView {
                role: m.role.as_str().to_string(),
                content: m.content,
                created_at: m.created_at,
            })
            .collect(),
    }))
}

// First words of the opening message, clipped char-safely.
fn title_preview(message: &str) -> String {
    if message.chars().count() <= TITLE_PREVIEW_CHARS {
        message.to_string()
    } else {
        let clipped: String = message.chars().take(TITLE_PREVIEW_CHARS).collect();
        format!("{}...", clipped.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_preview_short_message_unchanged() {
        assert_eq!(title_preview("add buy milk"), "add buy milk");
    }

    #[test]
    fn test_title_preview_clips_long_message() {
        let long = "a".repeat(80);
        let title = title_preview(&long);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), TITLE_PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_title_preview_is_char_safe() {
        let long = "日".repeat(80);
        let title = title_preview(&long);
        assert!(title.ends_with("..."));
    }
}
