//! Conversational Assistant
//!
//! Session/message exchange with the assistant service and the rules for
//! turning its output into a reply.
//!
//! Each comment gets its own session: one session is created, exactly one
//! message is sent on it, and the session is then abandoned (the service
//! expires idle sessions on its own).

mod iam;
mod watson;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use iam::IamTokenManager;
pub use watson::WatsonAssistant;

/// Reply used when the assistant answers without any text.
pub const FALLBACK_REPLY: &str = "I didn't understand that";

/// Reply used when the assistant exchange fails.
pub const APOLOGY_REPLY: &str = "Sorry, I'm having trouble understanding.";

/// Operations the relay needs from the assistant service.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Open a new session and return its identifier.
    async fn create_session(&self) -> Result<String, AssistantError>;

    /// Send a single text message on `session_id`.
    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<MessageResponse, AssistantError>;
}

/// Assistant errors.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Assistant request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Assistant API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("IAM token request returned {status}: {message}")]
    Token { status: u16, message: String },
    #[error("Invalid assistant URL: {0}")]
    InvalidUrl(String),
    #[error("Unexpected assistant response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Message request body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest<'a> {
    pub input: MessageInput<'a>,
}

/// User input of a message request.
#[derive(Debug, Clone, Serialize)]
pub struct MessageInput<'a> {
    pub message_type: &'static str,
    pub text: &'a str,
}

impl<'a> MessageRequest<'a> {
    /// Build a plain text message.
    pub const fn text(text: &'a str) -> Self {
        Self {
            input: MessageInput {
                message_type: "text",
                text,
            },
        }
    }
}

/// Message response (only the parts the relay reads).
///
/// `output.generic` must be present; a response without it is an error, not
/// an empty answer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    pub output: MessageOutput,
}

/// Assistant output of a message response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageOutput {
    pub generic: Vec<GenericItem>,
}

/// One generic output item (text, option, image, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenericItem {
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageResponse {
    /// Text of the first generic output item, if it has any.
    ///
    /// Only the first item is considered; later items are ignored even when
    /// the first one carries no text.
    pub fn first_text(&self) -> Option<&str> {
        self.output
            .generic
            .first()
            .and_then(|item| item.text.as_deref())
            .filter(|text| !text.is_empty())
    }

    /// The reply to post: the first text, or [`FALLBACK_REPLY`].
    pub fn reply_text(&self) -> String {
        self.first_text().unwrap_or(FALLBACK_REPLY).to_string()
    }
}

/// Ask the assistant for a reply to `text` in a fresh session.
pub async fn request_reply(
    assistant: &dyn AssistantApi,
    text: &str,
) -> Result<String, AssistantError> {
    let session_id = assistant.create_session().await?;
    debug!(session_id = %session_id, "Assistant session created");

    let response = assistant.send_message(&session_id, text).await?;
    Ok(response.reply_text())
}
