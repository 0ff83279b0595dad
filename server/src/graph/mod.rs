//! Graph API (Content API)
//!
//! Reads comment text and posts replies on behalf of the page.

mod client;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use client::GraphClient;

/// Comment operations the relay needs from the content API.
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// Fetch the text body of a comment.
    ///
    /// Comments without text (sticker or photo only) yield an empty string.
    async fn fetch_comment(&self, comment_id: &str) -> Result<String, GraphError>;

    /// Post `message` as a reply attached to `comment_id`.
    async fn post_reply(&self, comment_id: &str, message: &str) -> Result<(), GraphError>;
}

/// Graph API errors.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Graph API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid Graph URL: {0}")]
    InvalidUrl(String),
}

/// Error envelope returned by the Graph API on failure.
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

impl GraphError {
    /// Build an API error from a non-success status and the raw response body.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<GraphErrorEnvelope>(body) {
            Ok(envelope) => match envelope.error.code {
                Some(code) => format!("{} (code {code})", envelope.error.message),
                None => envelope.error.message,
            },
            Err(_) => crate::util::body_preview(body),
        };
        Self::Api { status, message }
    }
}
