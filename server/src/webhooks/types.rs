//! Webhook Types
//!
//! Handshake parameters, event payloads, and gateway errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::graph::GraphError;

/// Handshake mode requested by the platform when subscribing.
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Change field for page feed activity.
pub const FEED_FIELD: &str = "feed";

/// Feed item type for comments.
pub const COMMENT_ITEM: &str = "comment";

/// Query parameters of the subscription handshake.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

impl VerifyParams {
    /// Return the challenge to echo if the handshake matches `expected_token`.
    pub fn accepted_challenge(&self, expected_token: &str) -> Option<&str> {
        let subscribing = self.mode.as_deref() == Some(SUBSCRIBE_MODE);
        let token_matches = self.verify_token.as_deref() == Some(expected_token);
        (subscribing && token_matches).then(|| self.challenge.as_deref().unwrap_or_default())
    }
}

/// Event delivery body: a batch of entries.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

/// One entry of a delivery, usually one page.
#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// A single reported change.
#[derive(Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: ChangeValue,
}

/// Value object of a change.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub comment_id: Option<String>,
    #[serde(default)]
    pub verb: Option<String>,
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub from: Option<Author>,
}

/// Author of a feed item.
#[derive(Debug, Default, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Change {
    /// A change qualifies when it is a comment on the page feed.
    pub fn is_feed_comment(&self) -> bool {
        self.field == FEED_FIELD && self.value.item.as_deref() == Some(COMMENT_ITEM)
    }

    /// ID of the account that wrote the item, if reported.
    pub fn author_id(&self) -> Option<&str> {
        self.value.from.as_ref().and_then(|a| a.id.as_deref())
    }
}

impl WebhookPayload {
    /// All changes of the delivery, in payload order.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.entry.iter().flat_map(|entry| entry.changes.iter())
    }
}

/// Webhook gateway errors.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Webhook verification failed")]
    VerificationFailed,
    #[error("Missing or invalid payload signature")]
    InvalidSignature,
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] GraphError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            Self::VerificationFailed | Self::InvalidSignature => StatusCode::FORBIDDEN.into_response(),
            Self::MalformedPayload(e) => {
                tracing::warn!(error = %e, "Rejected malformed webhook payload");
                (StatusCode::BAD_REQUEST, "Malformed webhook payload").into_response()
            }
            Self::Upstream(e) => {
                tracing::error!(error = %e, "Error processing comment");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
