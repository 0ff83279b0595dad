//! Webhook API Handlers
//!
//! Subscription handshake and event ingestion.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use super::relay::Relay;
use super::signing::{self, SIGNATURE_HEADER};
use super::types::{VerifyParams, WebhookError, WebhookPayload};
use crate::api::AppState;

/// GET /webhook
#[instrument(skip_all)]
pub async fn verify_subscription(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, WebhookError> {
    match params.accepted_challenge(&state.config.verify_token) {
        Some(challenge) => {
            info!("Webhook verified successfully");
            Ok(challenge.to_string())
        }
        None => {
            warn!(mode = ?params.mode, "Webhook verification failed");
            Err(WebhookError::VerificationFailed)
        }
    }
}

/// POST /webhook
#[instrument(skip_all, fields(body_len = body.len()))]
pub async fn receive_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    if let Some(secret) = state.config.app_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !signing::verify_signature(secret, &body, signature) {
            warn!("Rejected delivery with bad signature");
            return Err(WebhookError::InvalidSignature);
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)?;

    let relay = Relay {
        comments: state.comments.as_ref(),
        assistant: state.assistant.as_ref(),
        page_id: state.config.page_id.as_deref(),
    };
    let relayed = relay.process_payload(&payload).await?;

    info!(
        entries = payload.entry.len(),
        relayed, "Webhook delivery processed"
    );
    Ok(StatusCode::OK)
}
