//! API Router and Application State
//!
//! Central routing configuration and shared state.

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    assistant::{AssistantApi, WatsonAssistant},
    config::Config,
    graph::{CommentApi, GraphClient},
    webhooks,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Content API client (comment fetch and reply)
    pub comments: Arc<dyn CommentApi>,
    /// Conversational assistant client
    pub assistant: Arc<dyn AssistantApi>,
}

impl AppState {
    /// Create new application state from explicit clients.
    #[must_use]
    pub fn new(
        config: Config,
        comments: Arc<dyn CommentApi>,
        assistant: Arc<dyn AssistantApi>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            comments,
            assistant,
        }
    }

    /// Create application state with the HTTP clients described by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed to build HTTP client")?;

        let comments = Arc::new(GraphClient::from_config(http.clone(), &config));
        let assistant = Arc::new(WatsonAssistant::from_config(http, &config));
        Ok(Self::new(config, comments, assistant))
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Page webhook
        .merge(webhooks::router())
        // Middleware
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether deliveries must carry a valid signature
    signature_required: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        signature_required: state.config.has_app_secret(),
    })
}
