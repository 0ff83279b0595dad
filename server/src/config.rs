//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Default Graph API base URL (versioned).
pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v22.0";

/// Default assistant service URL (us-south region).
pub const DEFAULT_ASSISTANT_URL: &str = "https://api.us-south.assistant.watson.cloud.ibm.com";

/// Default assistant API version date.
pub const DEFAULT_ASSISTANT_VERSION: &str = "2023-05-29";

/// Default IAM token endpoint.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen host (e.g., "0.0.0.0")
    pub bind_host: String,

    /// Listen port (default: 8080)
    pub port: u16,

    /// Page access token for the Graph API
    pub page_access_token: String,

    /// Shared secret echoed by the subscription handshake
    pub verify_token: String,

    /// App secret used to check `X-Hub-Signature-256` (optional)
    pub app_secret: Option<String>,

    /// Page ID whose own comments are never answered (optional)
    pub page_id: Option<String>,

    /// Graph API base URL, including the version segment
    pub graph_api_url: String,

    /// API key for the assistant service
    pub assistant_api_key: String,

    /// Assistant identifier sessions are scoped to
    pub assistant_id: String,

    /// Assistant service base URL
    pub assistant_url: String,

    /// Assistant API version date
    pub assistant_version: String,

    /// IAM token endpoint used to exchange the API key
    pub iam_url: String,

    /// Overall timeout for outbound HTTP requests
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {v:?}"))?,
            Err(_) => 8080,
        };
        let http_timeout_secs: u64 = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("HTTP_TIMEOUT_SECS must be a number, got {v:?}"))?,
            Err(_) => 30,
        };

        Ok(Self {
            bind_host: env::var("BIND_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            page_access_token: env::var("FB_PAGE_ACCESS_TOKEN")
                .context("FB_PAGE_ACCESS_TOKEN must be set")?,
            verify_token: env::var("VERIFY_TOKEN").context("VERIFY_TOKEN must be set")?,
            app_secret: non_empty_var("FB_APP_SECRET"),
            page_id: non_empty_var("FB_PAGE_ID"),
            graph_api_url: env::var("GRAPH_API_URL")
                .unwrap_or_else(|_| DEFAULT_GRAPH_API_URL.into()),
            assistant_api_key: env::var("WATSON_API_KEY").context("WATSON_API_KEY must be set")?,
            assistant_id: env::var("ASSISTANT_ID").context("ASSISTANT_ID must be set")?,
            assistant_url: env::var("ASSISTANT_URL")
                .unwrap_or_else(|_| DEFAULT_ASSISTANT_URL.into()),
            assistant_version: env::var("ASSISTANT_VERSION")
                .unwrap_or_else(|_| DEFAULT_ASSISTANT_VERSION.into()),
            iam_url: env::var("IAM_URL").unwrap_or_else(|_| DEFAULT_IAM_URL.into()),
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    /// Socket address string the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// Check if payload signature verification is enabled.
    #[must_use]
    pub const fn has_app_secret(&self) -> bool {
        self.app_secret.is_some()
    }

    /// Create a default configuration for testing.
    ///
    /// Outbound URLs point at an unroutable local port; tests that exercise the
    /// real clients override them with a stub server address.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_host: "127.0.0.1".into(),
            port: 8080,
            page_access_token: "test-page-token".into(),
            verify_token: "test-verify-token".into(),
            app_secret: None,
            page_id: None,
            graph_api_url: "http://127.0.0.1:9/v22.0".into(),
            assistant_api_key: "test-api-key".into(),
            assistant_id: "test-assistant".into(),
            assistant_url: "http://127.0.0.1:9".into(),
            assistant_version: DEFAULT_ASSISTANT_VERSION.into(),
            iam_url: "http://127.0.0.1:9/identity/token".into(),
            http_timeout: Duration::from_secs(5),
        }
    }
}

/// Read an environment variable, treating empty values as unset.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
