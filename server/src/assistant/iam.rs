//! IAM bearer tokens for the assistant service.
//!
//! The API key is exchanged for a short-lived access token which is cached and
//! shared by all requests until it is about to expire.

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::AssistantError;

/// Grant type for API key exchange.
const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Refresh tokens this many seconds before they expire.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Absolute expiry as Unix seconds.
    #[serde(default)]
    expiration: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    const fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - REFRESH_MARGIN_SECS > now
    }
}

/// Exchanges an API key for bearer tokens and caches them.
pub struct IamTokenManager {
    http: reqwest::Client,
    url: String,
    api_key: String,
    cached: RwLock<Option<CachedToken>>,
}

impl IamTokenManager {
    /// Create a token manager for `api_key` against the token endpoint `url`.
    pub fn new(http: reqwest::Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key: api_key.into(),
            cached: RwLock::new(None),
        }
    }

    /// Return a valid access token, requesting a new one when needed.
    pub async fn token(&self) -> Result<String, AssistantError> {
        let now = Utc::now().timestamp();
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn request_token(&self) -> Result<CachedToken, AssistantError> {
        let resp = self
            .http
            .post(&self.url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", APIKEY_GRANT_TYPE),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AssistantError::Token {
                status: status.as_u16(),
                message: crate::util::body_preview(&body),
            });
        }

        let body: TokenResponse = resp.json().await?;
        let now = Utc::now().timestamp();
        let expires_at = body
            .expiration
            .or_else(|| body.expires_in.map(|secs| now + secs))
            .unwrap_or(now);
        debug!(expires_in = expires_at - now, "IAM token refreshed");

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at,
        })
    }
}
