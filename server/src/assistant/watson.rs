//! Assistant v2 HTTP client.

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Deserialize;
use tracing::instrument;

use super::{AssistantApi, AssistantError, IamTokenManager, MessageRequest, MessageResponse};
use crate::config::Config;
use crate::util::{body_preview, join_url};

/// Session creation response.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_id: String,
}

/// Error body returned by the assistant service.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Assistant v2 client scoped to one assistant.
pub struct WatsonAssistant {
    http: reqwest::Client,
    base_url: String,
    assistant_id: String,
    version: String,
    iam: IamTokenManager,
}

impl WatsonAssistant {
    /// Create a client for `assistant_id` authenticated through `iam`.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        assistant_id: impl Into<String>,
        version: impl Into<String>,
        iam: IamTokenManager,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            assistant_id: assistant_id.into(),
            version: version.into(),
            iam,
        }
    }

    /// Create a client from server configuration.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        let iam = IamTokenManager::new(http.clone(), &config.iam_url, &config.assistant_api_key);
        Self::new(
            http,
            &config.assistant_url,
            &config.assistant_id,
            &config.assistant_version,
            iam,
        )
    }

    fn sessions_url(&self, rest: &[&str]) -> Result<Url, AssistantError> {
        let mut segments = vec!["v2", "assistants", self.assistant_id.as_str(), "sessions"];
        segments.extend_from_slice(rest);
        join_url(&self.base_url, &segments).map_err(AssistantError::InvalidUrl)
    }
}

/// Turn a non-success response into an [`AssistantError::Api`].
async fn check_status(resp: Response) -> Result<Response, AssistantError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body_preview(&body));
    Err(AssistantError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl AssistantApi for WatsonAssistant {
    #[instrument(skip(self), fields(assistant_id = %self.assistant_id))]
    async fn create_session(&self) -> Result<String, AssistantError> {
        let url = self.sessions_url(&[])?;
        let token = self.iam.token().await?;
        let resp = self
            .http
            .post(url)
            .query(&[("version", self.version.as_str())])
            .bearer_auth(token)
            .send()
            .await?;

        let session: SessionResponse = check_status(resp).await?.json().await?;
        Ok(session.session_id)
    }

    #[instrument(skip(self, text), fields(assistant_id = %self.assistant_id))]
    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<MessageResponse, AssistantError> {
        let url = self.sessions_url(&[session_id, "message"])?;
        let token = self.iam.token().await?;
        let resp = self
            .http
            .post(url)
            .query(&[("version", self.version.as_str())])
            .bearer_auth(token)
            .json(&MessageRequest::text(text))
            .send()
            .await?;

        let body = check_status(resp).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
