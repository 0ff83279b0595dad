//! Graph API HTTP client.

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{CommentApi, GraphError};
use crate::config::Config;
use crate::util::join_url;

/// Comment resource as returned with `fields=message`.
#[derive(Debug, Deserialize)]
struct CommentResource {
    #[serde(default)]
    message: Option<String>,
}

/// Response to creating a reply comment.
#[derive(Debug, Deserialize)]
struct CreatedComment {
    #[serde(default)]
    id: Option<String>,
}

/// Content API client authenticated with a page access token.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GraphClient {
    /// Create a client against `base_url` (including the version segment).
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Create a client from server configuration.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(http, &config.graph_api_url, &config.page_access_token)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GraphError> {
        join_url(&self.base_url, segments).map_err(GraphError::InvalidUrl)
    }
}

/// Turn a non-success response into a [`GraphError::Api`].
async fn check_status(resp: Response) -> Result<Response, GraphError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GraphError::from_response(status.as_u16(), &body))
}

#[async_trait]
impl CommentApi for GraphClient {
    #[instrument(skip(self))]
    async fn fetch_comment(&self, comment_id: &str) -> Result<String, GraphError> {
        let url = self.endpoint(&[comment_id])?;
        let resp = self
            .http
            .get(url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("fields", "message"),
            ])
            .send()
            .await?;

        let comment: CommentResource = check_status(resp).await?.json().await?;
        if comment.message.is_none() {
            debug!(comment_id, "Comment has no text body");
        }
        Ok(comment.message.unwrap_or_default())
    }

    #[instrument(skip(self, message), fields(message_len = message.len()))]
    async fn post_reply(&self, comment_id: &str, message: &str) -> Result<(), GraphError> {
        let url = self.endpoint(&[comment_id, "comments"])?;
        let resp = self
            .http
            .post(url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("message", message),
            ])
            .send()
            .await?;

        // The reply is already posted once the status is 2xx; the body only
        // feeds the log line.
        let created = check_status(resp).await?.json::<CreatedComment>().await.ok();
        debug!(comment_id, reply_id = ?created.and_then(|c| c.id), "Reply posted");
        Ok(())
    }
}
