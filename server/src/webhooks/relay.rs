//! Comment Relay Pipeline
//!
//! For each qualifying change: fetch the comment text, ask the assistant for a
//! reply, and post the reply under the comment.
//!
//! Changes are relayed one at a time in payload order. A failed fetch or post
//! stops the batch; replies already posted for earlier changes stay posted.
//! Assistant failures never stop the batch, they turn into [`APOLOGY_REPLY`].

use tracing::{info, instrument, warn};

use super::types::{Change, WebhookPayload};
use crate::assistant::{self, AssistantApi, APOLOGY_REPLY};
use crate::graph::{CommentApi, GraphError};

/// Clients and settings a relay run needs.
#[derive(Clone, Copy)]
pub struct Relay<'a> {
    pub comments: &'a dyn CommentApi,
    pub assistant: &'a dyn AssistantApi,
    /// Comments written by this account are skipped.
    pub page_id: Option<&'a str>,
}

impl Relay<'_> {
    /// Relay every qualifying change of `payload`; returns how many were answered.
    pub async fn process_payload(&self, payload: &WebhookPayload) -> Result<usize, GraphError> {
        let mut relayed = 0;
        for change in payload.changes() {
            let Some(comment_id) = self.comment_to_answer(change) else {
                continue;
            };
            self.relay_comment(comment_id).await?;
            relayed += 1;
        }
        Ok(relayed)
    }

    /// Comment ID to answer for `change`, or `None` when it should be skipped.
    fn comment_to_answer<'c>(&self, change: &'c Change) -> Option<&'c str> {
        if !change.is_feed_comment() {
            return None;
        }
        let Some(comment_id) = change.value.comment_id.as_deref() else {
            warn!(verb = ?change.value.verb, "Comment change without comment_id");
            return None;
        };
        if let (Some(page_id), Some(author_id)) = (self.page_id, change.author_id()) {
            if page_id == author_id {
                info!(comment_id, "Skipping comment written by the page");
                return None;
            }
        }
        Some(comment_id)
    }

    /// Fetch, answer and reply to a single comment.
    #[instrument(skip(self))]
    pub async fn relay_comment(&self, comment_id: &str) -> Result<(), GraphError> {
        let text = self.comments.fetch_comment(comment_id).await?;

        let reply = match assistant::request_reply(self.assistant, &text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Assistant error");
                APOLOGY_REPLY.to_string()
            }
        };

        self.comments.post_reply(comment_id, &reply).await?;
        info!(comment_id, "Replied to comment");
        Ok(())
    }
}
