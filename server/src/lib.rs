//! Comment Relay Server
//!
//! Answers page comments through a conversational assistant: the platform
//! delivers feed changes by webhook, the comment text is sent to the
//! assistant, and the assistant's reply is posted under the comment.

pub mod api;
pub mod assistant;
pub mod config;
pub mod graph;
pub mod util;
pub mod webhooks;
