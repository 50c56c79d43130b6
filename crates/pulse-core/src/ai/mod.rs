//! Calls to the external reasoning service and the parsing of its free-text
//! replies into typed payloads.

pub mod client;
pub mod extract;
pub mod facade;
pub mod fallback;
pub mod prompts;
pub mod schema;

use crate::error::AiError;
use async_trait::async_trait;

pub use client::HttpReasoningClient;
pub use extract::extract_json;
pub use facade::{AiFacade, Insight};

/// Prompt in, free text out. No streaming.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}
