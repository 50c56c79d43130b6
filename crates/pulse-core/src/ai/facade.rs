use crate::ai::client::HttpReasoningClient;
use crate::ai::fallback::{fallback_analysis, fallback_strategy};
use crate::ai::prompts::{chat_prompt, event_analysis_prompt, strategy_prompt};
use crate::ai::schema::{parse_event_analysis, parse_strategy};
use crate::ai::ReasoningService;
use crate::config::AiConfig;
use crate::error::AiError;
use crate::snapshot::Snapshot;
use crate::types::{ChatMessage, Event, EventAnalysisReport, MyEvent, SponsorshipStrategy};
use std::sync::Arc;
use tracing::{info, warn};

/// A generated payload, or the local fallback together with the failure
/// that caused the substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct Insight<T> {
    pub value: T,
    pub failure: Option<AiError>,
}

impl<T> Insight<T> {
    pub fn is_fallback(&self) -> bool {
        self.failure.is_some()
    }

    /// User-facing notice when a fallback was substituted. Rate limiting
    /// gets its own wording.
    pub fn notice(&self) -> Option<&'static str> {
        self.failure.as_ref().map(AiError::user_notice)
    }
}

#[derive(Clone, Default)]
pub struct AiFacade {
    service: Option<Arc<dyn ReasoningService>>,
}

impl AiFacade {
    pub fn new(service: Option<Arc<dyn ReasoningService>>) -> Self {
        Self { service }
    }

    pub fn from_config(config: &AiConfig) -> Self {
        let service = HttpReasoningClient::from_config(config)
            .map(|client| Arc::new(client) as Arc<dyn ReasoningService>);
        Self { service }
    }

    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    async fn call(&self, prompt: &str) -> Result<String, AiError> {
        let service = self.service.as_ref().ok_or(AiError::Unconfigured)?;
        service.complete(prompt).await
    }

    pub async fn analyze_event(
        &self,
        snapshot: &Snapshot,
        event: &Event,
    ) -> Result<EventAnalysisReport, AiError> {
        let reply = self.call(&event_analysis_prompt(snapshot, event)).await?;
        parse_event_analysis(&reply)
    }

    pub async fn generate_strategy(
        &self,
        snapshot: &Snapshot,
        draft: &MyEvent,
    ) -> Result<SponsorshipStrategy, AiError> {
        let reply = self.call(&strategy_prompt(snapshot, draft)).await?;
        parse_strategy(&reply, &snapshot.sponsors)
    }

    pub async fn chat_reply(
        &self,
        snapshot: &Snapshot,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String, AiError> {
        let reply = self.call(&chat_prompt(snapshot, history, message)).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(AiError::Schema {
                message: "empty chat reply".to_string(),
            });
        }
        Ok(reply.to_string())
    }

    pub async fn analyze_event_or_fallback(
        &self,
        snapshot: &Snapshot,
        event: &Event,
    ) -> Insight<EventAnalysisReport> {
        match self.analyze_event(snapshot, event).await {
            Ok(value) => {
                info!(event_id = %event.id, score = value.score, "event analysis generated");
                Insight {
                    value,
                    failure: None,
                }
            }
            Err(err) => {
                warn!(event_id = %event.id, error = %err, "event analysis failed, using fallback");
                Insight {
                    value: fallback_analysis(snapshot, event),
                    failure: Some(err),
                }
            }
        }
    }

    pub async fn strategy_or_fallback(
        &self,
        snapshot: &Snapshot,
        draft: &MyEvent,
    ) -> Insight<SponsorshipStrategy> {
        match self.generate_strategy(snapshot, draft).await {
            Ok(value) => {
                info!(
                    draft_id = %draft.id,
                    matches = value.sponsor_matches.len(),
                    "sponsorship strategy generated"
                );
                Insight {
                    value,
                    failure: None,
                }
            }
            Err(err) => {
                warn!(draft_id = %draft.id, error = %err, "strategy generation failed, using fallback");
                Insight {
                    value: fallback_strategy(snapshot, draft),
                    failure: Some(err),
                }
            }
        }
    }
}
