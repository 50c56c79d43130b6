//! Conversational assistant state.
//!
//! A session is either idle or awaiting one reply. Each send is tagged with
//! the session epoch; `clear` bumps the epoch, so a reply that lands after a
//! clear no longer matches and is dropped instead of reviving the old
//! conversation.

use crate::ai::AiFacade;
use crate::analytics::{rank_gaps, summarize_gaps};
use crate::error::{AiError, ChatError};
use crate::snapshot::Snapshot;
use crate::types::{ChatMessage, ChatMessageId, ChatRole, EventStatus};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::cmp::Ordering;
use std::fmt::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub const WELCOME_MESSAGE: &str = "Hi! I can answer questions about events, sponsors, market gaps and budgets. Ask away, or type \"help\".";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    AwaitingReply,
}

/// Token for a reply that is being produced.
#[derive(Debug, Clone)]
pub struct PendingReply {
    epoch: u64,
    pub message: String,
    /// Transcript before the user's message.
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    phase: ChatPhase,
    epoch: u64,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        let mut session = Self {
            transcript: Vec::new(),
            phase: ChatPhase::Idle,
            epoch: 0,
        };
        session.push(ChatRole::Assistant, WELCOME_MESSAGE.to_string());
        session
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    /// Appends the user's message and moves to awaiting-reply.
    pub fn begin(&mut self, message: &str) -> Result<PendingReply, ChatError> {
        if self.phase == ChatPhase::AwaitingReply {
            return Err(ChatError::Busy);
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let history = self.transcript.clone();
        self.push(ChatRole::User, message.to_string());
        self.phase = ChatPhase::AwaitingReply;
        Ok(PendingReply {
            epoch: self.epoch,
            message: message.to_string(),
            history,
        })
    }

    /// Appends the reply and returns to idle. Returns `None` when the
    /// session was cleared since `pending` was issued.
    pub fn complete(&mut self, pending: &PendingReply, reply: String) -> Option<ChatMessage> {
        if pending.epoch != self.epoch {
            debug!(stale_epoch = pending.epoch, epoch = self.epoch, "discarding stale chat reply");
            return None;
        }
        self.phase = ChatPhase::Idle;
        Some(self.push(ChatRole::Assistant, reply).clone())
    }

    /// Returns to idle when the reply for `pending` will never arrive. The
    /// user's message stays in the transcript unanswered.
    pub fn abandon(&mut self, pending: &PendingReply) {
        if pending.epoch == self.epoch && self.phase == ChatPhase::AwaitingReply {
            debug!(epoch = self.epoch, "chat reply abandoned");
            self.phase = ChatPhase::Idle;
        }
    }

    /// Resets to the welcome message. Legal in either phase.
    pub fn clear(&mut self) {
        self.epoch += 1;
        self.transcript.clear();
        self.phase = ChatPhase::Idle;
        self.push(ChatRole::Assistant, WELCOME_MESSAGE.to_string());
    }

    fn push(&mut self, role: ChatRole, content: String) -> &ChatMessage {
        let at = self.next_timestamp();
        self.transcript.push(ChatMessage {
            id: ChatMessageId::generate(),
            role,
            content,
            at,
        });
        &self.transcript[self.transcript.len() - 1]
    }

    /// Wall clock, nudged forward so timestamps never repeat or go back.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.transcript.last() {
            Some(last) if now <= last.at => last.at + TimeDelta::microseconds(1),
            _ => now,
        }
    }
}

/// Produces the assistant's reply. Never fails; implementations fall back
/// to local rules.
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&self, snapshot: &Snapshot, history: &[ChatMessage], message: &str) -> String;
}

/// Keyword rules over the current snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleResponder;

impl RuleResponder {
    pub fn reply(snapshot: &Snapshot, message: &str) -> String {
        let lowered = message.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|word| lowered.contains(word));
        if mentions(&["help", "what can you"]) {
            help_reply()
        } else if mentions(&["sponsor", "brand", "partner"]) {
            sponsor_reply(snapshot)
        } else if mentions(&["gap", "opportunit", "market"]) {
            gap_reply(snapshot)
        } else if mentions(&["budget", "cost", "price", "deal"]) {
            budget_reply(snapshot)
        } else if mentions(&["event", "festival", "concert", "upcoming"]) {
            event_reply(snapshot)
        } else {
            "I don't have an answer for that offline. Try asking about sponsors, market gaps, budgets or upcoming events."
                .to_string()
        }
    }
}

#[async_trait]
impl ChatResponder for RuleResponder {
    async fn respond(&self, snapshot: &Snapshot, _history: &[ChatMessage], message: &str) -> String {
        Self::reply(snapshot, message)
    }
}

fn help_reply() -> String {
    [
        "I can help with:",
        "- sponsors: who has the strongest return history",
        "- market gaps: the most promising unmet needs",
        "- budgets: typical deal sizes across tracked events",
        "- events: what is coming up next",
    ]
    .join("\n")
}

fn sponsor_reply(snapshot: &Snapshot) -> String {
    if snapshot.sponsors.is_empty() {
        return "No sponsors are tracked yet.".to_string();
    }
    let mut sponsors: Vec<_> = snapshot.sponsors.iter().collect();
    sponsors.sort_by(|a, b| b.average_roi.total_cmp(&a.average_roi));
    let mut out = String::from("Sponsors with the strongest return history:\n");
    for sponsor in sponsors.into_iter().take(3) {
        let _ = writeln!(
            out,
            "- {} ({}): average ROI {:.1}x across {} events",
            sponsor.name,
            sponsor.industry,
            sponsor.average_roi,
            sponsor.events_sponsored.len()
        );
    }
    out.trim_end().to_string()
}

fn gap_reply(snapshot: &Snapshot) -> String {
    let ranked = rank_gaps(&snapshot.market_gaps);
    if ranked.is_empty() {
        return "No market gaps are recorded yet.".to_string();
    }
    let summary = summarize_gaps(&snapshot.market_gaps);
    let mut out = format!(
        "{} gaps tracked, {} high severity and {} high opportunity. Top picks:\n",
        summary.total, summary.high_severity, summary.high_opportunity
    );
    for gap in ranked.into_iter().take(3) {
        let _ = writeln!(
            out,
            "- {} (severity {}, opportunity {})",
            gap.title, gap.severity, gap.opportunity
        );
    }
    out.trim_end().to_string()
}

fn budget_reply(snapshot: &Snapshot) -> String {
    let deals: Vec<f64> = snapshot
        .events
        .iter()
        .flat_map(|event| event.sponsors.iter().map(|a| a.deal_amount))
        .filter(|amount| *amount > 0.0)
        .collect();
    if deals.is_empty() {
        return "No sponsorship deals are recorded yet.".to_string();
    }
    let total: f64 = deals.iter().sum();
    #[allow(clippy::cast_precision_loss)]
    let average = total / deals.len() as f64;
    let largest = deals.iter().copied().fold(0.0, f64::max);
    format!(
        "Across {} recorded deals the average is {average:.0} and the largest is {largest:.0}. Total committed: {total:.0}.",
        deals.len()
    )
}

fn event_reply(snapshot: &Snapshot) -> String {
    let mut upcoming: Vec<_> = snapshot
        .events
        .iter()
        .filter(|event| event.status == EventStatus::Upcoming)
        .collect();
    if upcoming.is_empty() {
        return format!(
            "{} events are tracked and none are upcoming.",
            snapshot.events.len()
        );
    }
    upcoming.sort_by(|a, b| match (a.date, b.date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    let next = upcoming[0];
    let when = next
        .date
        .map_or_else(|| "date to be confirmed".to_string(), |date| date.to_string());
    format!(
        "{} of {} tracked events are upcoming. Next: {} in {} ({when}).",
        upcoming.len(),
        snapshot.events.len(),
        next.name,
        next.location
    )
}

/// Tries the reasoning service, then the local rules.
pub struct AssistantResponder {
    facade: AiFacade,
}

impl AssistantResponder {
    pub fn new(facade: AiFacade) -> Self {
        Self { facade }
    }
}

#[async_trait]
impl ChatResponder for AssistantResponder {
    async fn respond(&self, snapshot: &Snapshot, history: &[ChatMessage], message: &str) -> String {
        match self.facade.chat_reply(snapshot, history, message).await {
            Ok(reply) => reply,
            Err(AiError::Unconfigured) => RuleResponder::reply(snapshot, message),
            Err(err) => {
                warn!(error = %err, "chat reply failed, answering from local rules");
                let fallback = RuleResponder::reply(snapshot, message);
                if err.is_rate_limited() {
                    format!("({}) {fallback}", err.user_notice())
                } else {
                    fallback
                }
            }
        }
    }
}

/// Session shared between the input side and the reply task. The lock is
/// never held across an await.
pub struct ChatManager {
    session: Mutex<ChatSession>,
    responder: Arc<dyn ChatResponder>,
}

/// Abandons the pending reply if `send` is dropped before it completes.
struct InFlight<'a> {
    session: &'a Mutex<ChatSession>,
    pending: Option<&'a PendingReply>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            lock(self.session).abandon(pending);
        }
    }
}

fn lock(session: &Mutex<ChatSession>) -> MutexGuard<'_, ChatSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatManager {
    pub fn new(responder: Arc<dyn ChatResponder>) -> Self {
        Self {
            session: Mutex::new(ChatSession::new()),
            responder,
        }
    }

    /// Sends one message and waits for the reply. `Ok(None)` means the
    /// session was cleared while the reply was pending. Dropping the future
    /// early returns the session to idle.
    pub async fn send(
        &self,
        snapshot: &Snapshot,
        message: &str,
    ) -> Result<Option<ChatMessage>, ChatError> {
        let pending = lock(&self.session).begin(message)?;
        let mut in_flight = InFlight {
            session: &self.session,
            pending: Some(&pending),
        };
        let reply = self
            .responder
            .respond(snapshot, &pending.history, &pending.message)
            .await;
        in_flight.pending = None;
        drop(in_flight);
        Ok(lock(&self.session).complete(&pending, reply))
    }

    pub fn clear(&self) {
        lock(&self.session).clear();
    }

    pub fn phase(&self) -> ChatPhase {
        lock(&self.session).phase()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        lock(&self.session).transcript().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::facade::tests::ScriptedService;
    use crate::fixtures::FixtureDataset;
    use crate::snapshot::FallbackReason;
    use tokio::sync::Notify;

    fn snapshot() -> Snapshot {
        FixtureDataset::bundled().snapshot(FallbackReason::Unconfigured, 1)
    }

    #[test]
    fn new_session_holds_only_the_welcome_message() {
        let session = ChatSession::new();
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].content, WELCOME_MESSAGE);
        assert_eq!(session.phase(), ChatPhase::Idle);
    }

    #[test]
    fn send_while_awaiting_is_rejected() {
        let mut session = ChatSession::new();
        let pending = session.begin("Which sponsors fit music?").unwrap();
        assert_eq!(session.phase(), ChatPhase::AwaitingReply);
        assert_eq!(session.begin("hello?").unwrap_err(), ChatError::Busy);
        assert_eq!(session.transcript().len(), 2);

        session.complete(&pending, "Nusantara Telco".to_string()).unwrap();
        assert_eq!(session.phase(), ChatPhase::Idle);
        assert_eq!(session.transcript().len(), 3);
    }

    #[test]
    fn blank_message_is_rejected() {
        let mut session = ChatSession::new();
        assert_eq!(session.begin("   ").unwrap_err(), ChatError::EmptyMessage);
        assert_eq!(session.phase(), ChatPhase::Idle);
    }

    #[test]
    fn clear_discards_the_pending_reply() {
        let mut session = ChatSession::new();
        let pending = session.begin("tell me about gaps").unwrap();
        session.clear();
        assert_eq!(session.phase(), ChatPhase::Idle);
        assert!(session.complete(&pending, "late".to_string()).is_none());
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].content, WELCOME_MESSAGE);
    }

    #[test]
    fn timestamps_are_strictly_increasing() {
        let mut session = ChatSession::new();
        for n in 0..20 {
            let pending = session.begin(&format!("message {n}")).unwrap();
            session.complete(&pending, "ok".to_string());
        }
        let stamps: Vec<_> = session.transcript().iter().map(|m| m.at).collect();
        assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn rules_answer_from_the_snapshot() {
        let snapshot = snapshot();
        let sponsors = RuleResponder::reply(&snapshot, "Which sponsors should I approach?");
        assert!(sponsors.starts_with("Sponsors with the strongest return history"));
        assert!(sponsors.contains("Lumbung Tech"));

        let gaps = RuleResponder::reply(&snapshot, "Any market gaps worth chasing?");
        assert!(gaps.contains("No large-scale music events in Eastern Indonesia"));

        let events = RuleResponder::reply(&snapshot, "what events are upcoming");
        assert!(events.contains("3 of 6"));
        assert!(events.contains("Next: Surabaya Auto Expo"));

        assert!(RuleResponder::reply(&snapshot, "help").contains("I can help with"));
    }

    /// Holds every reply until released.
    struct GatedResponder {
        release: Notify,
    }

    #[async_trait]
    impl ChatResponder for GatedResponder {
        async fn respond(&self, _: &Snapshot, _: &[ChatMessage], _: &str) -> String {
            self.release.notified().await;
            "stale answer".to_string()
        }
    }

    #[tokio::test]
    async fn reply_after_clear_is_dropped() {
        let responder = Arc::new(GatedResponder {
            release: Notify::new(),
        });
        let manager = Arc::new(ChatManager::new(responder.clone()));
        let task = {
            let manager = Arc::clone(&manager);
            let snapshot = snapshot();
            tokio::spawn(async move { manager.send(&snapshot, "anything new?").await })
        };
        while manager.phase() != ChatPhase::AwaitingReply {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            manager.send(&snapshot(), "again").await.unwrap_err(),
            ChatError::Busy
        );

        manager.clear();
        responder.release.notify_one();
        assert_eq!(task.await.unwrap(), Ok(None));
        let transcript = manager.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].content, WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn dropped_send_returns_the_session_to_idle() {
        let responder = Arc::new(GatedResponder {
            release: Notify::new(),
        });
        let manager = ChatManager::new(responder);
        let snapshot = snapshot();

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            manager.send(&snapshot, "anything new?"),
        )
        .await;
        assert!(timed_out.is_err());

        assert_eq!(manager.phase(), ChatPhase::Idle);
        let transcript = manager.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].content, "anything new?");
        assert_eq!(
            manager.send(&snapshot, "").await.unwrap_err(),
            ChatError::EmptyMessage
        );
    }

    #[test]
    fn abandon_ignores_replies_from_before_a_clear() {
        let mut session = ChatSession::new();
        let stale = session.begin("first").unwrap();
        session.clear();
        let current = session.begin("second").unwrap();
        session.abandon(&stale);
        assert_eq!(session.phase(), ChatPhase::AwaitingReply);
        session.abandon(&current);
        assert_eq!(session.phase(), ChatPhase::Idle);
    }

    #[tokio::test]
    async fn assistant_prefers_the_service() {
        let facade = AiFacade::new(Some(ScriptedService::new(vec![Ok(
            "Kopi Kita is a strong fit.".to_string(),
        )])));
        let manager = ChatManager::new(Arc::new(AssistantResponder::new(facade)));
        let reply = manager
            .send(&snapshot(), "Who fits a food festival?")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.content, "Kopi Kita is a strong fit.");
        assert_eq!(manager.transcript().len(), 3);
    }

    #[tokio::test]
    async fn assistant_flags_rate_limits() {
        let facade = AiFacade::new(Some(ScriptedService::new(vec![Err(AiError::RateLimited)])));
        let responder = AssistantResponder::new(facade);
        let reply = responder.respond(&snapshot(), &[], "sponsors?").await;
        assert!(reply.starts_with("(The AI service is rate limited, retry shortly.)"));
        assert!(reply.contains("Lumbung Tech"));
    }
}
