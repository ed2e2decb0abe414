//! Chat session: per-session conversation state and its transitions
//!
//! Transitions:
//! - submit:   idle → pending (normal path) | idle → idle (crisis card appended)
//! - complete: pending → idle, appending the reply on success, nothing on failure
//! - retry:    idle with an unanswered user turn → pending
//! - reset:    any → idle with the greeting turn and mood [0.0]
//!
//! Every pending exchange carries an [`ExchangeTicket`]. `complete` refuses a
//! ticket that is no longer current, so a late reply never lands on a newer
//! user turn.

use tracing::{debug, info, warn};

use crate::core::crisis::crisis_turn;
use crate::core::gateway::ChatGateway;
use crate::core::safety::SafetyFilter;
use crate::core::sentiment::SentimentExtractor;
use crate::error::{ChatError, GatewayError, SessionError};
use crate::types::{is_crisis_score, ConversationStore, Exchange, MoodTrack, SafetyVerdict, Turn};
use crate::{EXPORT_CRISIS_PLACEHOLDER, EXPORT_SEPARATOR};

/// What a user submission needs next
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Filter tripped; crisis card already appended, no model call
    Crisis(Exchange),
    /// Caller must fetch a reply and hand it to [`ChatSession::complete`]
    AwaitingReply(ExchangeTicket),
}

/// Identifies one pending exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeTicket(u64);

/// One user's conversation: store, mood track and pending exchange
#[derive(Debug, Clone)]
pub struct ChatSession {
    store: ConversationStore,
    mood: MoodTrack,
    filter: SafetyFilter,
    extractor: SentimentExtractor,
    scoring: bool,
    generation: u64,
    pending: Option<ExchangeTicket>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ChatSession {
    /// Fresh session; `scoring` enables score extraction and mood tracking
    pub fn new(scoring: bool) -> Self {
        Self {
            store: ConversationStore::new(),
            mood: MoodTrack::new(),
            filter: SafetyFilter::new(),
            extractor: SentimentExtractor::new(),
            scoring,
            generation: 0,
            pending: None,
        }
    }

    fn arm(&mut self) -> ExchangeTicket {
        self.generation += 1;
        let ticket = ExchangeTicket(self.generation);
        self.pending = Some(ticket);
        ticket
    }

    /// Accept a user message
    pub fn submit(&mut self, text: &str) -> Result<Submission, SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::AwaitingReply);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.store.push(Turn::user(text));

        let verdict = self.filter.scan(text);
        if let SafetyVerdict::Crisis { category, .. } = &verdict {
            info!(category = category.code(), "safety filter tripped, showing crisis card");
            self.store.push(crisis_turn());
            return Ok(Submission::Crisis(Exchange::crisis()));
        }

        Ok(Submission::AwaitingReply(self.arm()))
    }

    /// Apply the gateway result for the exchange `ticket` was issued for.
    ///
    /// A stale ticket changes nothing and yields [`SessionError::Superseded`].
    pub fn complete(
        &mut self,
        ticket: ExchangeTicket,
        result: Result<String, GatewayError>,
    ) -> Result<Exchange, ChatError> {
        if self.pending != Some(ticket) {
            debug!(ticket = ticket.0, "dropping reply for a superseded exchange");
            return Err(SessionError::Superseded.into());
        }
        self.pending = None;
        let raw = result?;

        if !self.scoring {
            self.store.push(Turn::assistant(raw.clone()));
            return Ok(Exchange::reply(raw, None, None, false));
        }

        let (clean, score) = self.extractor.extract(&raw);
        let mood = self.mood.record(score);
        self.store.push(Turn::assistant(clean.clone()));

        let escalated = score.is_some_and(is_crisis_score);
        if escalated {
            warn!(score = mood, "self-reported mood crossed crisis threshold, escalating");
            self.store.push(crisis_turn());
        }

        Ok(Exchange::reply(clean, score, Some(mood), escalated))
    }

    /// Re-arm the exchange for an unanswered user turn after a failure
    pub fn retry(&mut self) -> Result<ExchangeTicket, SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::AwaitingReply);
        }
        if !self.store.ends_with_user() {
            return Err(SessionError::NothingToRetry);
        }
        Ok(self.arm())
    }

    /// Back to the greeting and neutral mood
    pub fn reset(&mut self) {
        self.store.reset();
        self.mood.reset();
        self.pending = None;
    }

    pub fn turns(&self) -> &[Turn] {
        self.store.turns()
    }

    pub fn mood(&self) -> &MoodTrack {
        &self.mood
    }

    pub fn scoring(&self) -> bool {
        self.scoring
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.pending.is_some()
    }

    /// Plain-text transcript; crisis cards become a placeholder line
    pub fn export(&self) -> String {
        let mut out = String::new();
        for turn in self.store.turns() {
            let text = if turn.is_crisis_card {
                EXPORT_CRISIS_PLACEHOLDER
            } else {
                turn.text.as_str()
            };
            out.push_str(&format!(
                "[{}]:\n{}\n\n{}\n",
                turn.speaker.label(),
                text,
                EXPORT_SEPARATOR
            ));
        }
        out
    }
}

/// Submit a message and, on the normal path, fetch and apply the reply
pub async fn run_exchange(
    session: &mut ChatSession,
    gateway: &dyn ChatGateway,
    text: &str,
) -> Result<Exchange, ChatError> {
    match session.submit(text)? {
        Submission::Crisis(exchange) => Ok(exchange),
        Submission::AwaitingReply(ticket) => {
            let result = gateway.reply(session.turns()).await;
            session.complete(ticket, result)
        }
    }
}

/// Re-send the unanswered user turn
pub async fn run_retry(session: &mut ChatSession, gateway: &dyn ChatGateway) -> Result<Exchange, ChatError> {
    let ticket = session.retry()?;
    let result = gateway.reply(session.turns()).await;
    let mut exchange = session.complete(ticket, result)?;
    // The user turn was appended by the original submission
    exchange.turns_appended -= 1;
    Ok(exchange)
}

// =============================================================================
// TESTS
// =============================================================================
