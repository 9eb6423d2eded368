//! Streaming chat sessions
//!
//! One session per cohort selection. A session owns the visible transcript
//! and the history replayed to the service. Only one reply may stream at a
//! time; a reply for a session that has since been replaced is dropped.

use crate::catalog;
use crate::error::CoachError;
use crate::gateway::{AdvisoryGateway, ChunkStream};
use crate::models::{ChatMessage, Cohort};
use crate::Result;
use futures::StreamExt;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub mod history;
pub use history::ChatHistory;

/// Transcript text for a reply that failed at open or mid-delivery
pub const ERROR_REPLY: &str = "Sorry, I encountered an error.";

/// Reply deltas for one message, tagged with the session that asked for them.
///
/// Dropping it before the reply is driven to the end abandons the reply; the
/// session then finalizes the message with the error text on its next use.
pub struct ReplyStream {
    session_id: Uuid,
    chunks: ChunkStream,
    _claim: Arc<()>,
}

impl ReplyStream {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Next text delta; `None` once the reply is complete
    pub async fn next_delta(&mut self) -> Option<Result<String>> {
        self.chunks.next().await
    }
}

impl fmt::Debug for ReplyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyStream")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct PendingReply {
    user_text: String,
    index: usize,
    /// Dead once the caller dropped the `ReplyStream`
    claim: Weak<()>,
}

impl PendingReply {
    fn is_abandoned(&self) -> bool {
        self.claim.strong_count() == 0
    }
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    cohort: Cohort,
    directive: &'static str,
    transcript: Vec<ChatMessage>,
    history: ChatHistory,
    pending: Option<PendingReply>,
}

impl ChatSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cohort(&self) -> Cohort {
        self.cohort
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn is_streaming(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| !p.is_abandoned())
    }
}

pub struct StreamingSessionManager {
    gateway: AdvisoryGateway,
    history_window: usize,
    session: Option<ChatSession>,
}

impl StreamingSessionManager {
    pub fn new(gateway: AdvisoryGateway, history_window: usize) -> Self {
        Self {
            gateway,
            history_window,
            session: None,
        }
    }

    /// Start a fresh session for `cohort`, replacing any existing one
    pub fn start(&mut self, cohort: Cohort) -> Uuid {
        let profile = catalog::cohort_profile(cohort);
        let id = Uuid::new_v4();

        if let Some(old) = &self.session {
            debug!(old_session = %old.id, "replacing chat session");
        }

        self.session = Some(ChatSession {
            id,
            cohort,
            directive: profile.directive,
            transcript: vec![ChatMessage::assistant(profile.welcome)],
            history: ChatHistory::new(self.history_window),
            pending: None,
        });

        info!(session = %id, %cohort, "chat session started");
        id
    }

    pub fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            info!(session = %session.id, "chat session torn down");
        }
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        self.session.as_ref().map(|s| s.transcript()).unwrap_or(&[])
    }

    pub fn is_streaming(&self) -> bool {
        self.session.as_ref().map_or(false, ChatSession::is_streaming)
    }

    /// Finalize a reply whose stream was dropped undriven. Returns true if one was.
    pub fn settle_abandoned(&mut self) -> bool {
        let abandoned = self
            .session
            .as_ref()
            .and_then(|s| s.pending.as_ref().map(|p| (s.id, p.is_abandoned())));

        match abandoned {
            Some((session_id, true)) => {
                warn!(session = %session_id, "chat reply abandoned before completion");
                self.fail_reply(session_id)
            }
            _ => false,
        }
    }

    /// Send a user message and open the streamed reply
    pub async fn send(&mut self, text: &str) -> Result<ReplyStream> {
        let gateway = self.gateway.clone();
        self.settle_abandoned();

        let session = self
            .session
            .as_mut()
            .ok_or_else(|| CoachError::InvalidState("no active chat session".to_string()))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(CoachError::UserInput("message is empty".to_string()));
        }
        if session.pending.is_some() {
            return Err(CoachError::SessionBusy);
        }

        session.transcript.push(ChatMessage::user(text));
        session.transcript.push(ChatMessage::in_progress());
        let claim = Arc::new(());
        session.pending = Some(PendingReply {
            user_text: text.to_string(),
            index: session.transcript.len() - 1,
            claim: Arc::downgrade(&claim),
        });

        let session_id = session.id;
        let directive = session.directive;
        let turns = session.history.turns();

        debug!(session = %session_id, "sending chat message");

        match gateway.open_chat(directive, &turns, text).await {
            Ok(chunks) => Ok(ReplyStream {
                session_id,
                chunks,
                _claim: claim,
            }),
            Err(e) => {
                warn!(session = %session_id, error = %e, "chat stream failed to open");
                self.fail_reply(session_id);
                Err(e)
            }
        }
    }

    fn pending_for(&mut self, session_id: Uuid) -> Option<(&mut ChatSession, PendingReply)> {
        let session = self.session.as_mut().filter(|s| s.id == session_id)?;
        let pending = session.pending.clone()?;
        Some((session, pending))
    }

    /// Append a delta to the in-progress reply. Returns false if ignored.
    pub fn apply_delta(&mut self, session_id: Uuid, delta: &str) -> bool {
        match self.pending_for(session_id) {
            Some((session, pending)) => {
                session.transcript[pending.index].text.push_str(delta);
                true
            }
            None => false,
        }
    }

    /// Finalize the in-progress reply and record the exchange
    pub fn finish_reply(&mut self, session_id: Uuid) -> bool {
        let Some((session, pending)) = self.pending_for(session_id) else {
            return false;
        };

        let message = &mut session.transcript[pending.index];
        message.streaming = false;
        let reply = message.text.clone();

        session.history.record_exchange(pending.user_text, reply);
        session.pending = None;
        debug!(
            session = %session_id,
            exchanges = session.history.exchange_count(),
            history_tokens = session.history.total_tokens(),
            "chat reply complete"
        );
        true
    }

    /// Replace the in-progress reply with the fixed error text
    pub fn fail_reply(&mut self, session_id: Uuid) -> bool {
        let Some((session, pending)) = self.pending_for(session_id) else {
            return false;
        };

        let message = &mut session.transcript[pending.index];
        message.text = ERROR_REPLY.to_string();
        message.streaming = false;
        session.pending = None;
        true
    }

    /// Consume a reply to completion, calling `observer` for each applied delta.
    ///
    /// Returns the full reply text. A reply for a replaced session is dropped
    /// unread and yields an empty string.
    pub async fn drive_reply<F>(&mut self, mut reply: ReplyStream, mut observer: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let session_id = reply.session_id();
        if self.session.as_ref().map(|s| s.id) != Some(session_id) {
            debug!(session = %session_id, "dropping reply for replaced session");
            return Ok(String::new());
        }

        let mut full = String::new();
        while let Some(chunk) = reply.next_delta().await {
            match chunk {
                Ok(delta) => {
                    if self.apply_delta(session_id, &delta) {
                        observer(&delta);
                        full.push_str(&delta);
                    }
                }
                Err(e) => {
                    warn!(session = %session_id, error = %e, "chat stream failed mid-reply");
                    self.fail_reply(session_id);
                    return Err(e);
                }
            }
        }

        self.finish_reply(session_id);
        Ok(full)
    }
}
