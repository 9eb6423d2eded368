//! Scripted advisory service for development and testing
//!
//! Keeps the coach functional without a network dependency. Responses are
//! served in the order they were pushed; every call is recorded.

use super::{AdvisoryService, ChatTurn, ChunkStream};
use crate::contract::Schema;
use crate::error::CoachError;
use crate::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

struct Scripted {
    outcome: std::result::Result<String, String>,
    delay: Option<Duration>,
}

enum ScriptedChat {
    Reply {
        chunks: Vec<String>,
        error: Option<String>,
        stall: bool,
    },
    OpenError(String),
}

/// Chat call as seen by the service
#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub directive: String,
    pub history: Vec<ChatTurn>,
    pub message: String,
}

#[derive(Default)]
pub struct MockAdvisoryService {
    responses: Mutex<VecDeque<Scripted>>,
    chats: Mutex<VecDeque<ScriptedChat>>,
    delay: Mutex<Duration>,
    prompts: Mutex<Vec<String>>,
    call_times: Mutex<Vec<Instant>>,
    chat_calls: Mutex<Vec<RecordedChat>>,
}

impl MockAdvisoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, raw: impl Into<String>) {
        self.push(Ok(raw.into()), None);
    }

    /// Response delivered only after `delay`, overriding the default delay
    pub fn push_delayed_response(&self, raw: impl Into<String>, delay: Duration) {
        self.push(Ok(raw.into()), Some(delay));
    }

    pub fn push_error(&self, reason: impl Into<String>) {
        self.push(Err(reason.into()), None);
    }

    /// Default latency of every `generate` call
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    pub fn push_chat_reply(&self, chunks: &[&str]) {
        lock(&self.chats).push_back(ScriptedChat::Reply {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            error: None,
            stall: false,
        });
    }

    /// Reply that yields `chunks` and then fails
    pub fn push_chat_broken(&self, chunks: &[&str], error: impl Into<String>) {
        lock(&self.chats).push_back(ScriptedChat::Reply {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            error: Some(error.into()),
            stall: false,
        });
    }

    /// Reply that yields `chunks` and then never produces another item
    pub fn push_chat_stalled(&self, chunks: &[&str]) {
        lock(&self.chats).push_back(ScriptedChat::Reply {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            error: None,
            stall: true,
        });
    }

    pub fn push_chat_open_error(&self, error: impl Into<String>) {
        lock(&self.chats).push_back(ScriptedChat::OpenError(error.into()));
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        lock(&self.call_times).clone()
    }

    pub fn chat_calls(&self) -> Vec<RecordedChat> {
        lock(&self.chat_calls).clone()
    }

    fn push(&self, outcome: std::result::Result<String, String>, delay: Option<Duration>) {
        lock(&self.responses).push_back(Scripted { outcome, delay });
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl AdvisoryService for MockAdvisoryService {
    async fn generate(&self, prompt: &str, _schema: &Schema) -> Result<String> {
        lock(&self.prompts).push(prompt.to_string());
        lock(&self.call_times).push(Instant::now());

        let scripted = lock(&self.responses).pop_front();
        let default_delay = *lock(&self.delay);

        let Some(scripted) = scripted else {
            return Err(CoachError::Transport("no scripted response".to_string()));
        };

        let delay = scripted.delay.unwrap_or(default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        scripted.outcome.map_err(CoachError::Transport)
    }

    async fn stream_chat(
        &self,
        directive: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChunkStream> {
        lock(&self.chat_calls).push(RecordedChat {
            directive: directive.to_string(),
            history: history.to_vec(),
            message: message.to_string(),
        });

        let scripted = lock(&self.chats).pop_front();
        match scripted {
            Some(ScriptedChat::Reply {
                chunks,
                error,
                stall,
            }) => {
                let items = stream::iter(
                    chunks
                        .into_iter()
                        .map(Ok)
                        .chain(error.map(|e| Err(CoachError::Transport(e)))),
                );
                if stall {
                    Ok(items.chain(stream::pending()).boxed())
                } else {
                    Ok(items.boxed())
                }
            }
            Some(ScriptedChat::OpenError(e)) => Err(CoachError::Transport(e)),
            None => Err(CoachError::Transport("no scripted chat reply".to_string())),
        }
    }
}
