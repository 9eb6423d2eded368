//! Service-side chat history
//!
//! Completed exchanges replayed to the service with each new message.
//! Bounded to the most recent `window` exchanges.

use crate::gateway::ChatTurn;
use crate::models::Sender;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
struct Exchange {
    user: String,
    reply: String,
    /// Approximate token count for both turns
    token_count: usize,
}

#[derive(Debug, Clone)]
pub struct ChatHistory {
    exchanges: VecDeque<Exchange>,
    window: usize,
    total_tokens: usize,
}

impl ChatHistory {
    pub fn new(window: usize) -> Self {
        Self {
            exchanges: VecDeque::new(),
            window: window.max(1),
            total_tokens: 0,
        }
    }

    /// Record a successfully completed exchange
    pub fn record_exchange(&mut self, user: impl Into<String>, reply: impl Into<String>) {
        let user = user.into();
        let reply = reply.into();
        let token_count = estimate_tokens(&user) + estimate_tokens(&reply);

        self.total_tokens += token_count;
        self.exchanges.push_back(Exchange {
            user,
            reply,
            token_count,
        });

        while self.exchanges.len() > self.window {
            if let Some(old) = self.exchanges.pop_front() {
                self.total_tokens = self.total_tokens.saturating_sub(old.token_count);
            }
        }
    }

    /// Turns in chronological order, user first in each exchange
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.exchanges
            .iter()
            .flat_map(|e| {
                [
                    ChatTurn::new(Sender::User, e.user.as_str()),
                    ChatTurn::new(Sender::Assistant, e.reply.as_str()),
                ]
            })
            .collect()
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.len()
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

/// Rough token estimate: four characters per token
fn estimate_tokens(text: &str) -> usize {
    (text.len() + 3) / 4
}
