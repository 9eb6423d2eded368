//! Debounced category suggestions
//!
//! Input changes restart a timer; a `CategorySuggestion` request is issued
//! only once the input has been quiet for the debounce delay. Every issued
//! request takes the next sequence number and its response is applied only
//! while that number is still the latest. In-flight calls are never aborted,
//! their results are discarded.

use crate::contract::{AdvisoryPayload, AdvisoryRequest};
use crate::gateway::{AdvisoryGateway, AdvisoryResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::debug;

/// Observable state of the description field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    pub suggestion: Option<String>,
    pub suggesting: bool,
}

#[derive(Debug, Default)]
struct FieldState {
    /// Bumped on every input change; stale timers see a newer value and stop
    input_generation: u64,
    /// Sequence number of the latest issued (or superseding) request
    issued_seq: u64,
    view: SuggestionState,
}

#[derive(Clone)]
pub struct SuggestionController {
    gateway: AdvisoryGateway,
    delay: Duration,
    min_chars: usize,
    state: Arc<RwLock<FieldState>>,
    updates: Arc<watch::Sender<SuggestionState>>,
}

impl SuggestionController {
    pub fn new(gateway: AdvisoryGateway, delay: Duration, min_chars: usize) -> Self {
        let (tx, _rx) = watch::channel(SuggestionState::default());
        Self {
            gateway,
            delay,
            min_chars,
            state: Arc::new(RwLock::new(FieldState::default())),
            updates: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.updates.subscribe()
    }

    pub async fn suggestion(&self) -> Option<String> {
        self.state.read().await.view.suggestion.clone()
    }

    pub async fn is_suggesting(&self) -> bool {
        self.state.read().await.view.suggesting
    }

    /// React to a change of the description field. The field reads as
    /// suggesting from here until the debounced request settles.
    pub async fn on_input_change(&self, text: &str) {
        let text = text.trim().to_string();

        if text.chars().count() < self.min_chars {
            self.clear().await;
            return;
        }

        let generation = {
            let mut st = self.state.write().await;
            st.input_generation += 1;
            st.view.suggesting = true;
            self.updates.send_replace(st.view.clone());
            st.input_generation
        };

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.delay).await;
            this.issue(generation, text).await;
        });
    }

    /// Clear the suggestion and supersede any pending or in-flight request
    pub async fn clear(&self) {
        let mut st = self.state.write().await;
        st.input_generation += 1;
        st.issued_seq += 1;
        st.view = SuggestionState::default();
        self.updates.send_replace(st.view.clone());
    }

    async fn issue(&self, generation: u64, text: String) {
        let seq = {
            let mut st = self.state.write().await;
            if st.input_generation != generation {
                return;
            }
            st.issued_seq += 1;
            st.issued_seq
        };

        debug!(seq, "issuing category suggestion");
        let result = self.gateway.submit(&AdvisoryRequest::category(text)).await;

        let mut st = self.state.write().await;
        if st.issued_seq != seq {
            debug!(seq, latest = st.issued_seq, "discarding superseded suggestion");
            return;
        }

        st.view.suggesting = false;
        st.view.suggestion = match result {
            AdvisoryResult::Success(AdvisoryPayload::CategorySuggestion(s)) => Some(s.category),
            _ => None,
        };
        self.updates.send_replace(st.view.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockAdvisoryService;
    use tokio::time::{sleep, Instant};

    fn controller(mock: &Arc<MockAdvisoryService>) -> SuggestionController {
        let gateway = AdvisoryGateway::new(mock.clone(), Duration::from_secs(30));
        SuggestionController::new(gateway, Duration::from_millis(500), 3)
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_issues_single_request() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_response(r#"{"category":"Food & Drinks"}"#);
        let field = controller(&mock);
        let start = Instant::now();

        for text in ["C", "Co", "Cof", "Coff", "Coffee"] {
            field.on_input_change(text).await;
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_millis(1000)).await;

        assert_eq!(mock.calls(), 1);
        assert!(mock.prompts()[0].contains("\"Coffee\""));
        assert_eq!(mock.call_times()[0] - start, Duration::from_millis(900));
        assert_eq!(field.suggestion().await.as_deref(), Some("Food & Drinks"));
        assert!(!field.is_suggesting().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefix_then_word_issues_once_after_quiet_period() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_response(r#"{"category":"Food & Drinks"}"#);
        let field = controller(&mock);
        let start = Instant::now();

        field.on_input_change("Co").await;
        sleep(Duration::from_millis(100)).await;
        field.on_input_change("Coffee").await;
        sleep(Duration::from_millis(1100)).await;

        assert_eq!(mock.calls(), 1);
        assert!(mock.prompts()[0].contains("\"Coffee\""));
        assert_eq!(mock.call_times()[0] - start, Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggesting_during_debounce_window() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_response(r#"{"category":"Health"}"#);
        let field = controller(&mock);
        let updates = field.subscribe();

        field.on_input_change("Pharmacy").await;
        assert!(field.is_suggesting().await);
        assert!(updates.borrow().suggesting);

        sleep(Duration::from_millis(300)).await;
        assert_eq!(mock.calls(), 0);
        assert!(field.is_suggesting().await);

        sleep(Duration::from_millis(300)).await;
        assert!(!field.is_suggesting().await);
        assert_eq!(field.suggestion().await.as_deref(), Some("Health"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_discarded() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_delayed_response(r#"{"category":"Food & Drinks"}"#, Duration::from_millis(1000));
        mock.push_response(r#"{"category":"Transport"}"#);
        let field = controller(&mock);

        field.on_input_change("Coffee").await;
        sleep(Duration::from_millis(600)).await;
        field.on_input_change("Coffee shop").await;
        sleep(Duration::from_millis(700)).await;

        // the newer response has landed; the older one is still in flight
        assert_eq!(field.suggestion().await.as_deref(), Some("Transport"));
        sleep(Duration::from_millis(2000)).await;

        assert_eq!(mock.calls(), 2);
        assert!(mock.prompts()[1].contains("\"Coffee shop\""));
        assert_eq!(field.suggestion().await.as_deref(), Some("Transport"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_clears_and_supersedes() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_delayed_response(r#"{"category":"Shopping"}"#, Duration::from_millis(300));
        let field = controller(&mock);
        let mut updates = field.subscribe();

        field.on_input_change("Shoes").await;
        sleep(Duration::from_millis(600)).await;
        assert!(field.is_suggesting().await);

        field.on_input_change("Sh").await;
        sleep(Duration::from_millis(1000)).await;

        assert_eq!(mock.calls(), 1);
        assert_eq!(field.suggestion().await, None);
        assert!(!field.is_suggesting().await);
        assert_eq!(*updates.borrow_and_update(), SuggestionState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_clears_suggestion() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_response(r#"{"category":"Transport"}"#);
        mock.push_error("quota exceeded");
        let field = controller(&mock);

        field.on_input_change("Taxi").await;
        sleep(Duration::from_millis(600)).await;
        assert_eq!(field.suggestion().await.as_deref(), Some("Transport"));

        field.on_input_change("Taxi home").await;
        sleep(Duration::from_millis(600)).await;
        assert_eq!(field.suggestion().await, None);
    }
}
