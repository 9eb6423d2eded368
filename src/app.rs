//! Application context
//!
//! Owns the gateway, the chat session manager, the progress ledger and the
//! selected cohort. The ledger outlives profile changes.

use crate::chat::StreamingSessionManager;
use crate::config::CoachConfig;
use crate::contract::AdvisoryRequest;
use crate::expenses::ExpenseTracker;
use crate::gateway::{AdvisoryGateway, AdvisoryResult, AdvisoryService};
use crate::gemini::GeminiClient;
use crate::ledger::ProgressLedger;
use crate::models::Cohort;
use crate::quiz::QuizRunner;
use crate::suggest::SuggestionController;
use crate::Result;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct AppContext {
    config: CoachConfig,
    gateway: AdvisoryGateway,
    chat: StreamingSessionManager,
    ledger: ProgressLedger,
    cohort: Option<Cohort>,
}

impl AppContext {
    pub fn new(config: CoachConfig, service: Arc<dyn AdvisoryService>) -> Self {
        let gateway = AdvisoryGateway::new(service, config.request_timeout);
        let chat = StreamingSessionManager::new(gateway.clone(), config.chat_history_window);

        Self {
            config,
            gateway,
            chat,
            ledger: ProgressLedger::new(),
            cohort: None,
        }
    }

    /// Context backed by the Gemini API
    pub fn with_gemini(config: CoachConfig) -> Result<Self> {
        let client = GeminiClient::new(&config)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn gateway(&self) -> &AdvisoryGateway {
        &self.gateway
    }

    pub fn cohort(&self) -> Option<Cohort> {
        self.cohort
    }

    pub fn chat(&self) -> &StreamingSessionManager {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut StreamingSessionManager {
        &mut self.chat
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ProgressLedger {
        &mut self.ledger
    }

    /// Select a cohort and start a fresh chat session for it
    pub fn init_profile(&mut self, cohort: Cohort) -> Uuid {
        info!(%cohort, "profile selected");
        self.cohort = Some(cohort);
        self.chat.start(cohort)
    }

    pub fn reset_profile(&mut self) {
        info!("profile reset");
        self.cohort = None;
        self.chat.teardown();
    }

    pub fn teardown_session(&mut self) {
        self.chat.teardown();
    }

    pub fn award(&mut self, badge_id: &str) -> bool {
        self.ledger.award(badge_id)
    }

    pub fn has(&self, badge_id: &str) -> bool {
        self.ledger.has(badge_id)
    }

    pub async fn submit(&self, request: &AdvisoryRequest) -> AdvisoryResult {
        self.gateway.submit(request).await
    }

    /// Recommendation for the next lesson, based on lesson badges earned so far
    pub async fn recommend_lesson(&self) -> AdvisoryResult {
        let completed: Vec<String> = crate::catalog::lessons()
            .iter()
            .filter(|l| self.ledger.has(l.badge_to_award))
            .map(|l| l.id.to_string())
            .collect();
        self.submit(&AdvisoryRequest::lesson_recommendation(&completed)).await
    }

    pub fn quiz_runner(&self) -> QuizRunner {
        QuizRunner::new(self.config.quiz_question_count)
    }

    pub fn expense_tracker(&self) -> ExpenseTracker {
        ExpenseTracker::new(SuggestionController::new(
            self.gateway.clone(),
            self.config.suggestion_debounce,
            self.config.min_suggestion_chars,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::contract::AdvisoryPayload;
    use crate::gateway::MockAdvisoryService;

    fn context() -> (AppContext, Arc<MockAdvisoryService>) {
        let mock = Arc::new(MockAdvisoryService::new());
        let config = CoachConfig::new("test-key").unwrap();
        (AppContext::new(config, mock.clone()), mock)
    }

    #[test]
    fn test_profile_lifecycle_keeps_ledger() {
        let (mut app, _mock) = context();

        let first = app.init_profile(Cohort::Teen);
        app.award("budget_master");
        assert_eq!(app.chat().transcript().len(), 1);

        let second = app.init_profile(Cohort::Senior);
        assert_ne!(first, second);
        assert_eq!(app.chat().session().unwrap().cohort(), Cohort::Senior);

        app.reset_profile();
        assert_eq!(app.cohort(), None);
        assert!(app.chat().session().is_none());
        assert!(app.has("budget_master"));
    }

    #[test]
    fn test_teardown_keeps_cohort() {
        let (mut app, _mock) = context();
        app.init_profile(Cohort::Adult);
        app.teardown_session();
        assert_eq!(app.cohort(), Some(Cohort::Adult));
        assert!(app.chat().transcript().is_empty());
    }

    #[tokio::test]
    async fn test_recommendation_skips_completed_lessons() {
        let (mut app, mock) = context();
        app.award("budget_master");
        mock.push_response(r#"{"recommendedLessonId":"saving_investing","reason":"Build on budgeting."}"#);

        match app.recommend_lesson().await {
            AdvisoryResult::Success(AdvisoryPayload::LessonRecommendation(rec)) => {
                assert_eq!(rec.recommended_lesson_id, "saving_investing")
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(!mock.prompts()[0].contains("\"budgeting_101\""));

        for lesson in catalog::lessons() {
            app.award(lesson.badge_to_award);
        }
        assert!(app.recommend_lesson().await.is_success());
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_runners_use_config() {
        let (app, _mock) = context();
        let mut quiz = app.quiz_runner();
        match quiz.begin("Saving").unwrap() {
            AdvisoryRequest::QuizGeneration { question_count, .. } => assert_eq!(question_count, 3),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
