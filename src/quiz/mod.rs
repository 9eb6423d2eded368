//! Quiz runner
//!
//! Selecting -> Loading -> InProgress -> Completed, and back to Selecting on
//! restart or when generation fails. Scoring is plain string equality
//! against the grading key carried by each question.

use crate::catalog::QUIZ_BADGE;
use crate::contract::{AdvisoryPayload, AdvisoryRequest};
use crate::error::CoachError;
use crate::gateway::{AdvisoryGateway, AdvisoryResult};
use crate::ledger::ProgressLedger;
use crate::models::QuizQuestion;
use crate::Result;
use serde::Serialize;
use tracing::{info, warn};

pub mod lesson;
pub use lesson::{LessonRunner, PocketPlanner};

/// Shown after a failed or empty generation
pub const QUIZ_ERROR: &str = "Could not generate a quiz. Please try again.";

/// Minimum score (percent) that earns the quiz badge
pub const PASS_THRESHOLD: f64 = 2.0 / 3.0 * 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuizPhase {
    Selecting,
    Loading,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question: String,
    pub selected: Option<String>,
    pub answer: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizReport {
    pub topic: String,
    pub correct: usize,
    pub total: usize,
    pub score: f64,
    pub passed: bool,
    pub breakdown: Vec<QuestionResult>,
}

impl QuizReport {
    /// Score rounded to two decimals, e.g. `66.67`
    pub fn display_score(&self) -> String {
        format!("{:.2}", self.score)
    }
}

pub struct QuizRunner {
    question_count: usize,
    phase: QuizPhase,
    topic: String,
    questions: Vec<QuizQuestion>,
    answers: Vec<Option<String>>,
    current: usize,
    error: Option<String>,
    report: Option<QuizReport>,
}

impl QuizRunner {
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count: question_count.max(1),
            phase: QuizPhase::Selecting,
            topic: String::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            current: 0,
            error: None,
            report: None,
        }
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn report(&self) -> Option<&QuizReport> {
        self.report.as_ref()
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.phase {
            QuizPhase::InProgress => self.questions.get(self.current),
            _ => None,
        }
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.answers.get(self.current).and_then(|a| a.as_deref())
    }

    fn expect_phase(&self, expected: QuizPhase, action: &str) -> Result<()> {
        if self.phase != expected {
            return Err(CoachError::InvalidState(format!(
                "cannot {} while {:?}",
                action, self.phase
            )));
        }
        Ok(())
    }

    /// Pick a topic and produce the generation request
    pub fn begin(&mut self, topic: &str) -> Result<AdvisoryRequest> {
        self.expect_phase(QuizPhase::Selecting, "begin a quiz")?;
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(CoachError::UserInput("quiz topic is required".to_string()));
        }

        self.topic = topic.to_string();
        self.error = None;
        self.phase = QuizPhase::Loading;
        info!(topic, questions = self.question_count, "generating quiz");

        Ok(AdvisoryRequest::quiz(topic, self.question_count))
    }

    /// Apply the generation result
    pub fn on_generated(&mut self, result: AdvisoryResult) -> Result<()> {
        self.expect_phase(QuizPhase::Loading, "accept a generated quiz")?;

        let failure = match result {
            AdvisoryResult::Success(AdvisoryPayload::Quiz(questions)) if !questions.is_empty() => {
                self.answers = vec![None; questions.len()];
                self.questions = questions;
                self.current = 0;
                self.phase = QuizPhase::InProgress;
                return Ok(());
            }
            AdvisoryResult::Success(AdvisoryPayload::Quiz(_)) => {
                CoachError::EmptyResult("quiz has no questions".to_string())
            }
            AdvisoryResult::Success(other) => {
                CoachError::SchemaViolation(format!("expected a quiz, got {:?}", other))
            }
            AdvisoryResult::Failure { reason } => CoachError::Transport(reason),
        };

        warn!(topic = %self.topic, error = %failure, "quiz generation failed");
        self.phase = QuizPhase::Selecting;
        self.error = Some(QUIZ_ERROR.to_string());
        Err(failure)
    }

    /// `begin` followed by a gateway round trip
    pub async fn start(&mut self, topic: &str, gateway: &AdvisoryGateway) -> Result<()> {
        let request = self.begin(topic)?;
        let result = gateway.submit(&request).await;
        self.on_generated(result)
    }

    pub fn select_answer(&mut self, option: &str) -> Result<()> {
        self.expect_phase(QuizPhase::InProgress, "answer")?;
        let question = &self.questions[self.current];
        if !question.has_option(option) {
            return Err(CoachError::UserInput(format!(
                "'{}' is not one of the options",
                option
            )));
        }
        self.answers[self.current] = Some(option.to_string());
        Ok(())
    }

    pub fn can_advance(&self) -> bool {
        self.phase == QuizPhase::InProgress && self.selected_answer().is_some()
    }

    /// Move to the next question, finishing after the last one
    pub fn next(&mut self, ledger: &mut ProgressLedger) -> Result<()> {
        self.expect_phase(QuizPhase::InProgress, "advance")?;
        if self.selected_answer().is_none() {
            return Err(CoachError::UserInput("select an answer first".to_string()));
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
        } else {
            self.finish(ledger)?;
        }
        Ok(())
    }

    /// Grade every question; unanswered ones count as incorrect
    pub fn finish(&mut self, ledger: &mut ProgressLedger) -> Result<&QuizReport> {
        self.expect_phase(QuizPhase::InProgress, "finish")?;

        let breakdown: Vec<QuestionResult> = self
            .questions
            .iter()
            .zip(&self.answers)
            .map(|(q, selected)| QuestionResult {
                question: q.question.clone(),
                selected: selected.clone(),
                answer: q.answer.clone(),
                correct: selected.as_deref().map_or(false, |s| q.is_correct(s)),
            })
            .collect();

        let total = breakdown.len();
        let correct = breakdown.iter().filter(|r| r.correct).count();
        let score = correct as f64 / total as f64 * 100.0;
        let passed = score >= PASS_THRESHOLD;

        if passed {
            ledger.award(QUIZ_BADGE);
        }

        info!(topic = %self.topic, correct, total, score = %format!("{:.2}", score), passed, "quiz finished");

        self.phase = QuizPhase::Completed;
        Ok(self.report.insert(QuizReport {
            topic: self.topic.clone(),
            correct,
            total,
            score,
            passed,
            breakdown,
        }))
    }

    pub fn restart(&mut self) {
        let question_count = self.question_count;
        *self = Self::new(question_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockAdvisoryService;
    use std::sync::Arc;
    use std::time::Duration;

    fn q(text: &str, answer: &str) -> QuizQuestion {
        QuizQuestion {
            question: text.to_string(),
            options: vec!["A".into(), "B".into(), "C".into(), "X".into()],
            answer: answer.to_string(),
        }
    }

    fn loaded_runner() -> QuizRunner {
        let mut runner = QuizRunner::new(3);
        runner.begin("Saving").unwrap();
        runner
            .on_generated(AdvisoryResult::Success(AdvisoryPayload::Quiz(vec![
                q("Q1", "A"),
                q("Q2", "B"),
                q("Q3", "C"),
            ])))
            .unwrap();
        runner
    }

    fn answer_all(runner: &mut QuizRunner, ledger: &mut ProgressLedger, picks: &[&str]) {
        for pick in picks {
            runner.select_answer(pick).unwrap();
            runner.next(ledger).unwrap();
        }
    }

    #[test]
    fn test_two_of_three_awards_badge() {
        let mut ledger = ProgressLedger::new();
        let mut runner = loaded_runner();
        answer_all(&mut runner, &mut ledger, &["A", "B", "X"]);

        let report = runner.report().unwrap();
        assert_eq!(runner.phase(), QuizPhase::Completed);
        assert_eq!(report.display_score(), "66.67");
        assert!(report.passed);
        assert!(ledger.has(QUIZ_BADGE));
        assert!(!report.breakdown[2].correct);
    }

    #[test]
    fn test_one_of_three_does_not_award() {
        let mut ledger = ProgressLedger::new();
        let mut runner = loaded_runner();
        answer_all(&mut runner, &mut ledger, &["A", "X", "X"]);

        let report = runner.report().unwrap();
        assert_eq!(report.display_score(), "33.33");
        assert!(!report.passed);
        assert!(!ledger.has(QUIZ_BADGE));
    }

    #[test]
    fn test_next_requires_answer_and_valid_option() {
        let mut ledger = ProgressLedger::new();
        let mut runner = loaded_runner();

        assert!(!runner.can_advance());
        assert!(matches!(runner.next(&mut ledger), Err(CoachError::UserInput(_))));
        assert!(runner.select_answer("Z").is_err());

        runner.select_answer("A").unwrap();
        assert!(runner.can_advance());
        runner.next(&mut ledger).unwrap();
        assert_eq!(runner.current_index(), 1);
    }

    #[test]
    fn test_early_finish_counts_unanswered_as_wrong() {
        let mut ledger = ProgressLedger::new();
        let mut runner = loaded_runner();
        runner.select_answer("A").unwrap();

        let report = runner.finish(&mut ledger).unwrap();
        assert_eq!(report.correct, 1);
        assert_eq!(report.breakdown[1].selected, None);
    }

    #[test]
    fn test_empty_quiz_returns_to_selecting() {
        let mut runner = QuizRunner::new(3);
        runner.begin("Budgeting").unwrap();
        let err = runner
            .on_generated(AdvisoryResult::Success(AdvisoryPayload::Quiz(vec![])))
            .unwrap_err();

        assert!(matches!(err, CoachError::EmptyResult(_)));
        assert_eq!(runner.phase(), QuizPhase::Selecting);
        assert_eq!(runner.error(), Some(QUIZ_ERROR));
    }

    #[test]
    fn test_restart_and_state_guards() {
        let mut ledger = ProgressLedger::new();
        let mut runner = QuizRunner::new(3);
        assert!(matches!(runner.finish(&mut ledger), Err(CoachError::InvalidState(_))));

        let mut runner = loaded_runner();
        assert!(runner.begin("Investing Basics").is_err());
        answer_all(&mut runner, &mut ledger, &["A", "B", "C"]);
        runner.restart();
        assert_eq!(runner.phase(), QuizPhase::Selecting);
        assert!(runner.report().is_none());
    }

    #[tokio::test]
    async fn test_start_through_gateway() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_error("unavailable");
        mock.push_response(
            r#"{"quiz":[
                {"question":"Q1","options":["A","B","C","D"],"answer":"A"},
                {"question":"Q2","options":["A","B","C","D"],"answer":"B"},
                {"question":"Q3","options":["A","B","C","D"],"answer":"C"}
            ]}"#,
        );
        let gateway = AdvisoryGateway::new(mock.clone(), Duration::from_secs(30));
        let mut runner = QuizRunner::new(3);

        assert!(runner.start("Saving", &gateway).await.is_err());
        assert_eq!(runner.error(), Some(QUIZ_ERROR));

        runner.start("Saving", &gateway).await.unwrap();
        assert_eq!(runner.phase(), QuizPhase::InProgress);
        assert_eq!(runner.questions().len(), 3);
        assert!(runner.error().is_none());
    }
}
