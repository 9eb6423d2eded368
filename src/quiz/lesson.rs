//! Interactive lessons: a single-question quiz and the Pocket Planner sandbox

use crate::catalog;
use crate::contract::{AdvisoryPayload, AdvisoryRequest};
use crate::error::CoachError;
use crate::gateway::{AdvisoryGateway, AdvisoryResult};
use crate::ledger::ProgressLedger;
use crate::models::{Lesson, QuizQuestion};
use crate::Result;
use tracing::{info, warn};

use super::QUIZ_ERROR;

pub const POCKET_MONEY: f64 = 50.0;

/// Inline quiz for one lesson. A correct answer earns the lesson's badge.
pub struct LessonRunner {
    lesson: &'static Lesson,
    question: Option<QuizQuestion>,
    selected: Option<String>,
    feedback: Option<bool>,
    error: Option<String>,
}

impl LessonRunner {
    pub fn new(lesson_id: &str) -> Result<Self> {
        let lesson = catalog::lesson(lesson_id)
            .ok_or_else(|| CoachError::UserInput(format!("unknown lesson '{}'", lesson_id)))?;
        Ok(Self {
            lesson,
            question: None,
            selected: None,
            feedback: None,
            error: None,
        })
    }

    pub fn lesson(&self) -> &'static Lesson {
        self.lesson
    }

    pub fn question(&self) -> Option<&QuizQuestion> {
        self.question.as_ref()
    }

    /// `Some(true)` once a correct answer was submitted
    pub fn feedback(&self) -> Option<bool> {
        self.feedback
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn request(&self) -> AdvisoryRequest {
        AdvisoryRequest::quiz(self.lesson.quiz_topic, 1)
    }

    /// Replace the current question with a freshly generated one
    pub fn on_generated(&mut self, result: AdvisoryResult) -> Result<()> {
        self.question = None;
        self.selected = None;
        self.feedback = None;

        match result {
            AdvisoryResult::Success(AdvisoryPayload::Quiz(mut questions)) if !questions.is_empty() => {
                self.question = Some(questions.swap_remove(0));
                self.error = None;
                Ok(())
            }
            other => {
                warn!(lesson = self.lesson.id, "lesson quiz generation failed");
                self.error = Some(QUIZ_ERROR.to_string());
                Err(match other {
                    AdvisoryResult::Failure { reason } => CoachError::Transport(reason),
                    _ => CoachError::EmptyResult("lesson quiz has no question".to_string()),
                })
            }
        }
    }

    pub async fn generate(&mut self, gateway: &AdvisoryGateway) -> Result<()> {
        let result = gateway.submit(&self.request()).await;
        self.on_generated(result)
    }

    pub fn select(&mut self, option: &str) -> Result<()> {
        let question = self
            .question
            .as_ref()
            .ok_or_else(|| CoachError::InvalidState("no lesson question loaded".to_string()))?;
        if !question.has_option(option) {
            return Err(CoachError::UserInput(format!(
                "'{}' is not one of the options",
                option
            )));
        }
        self.selected = Some(option.to_string());
        Ok(())
    }

    /// Grade the selected answer, awarding the lesson badge when correct
    pub fn submit(&mut self, ledger: &mut ProgressLedger) -> Result<bool> {
        let question = self
            .question
            .as_ref()
            .ok_or_else(|| CoachError::InvalidState("no lesson question loaded".to_string()))?;
        let selected = self
            .selected
            .as_deref()
            .ok_or_else(|| CoachError::UserInput("select an answer first".to_string()))?;

        let correct = question.is_correct(selected);
        if correct {
            ledger.award(self.lesson.badge_to_award);
        }
        info!(lesson = self.lesson.id, correct, "lesson answer submitted");

        self.feedback = Some(correct);
        Ok(correct)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedExpense {
    pub description: String,
    pub amount: f64,
}

/// Budgeting sandbox with a fixed starting balance
#[derive(Debug, Clone)]
pub struct PocketPlanner {
    balance: f64,
    expenses: Vec<PlannedExpense>,
}

impl Default for PocketPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PocketPlanner {
    pub fn new() -> Self {
        Self {
            balance: POCKET_MONEY,
            expenses: Vec::new(),
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Newest first
    pub fn expenses(&self) -> &[PlannedExpense] {
        &self.expenses
    }

    pub fn add_expense(&mut self, description: &str, amount: &str) -> Result<f64> {
        let description = description.trim();
        if description.is_empty() {
            return Err(CoachError::UserInput("description is required".to_string()));
        }

        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| CoachError::UserInput(format!("'{}' is not an amount", amount)))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoachError::UserInput("amount must be positive".to_string()));
        }
        if amount > self.balance {
            return Err(CoachError::UserInput(
                "You don't have enough pocket money for that!".to_string(),
            ));
        }

        self.balance -= amount;
        self.expenses.insert(
            0,
            PlannedExpense {
                description: description.to_string(),
                amount,
            },
        );
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockAdvisoryService;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_correct_answer_awards_lesson_badge() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_response(
            r#"{"question":"Which is a need?","options":["Rent","Concert","Sneakers","Games"],"answer":"Rent"}"#,
        );
        let gateway = AdvisoryGateway::new(mock.clone(), Duration::from_secs(30));
        let mut ledger = ProgressLedger::new();

        let mut lesson = LessonRunner::new("needs_vs_wants").unwrap();
        lesson.generate(&gateway).await.unwrap();
        assert!(mock.prompts()[0].contains("differentiating needs and wants"));

        assert!(matches!(lesson.submit(&mut ledger), Err(CoachError::UserInput(_))));
        lesson.select("Rent").unwrap();
        assert!(lesson.submit(&mut ledger).unwrap());
        assert!(ledger.has("smart_spender"));
    }

    #[test]
    fn test_wrong_answer_awards_nothing() {
        let mut ledger = ProgressLedger::new();
        let mut lesson = LessonRunner::new("budgeting_101").unwrap();
        lesson
            .on_generated(AdvisoryResult::Success(AdvisoryPayload::Quiz(vec![QuizQuestion {
                question: "What is 20% for in 50/30/20?".to_string(),
                options: vec!["Needs".into(), "Wants".into(), "Savings".into(), "Taxes".into()],
                answer: "Savings".to_string(),
            }])))
            .unwrap();

        lesson.select("Wants").unwrap();
        assert!(!lesson.submit(&mut ledger).unwrap());
        assert_eq!(lesson.feedback(), Some(false));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_failed_generation_surfaces_error() {
        let mut lesson = LessonRunner::new("compound_interest").unwrap();
        assert!(lesson.on_generated(AdvisoryResult::failure("timeout")).is_err());
        assert_eq!(lesson.error(), Some(QUIZ_ERROR));
        assert!(LessonRunner::new("no_such_lesson").is_err());
    }

    #[test]
    fn test_pocket_planner_limits() {
        let mut planner = PocketPlanner::new();
        assert_eq!(planner.add_expense("Snacks", "12.5").unwrap(), 37.5);
        assert_eq!(planner.add_expense("Movie", "30").unwrap(), 7.5);

        assert!(planner.add_expense("Game", "10").is_err());
        assert!(planner.add_expense("", "1").is_err());
        assert!(planner.add_expense("Gum", "").is_err());
        assert!(planner.add_expense("Gum", "-2").is_err());

        assert_eq!(planner.balance(), 7.5);
        assert_eq!(planner.expenses()[0].description, "Movie");
    }
}
