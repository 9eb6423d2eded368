//! Core data models for the financial literacy coach

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

/// Age-based user segment; selects tone, tools and the chat persona
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Cohort {
    Teen,
    YoungAdult,
    Adult,
    Senior,
}

impl Cohort {
    pub const ALL: [Cohort; 4] = [Cohort::Teen, Cohort::YoungAdult, Cohort::Adult, Cohort::Senior];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "teen" => Some(Cohort::Teen),
            "youngadult" => Some(Cohort::YoungAdult),
            "adult" => Some(Cohort::Adult),
            "senior" => Some(Cohort::Senior),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Category came from the suggestion (or the fallback) and is unreviewed
    Pending,
    /// Category accepted or overridden by the user
    Confirmed,
}

//
// ================= Chat =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub streaming: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            streaming: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            streaming: false,
        }
    }

    /// Empty assistant message that streamed deltas are appended to
    pub fn in_progress() -> Self {
        Self {
            sender: Sender::Assistant,
            text: String::new(),
            streaming: true,
        }
    }
}

//
// ================= Quiz =================
//

/// One multiple-choice question produced by the advisory service.
///
/// `answer` is the grading key and comes from the same untrusted call that
/// wrote the question. It is validated to be one of `options` but never
/// re-derived, so grading is only as faithful as the service is
/// self-consistent. Values are immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, selected: &str) -> bool {
        self.answer == selected
    }

    pub fn has_option(&self, candidate: &str) -> bool {
        self.options.iter().any(|o| o == candidate)
    }
}

//
// ================= Catalog =================
//

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lesson {
    pub id: &'static str,
    pub title: &'static str,
    pub content: &'static [&'static str],
    pub quiz_topic: &'static str,
    pub badge_to_award: &'static str,
}

/// Lesson reference offered to the recommendation service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LessonSummary {
    pub id: String,
    pub title: String,
}

impl From<&Lesson> for LessonSummary {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id.to_string(),
            title: lesson.title.to_string(),
        }
    }
}

//
// ================= User Records =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoal {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub monthly_contribution: f64,
    pub deadline: NaiveDate,
}

impl FinancialGoal {
    pub fn remaining(&self) -> f64 {
        (self.target_amount - self.current_amount).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioHolding {
    pub name: String,
    pub value: f64,
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cohort::Teen => "Teen",
            Cohort::YoungAdult => "Young Adult",
            Cohort::Adult => "Adult",
            Cohort::Senior => "Senior",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
        };
        write!(f, "{}", s)
    }
}
