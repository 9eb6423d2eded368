//! Typed response payloads
//!
//! Field names follow the camelCase wire format the service is asked for.
//! Numeric fields are carried through exactly as received.

use crate::catalog;
use crate::models::QuizQuestion;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const QUIZ_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    #[serde(rename = "Not Eligible")]
    NotEligible,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoanPrediction {
    pub eligibility: Eligibility,
    pub confidence_score: f64,
    pub explanation: String,
    pub monthly_payment: f64,
    pub max_loan_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalPrediction {
    pub likelihood: f64,
    /// `YYYY-MM`
    pub predicted_date: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetirementPrediction {
    pub readiness_score: f64,
    pub predicted_corpus: f64,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub income_tax: f64,
    pub surcharge: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxEstimation {
    pub estimated_tax: f64,
    pub effective_tax_rate: f64,
    pub breakdown: TaxBreakdown,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditScoreTips {
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsuranceRecommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsuranceAdvice {
    pub recommendations: Vec<InsuranceRecommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioAdvice {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalPrediction {
    pub is_sustainable: bool,
    /// 999 when the withdrawal is sustainable
    pub funds_deplete_age: f64,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialHealthScore {
    pub score: f64,
    pub summary: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetOptimization {
    pub suggested_savings_ratio: f64,
    pub advice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategorySuggestion {
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FraudTip {
    pub tip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinancialFact {
    pub fact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecommendation {
    /// Empty when every lesson has been completed
    pub recommended_lesson_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub premiums: f64,
    pub medication: f64,
    pub out_of_pocket: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthcarePrediction {
    pub predicted_annual_cost: f64,
    pub cost_breakdown: CostBreakdown,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentLoanAdvice {
    pub monthly_payment: f64,
    pub summary: String,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpendingTrendSummary {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetingAdvice {
    pub advice: String,
}

/// Wire shape of a multi-question quiz
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuizEnvelope {
    pub quiz: Vec<QuizQuestion>,
}

/// Validated success payload; the variant always matches the request kind
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisoryPayload {
    LoanEligibility(LoanPrediction),
    GoalProjection(GoalPrediction),
    RetirementReadiness(RetirementPrediction),
    TaxEstimate(TaxEstimation),
    CreditTips(CreditScoreTips),
    InsuranceAdvice(InsuranceAdvice),
    PortfolioAdvice(PortfolioAdvice),
    WithdrawalSustainability(WithdrawalPrediction),
    HealthScore(FinancialHealthScore),
    BudgetOptimization(BudgetOptimization),
    Quiz(Vec<QuizQuestion>),
    CategorySuggestion(CategorySuggestion),
    FraudTip(FraudTip),
    FinancialFact(FinancialFact),
    LessonRecommendation(LessonRecommendation),
    HealthcareCost(HealthcarePrediction),
    StudentLoan(StudentLoanAdvice),
    SpendingTrend(SpendingTrendSummary),
    BudgetingAdvice(BudgetingAdvice),
}

pub(crate) fn check_quiz_question(index: usize, q: &QuizQuestion) -> Result<(), String> {
    if q.question.trim().is_empty() {
        return Err(format!("question {} has no text", index));
    }
    if q.options.len() != QUIZ_OPTION_COUNT {
        return Err(format!(
            "question {} has {} options, expected {}",
            index,
            q.options.len(),
            QUIZ_OPTION_COUNT
        ));
    }
    if q.options.iter().any(|o| o.trim().is_empty()) {
        return Err(format!("question {} has an empty option", index));
    }
    let distinct: HashSet<&str> = q.options.iter().map(String::as_str).collect();
    if distinct.len() != q.options.len() {
        return Err(format!("question {} repeats an option", index));
    }
    if !q.has_option(&q.answer) {
        return Err(format!(
            "question {} answer '{}' is not one of its options",
            index, q.answer
        ));
    }
    Ok(())
}

pub(crate) fn check_month(value: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("predictedDate '{}' is not YYYY-MM", value))
}

pub(crate) fn check_category(value: &str) -> Result<(), String> {
    if catalog::is_expense_category(value) {
        Ok(())
    } else {
        Err(format!("category '{}' is not a known expense category", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], answer: &str) -> QuizQuestion {
        QuizQuestion {
            question: "Which is a need?".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn test_quiz_question_rules() {
        assert!(check_quiz_question(0, &question(&["Food", "Games", "Toys", "Movies"], "Food")).is_ok());
        assert!(check_quiz_question(0, &question(&["Food", "Games", "Toys"], "Food")).is_err());
        assert!(check_quiz_question(0, &question(&["Food", "Food", "Toys", "Movies"], "Food")).is_err());
        assert!(check_quiz_question(0, &question(&["Food", "Games", "Toys", "Movies"], "Water")).is_err());
    }

    #[test]
    fn test_month_format() {
        assert!(check_month("2027-03").is_ok());
        assert!(check_month("March 2027").is_err());
        assert!(check_month("2027-13").is_err());
    }

    #[test]
    fn test_eligibility_wire_names() {
        let parsed: Eligibility = serde_json::from_str("\"Not Eligible\"").unwrap();
        assert_eq!(parsed, Eligibility::NotEligible);
    }
}
