//! Advisory request variants
//!
//! Each variant knows its instruction text, its declared response schema and
//! how to turn a raw response into a validated payload.

use super::payload::*;
use super::schema::Schema;
use crate::catalog::{self, EXPENSE_CATEGORIES};
use crate::error::CoachError;
use crate::models::{FinancialGoal, LessonSummary, PortfolioHolding, QuizQuestion, Transaction};
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;

/// One typed unit of work for the advisory service. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisoryRequest {
    LoanEligibility {
        age: u32,
        monthly_income: f64,
        monthly_expenses: f64,
        loan_amount: f64,
        credit_score: u32,
    },
    GoalProjection {
        goal: FinancialGoal,
    },
    RetirementReadiness {
        age: u32,
        current_savings: f64,
        monthly_contribution: f64,
    },
    TaxEstimate {
        annual_income: f64,
        annual_deductions: f64,
    },
    CreditTips {
        credit_score: u32,
    },
    InsuranceAdvice {
        has_family: bool,
        owns_home: bool,
    },
    PortfolioAdvice {
        holdings: Vec<PortfolioHolding>,
    },
    WithdrawalSustainability {
        corpus: f64,
        monthly_withdrawal: f64,
        age: u32,
    },
    HealthScore {
        monthly_income: f64,
        total_savings: f64,
        monthly_expenses: f64,
    },
    BudgetOptimization {
        transactions: Vec<Transaction>,
    },
    QuizGeneration {
        topic: String,
        question_count: usize,
    },
    CategorySuggestion {
        description: String,
    },
    FraudTip,
    FinancialFact,
    LessonRecommendation {
        completed_lesson_ids: Vec<String>,
        available_lessons: Vec<LessonSummary>,
    },
    HealthcareCost {
        age: u32,
    },
    StudentLoan {
        amount: f64,
        annual_interest_rate: f64,
    },
    SpendingTrend {
        transactions: Vec<Transaction>,
    },
    BudgetingAdvice {
        needs: f64,
        wants: f64,
        savings: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisoryKind {
    LoanEligibility,
    GoalProjection,
    RetirementReadiness,
    TaxEstimate,
    CreditTips,
    InsuranceAdvice,
    PortfolioAdvice,
    WithdrawalSustainability,
    HealthScore,
    BudgetOptimization,
    QuizGeneration,
    CategorySuggestion,
    FraudTip,
    FinancialFact,
    LessonRecommendation,
    HealthcareCost,
    StudentLoan,
    SpendingTrend,
    BudgetingAdvice,
}

impl AdvisoryRequest {
    pub fn quiz(topic: impl Into<String>, question_count: usize) -> Self {
        AdvisoryRequest::QuizGeneration {
            topic: topic.into(),
            question_count: question_count.max(1),
        }
    }

    pub fn category(description: impl Into<String>) -> Self {
        AdvisoryRequest::CategorySuggestion {
            description: description.into(),
        }
    }

    /// Recommendation over every catalog lesson not yet completed
    pub fn lesson_recommendation(completed_lesson_ids: &[String]) -> Self {
        let available_lessons = catalog::lessons()
            .iter()
            .filter(|l| !completed_lesson_ids.iter().any(|c| c == l.id))
            .map(LessonSummary::from)
            .collect();

        AdvisoryRequest::LessonRecommendation {
            completed_lesson_ids: completed_lesson_ids.to_vec(),
            available_lessons,
        }
    }

    pub fn kind(&self) -> AdvisoryKind {
        match self {
            AdvisoryRequest::LoanEligibility { .. } => AdvisoryKind::LoanEligibility,
            AdvisoryRequest::GoalProjection { .. } => AdvisoryKind::GoalProjection,
            AdvisoryRequest::RetirementReadiness { .. } => AdvisoryKind::RetirementReadiness,
            AdvisoryRequest::TaxEstimate { .. } => AdvisoryKind::TaxEstimate,
            AdvisoryRequest::CreditTips { .. } => AdvisoryKind::CreditTips,
            AdvisoryRequest::InsuranceAdvice { .. } => AdvisoryKind::InsuranceAdvice,
            AdvisoryRequest::PortfolioAdvice { .. } => AdvisoryKind::PortfolioAdvice,
            AdvisoryRequest::WithdrawalSustainability { .. } => AdvisoryKind::WithdrawalSustainability,
            AdvisoryRequest::HealthScore { .. } => AdvisoryKind::HealthScore,
            AdvisoryRequest::BudgetOptimization { .. } => AdvisoryKind::BudgetOptimization,
            AdvisoryRequest::QuizGeneration { .. } => AdvisoryKind::QuizGeneration,
            AdvisoryRequest::CategorySuggestion { .. } => AdvisoryKind::CategorySuggestion,
            AdvisoryRequest::FraudTip => AdvisoryKind::FraudTip,
            AdvisoryRequest::FinancialFact => AdvisoryKind::FinancialFact,
            AdvisoryRequest::LessonRecommendation { .. } => AdvisoryKind::LessonRecommendation,
            AdvisoryRequest::HealthcareCost { .. } => AdvisoryKind::HealthcareCost,
            AdvisoryRequest::StudentLoan { .. } => AdvisoryKind::StudentLoan,
            AdvisoryRequest::SpendingTrend { .. } => AdvisoryKind::SpendingTrend,
            AdvisoryRequest::BudgetingAdvice { .. } => AdvisoryKind::BudgetingAdvice,
        }
    }

    /// Payload that can be produced without calling the service, if any
    pub fn local_answer(&self) -> Option<AdvisoryPayload> {
        match self {
            AdvisoryRequest::LessonRecommendation { available_lessons, .. }
                if available_lessons.is_empty() =>
            {
                Some(AdvisoryPayload::LessonRecommendation(LessonRecommendation {
                    recommended_lesson_id: String::new(),
                    reason: "You've completed all the lessons! Great job!".to_string(),
                }))
            }
            _ => None,
        }
    }

    /// Declared response schema, sent to the service and checked on return
    pub fn schema(&self) -> Schema {
        match self {
            AdvisoryRequest::LoanEligibility { .. } => Schema::object()
                .field("eligibility", Schema::one_of(&["Eligible", "Not Eligible"]))
                .field("confidenceScore", Schema::number().describe("0-100"))
                .field("explanation", Schema::string().describe("max 50 words"))
                .field("monthlyPayment", Schema::number())
                .field("maxLoanAmount", Schema::number()),
            AdvisoryRequest::GoalProjection { .. } => Schema::object()
                .field("likelihood", Schema::number().describe("0-100"))
                .field("predictedDate", Schema::string().describe("YYYY-MM"))
                .field("suggestions", Schema::string_array()),
            AdvisoryRequest::RetirementReadiness { .. } => Schema::object()
                .field("readinessScore", Schema::number().describe("0-100"))
                .field("predictedCorpus", Schema::number())
                .field("suggestions", Schema::string_array()),
            AdvisoryRequest::TaxEstimate { .. } => Schema::object()
                .field("estimatedTax", Schema::number())
                .field("effectiveTaxRate", Schema::number())
                .field(
                    "breakdown",
                    Schema::object()
                        .field("incomeTax", Schema::number())
                        .field("surcharge", Schema::number()),
                )
                .field("tips", Schema::string_array()),
            AdvisoryRequest::CreditTips { .. } => {
                Schema::object().field("tips", Schema::string_array())
            }
            AdvisoryRequest::InsuranceAdvice { .. } => Schema::object().field(
                "recommendations",
                Schema::array(
                    Schema::object()
                        .field("type", Schema::string())
                        .field("reason", Schema::string()),
                ),
            ),
            AdvisoryRequest::PortfolioAdvice { .. } => {
                Schema::object().field("suggestions", Schema::string_array())
            }
            AdvisoryRequest::WithdrawalSustainability { .. } => Schema::object()
                .field("isSustainable", Schema::boolean())
                .field("fundsDepleteAge", Schema::number().describe("999 if sustainable"))
                .field("suggestion", Schema::string()),
            AdvisoryRequest::HealthScore { .. } => Schema::object()
                .field("score", Schema::number().describe("0-100"))
                .field("summary", Schema::string())
                .field("suggestions", Schema::string_array()),
            AdvisoryRequest::BudgetOptimization { .. } => Schema::object()
                .field("suggestedSavingsRatio", Schema::number().describe("percentage"))
                .field("advice", Schema::string()),
            AdvisoryRequest::QuizGeneration { question_count, .. } => {
                if *question_count <= 1 {
                    quiz_question_schema()
                } else {
                    Schema::object().field("quiz", Schema::array(quiz_question_schema()))
                }
            }
            AdvisoryRequest::CategorySuggestion { .. } => {
                Schema::object().field("category", Schema::one_of(EXPENSE_CATEGORIES))
            }
            AdvisoryRequest::FraudTip => Schema::object().field("tip", Schema::string()),
            AdvisoryRequest::FinancialFact => Schema::object().field("fact", Schema::string()),
            AdvisoryRequest::LessonRecommendation { .. } => Schema::object()
                .field("recommendedLessonId", Schema::string())
                .field("reason", Schema::string()),
            AdvisoryRequest::HealthcareCost { .. } => Schema::object()
                .field("predictedAnnualCost", Schema::number())
                .field(
                    "costBreakdown",
                    Schema::object()
                        .field("premiums", Schema::number())
                        .field("medication", Schema::number())
                        .field("outOfPocket", Schema::number()),
                )
                .field("suggestion", Schema::string()),
            AdvisoryRequest::StudentLoan { .. } => Schema::object()
                .field("monthlyPayment", Schema::number())
                .field("summary", Schema::string())
                .field("tips", Schema::string_array()),
            AdvisoryRequest::SpendingTrend { .. } => {
                Schema::object().field("summary", Schema::string())
            }
            AdvisoryRequest::BudgetingAdvice { .. } => {
                Schema::object().field("advice", Schema::string())
            }
        }
    }

    /// Natural-language instruction embedding the request's fields
    pub fn instruction(&self) -> String {
        match self {
            AdvisoryRequest::LoanEligibility {
                age,
                monthly_income,
                monthly_expenses,
                loan_amount,
                credit_score,
            } => format!(
                "Act as a loan eligibility prediction model. Decide whether this applicant is likely to be approved.\n\n\
                 - Age: {}\n- Monthly Income: ₹{}\n- Monthly Expenses: ₹{}\n- Loan Amount: ₹{}\n- Credit Score: {}\n\n\
                 Give a confidence score from 0 to 100, a short explanation (max 50 words), \
                 the estimated monthly payment and a suggested maximum loan amount.",
                age, monthly_income, monthly_expenses, loan_amount, credit_score
            ),
            AdvisoryRequest::GoalProjection { goal } => format!(
                "Act as a financial analyst reviewing a savings goal.\n\n\
                 - Goal Name: {}\n- Target Amount: ₹{}\n- Current Amount Saved: ₹{}\n\
                 - Planned Monthly Contribution: ₹{}\n- Target Deadline: {}\n\n\
                 Work out the remaining amount and the months needed at the current contribution, \
                 predict the completion month as YYYY-MM, and rate the likelihood (0-100) of meeting the deadline: \
                 90-100 if on or before it, moderate if slightly after, low if far off. \
                 Give 2-3 concise, actionable suggestions.",
                goal.name,
                goal.target_amount,
                goal.current_amount,
                goal.monthly_contribution,
                goal.deadline.format("%Y-%m-%d")
            ),
            AdvisoryRequest::RetirementReadiness {
                age,
                current_savings,
                monthly_contribution,
            } => format!(
                "Act as a retirement planner.\n\n\
                 - Current Age: {}\n- Current Retirement Savings: ₹{}\n- Monthly Contribution: ₹{}\n\n\
                 Assume retirement at 65 and a 7% annual return compounded annually. \
                 Project the total corpus at 65 (future value of savings plus contributions as an annuity). \
                 Score readiness 0-100 against a ₹2 crore target (₹1 crore is about 40-50, ₹2 crore about 80, ₹3 crore about 95). \
                 Give 2 concise suggestions.",
                age, current_savings, monthly_contribution
            ),
            AdvisoryRequest::TaxEstimate {
                annual_income,
                annual_deductions,
            } => format!(
                "Act as a tax calculator using Indian income tax slabs (New Regime).\n\n\
                 - Annual Income: ₹{}\n- Annual Deductions: ₹{} (most deductions are not allowed in the new regime; \
                 apply the ₹50,000 standard deduction where applicable)\n\n\
                 Compute taxable income, total tax, the effective tax rate, and give one tax-saving tip.",
                annual_income, annual_deductions
            ),
            AdvisoryRequest::CreditTips { credit_score } => format!(
                "Act as a credit advisor. A young adult has a credit score of {}. \
                 Provide 3 concise, actionable tips to improve or maintain this score.",
                credit_score
            ),
            AdvisoryRequest::InsuranceAdvice {
                has_family,
                owns_home,
            } => format!(
                "Act as an insurance advisor.\n\n- Has a family: {}\n- Owns a home: {}\n\n\
                 Always recommend Health Insurance. Recommend Term Life Insurance if they have a family \
                 and Homeowners Insurance if they own a home. Give a one-sentence reason for each.",
                has_family, owns_home
            ),
            AdvisoryRequest::PortfolioAdvice { holdings } => format!(
                "Act as an investment advisor. Analyze this portfolio allocation:\n{}\n\n\
                 Give 2 concise, general, educational suggestions for rebalancing or diversification.",
                to_json_text(holdings)
            ),
            AdvisoryRequest::WithdrawalSustainability {
                corpus,
                monthly_withdrawal,
                age,
            } => format!(
                "Act as a retirement fund sustainability calculator for a senior citizen.\n\n\
                 - Total Retirement Corpus: ₹{}\n- Desired Monthly Withdrawal: ₹{}\n- Current Age: {}\n\n\
                 Assume a 5% annual return on the corpus. Decide whether the annual withdrawal is sustainable \
                 (no more than the annual return). If not, give the age at which funds run out; return 999 if sustainable. \
                 Give one suggestion for making the funds last longer.",
                corpus, monthly_withdrawal, age
            ),
            AdvisoryRequest::HealthScore {
                monthly_income,
                total_savings,
                monthly_expenses,
            } => format!(
                "Act as a financial health analyst.\n\n\
                 - Monthly Income: ₹{}\n- Total Savings/Investments: ₹{}\n- Monthly Expenses: ₹{}\n\n\
                 Score financial health 0-100 from the savings rate ((income - expenses) / income, above 20% is excellent) \
                 and the savings-to-income ratio (savings / (income * 12), above 1 is good). \
                 Give a one-sentence summary and one key suggestion.",
                monthly_income, total_savings, monthly_expenses
            ),
            AdvisoryRequest::BudgetOptimization { transactions } => format!(
                "Act as a budget optimization assistant. Analyze these transactions:\n{}\n\n\
                 Find total spending and the top category, suggest a savings ratio (percentage) assuming an income of ₹50,000, \
                 and give one concise piece of advice for the highest category.",
                transactions_json(transactions)
            ),
            AdvisoryRequest::QuizGeneration {
                topic,
                question_count,
            } => {
                if *question_count <= 1 {
                    format!(
                        "Create one multiple-choice quiz question about the basics of {} suitable for a teenager. \
                         Provide exactly 4 distinct answer options. The 'answer' must be one of the strings in 'options'.",
                        topic
                    )
                } else {
                    format!(
                        "Create a {}-question multiple-choice quiz about the basics of {} for teenagers. \
                         Each question has exactly 4 distinct answer options, and its 'answer' must be one of its own 'options'. \
                         Put the questions in an array under the key \"quiz\".",
                        question_count, topic
                    )
                }
            }
            AdvisoryRequest::CategorySuggestion { description } => format!(
                "Categorize this expense description into one of these categories: {}.\n\nExpense: \"{}\"",
                EXPENSE_CATEGORIES.join(", "),
                description
            ),
            AdvisoryRequest::FraudTip => "Act as a fraud prevention expert for senior citizens. \
                 Provide one concise, easy-to-understand tip (at most two sentences) for avoiding common financial scams."
                .to_string(),
            AdvisoryRequest::FinancialFact => "Provide one fun, interesting, easy-to-understand financial fact \
                 suitable for a teenager, in 1-2 sentences."
                .to_string(),
            AdvisoryRequest::LessonRecommendation {
                completed_lesson_ids,
                available_lessons,
            } => format!(
                "A teenager has completed lessons with these IDs: [{}].\n\
                 Available lessons: {}\n\n\
                 Pick the single best lesson to take next and give a short, encouraging one-sentence reason.",
                completed_lesson_ids.join(", "),
                to_json_text(available_lessons)
            ),
            AdvisoryRequest::HealthcareCost { age } => format!(
                "Act as a healthcare cost prediction model for a senior citizen aged {}. \
                 Estimate the annual healthcare budget broken down into insurance premiums, medication and \
                 out-of-pocket costs, and give one brief tip (max 40 words) for managing healthcare costs in retirement.",
                age
            ),
            AdvisoryRequest::StudentLoan {
                amount,
                annual_interest_rate,
            } => format!(
                "Act as a student loan advisor for a young adult.\n\n- Amount: ₹{}\n- Interest Rate: {}%\n\n\
                 Compute the monthly payment for a standard 10-year plan with M = P[i(1+i)^n]/[(1+i)^n - 1], \
                 i = annual rate / 12, n = 120, rounded to 2 decimals. \
                 Give a one-sentence summary of the loan's impact and 2 tips for managing it.",
                amount, annual_interest_rate
            ),
            AdvisoryRequest::SpendingTrend { transactions } => format!(
                "Act as a financial analyst. Compare total spending in the most recent 7 days with the 7 days before, \
                 and summarize the most significant trend in one easy-to-understand sentence.\n\nTransactions:\n{}",
                transactions_json(transactions)
            ),
            AdvisoryRequest::BudgetingAdvice {
                needs,
                wants,
                savings,
            } => format!(
                "Act as a financial advisor for a young adult using the 50/30/20 rule.\n\n\
                 - Needs: ₹{}\n- Wants: ₹{}\n- Savings: ₹{}\n\n\
                 Give one concise, encouraging piece of advice to align better with the rule.",
                needs, wants, savings
            ),
        }
    }

    /// Full prompt: instruction followed by the expected JSON skeleton
    pub fn prompt(&self) -> String {
        let outline = serde_json::to_string_pretty(&self.schema().outline())
            .unwrap_or_else(|_| "{}".to_string());
        format!(
            "{}\n\nReturn ONLY a JSON value with this structure:\n{}",
            self.instruction(),
            outline
        )
    }

    /// Parse and validate a raw response. All-or-nothing.
    pub fn parse_response(&self, raw: &str) -> Result<AdvisoryPayload> {
        let cleaned = strip_code_fence(raw);

        let value: Value = serde_json::from_str(cleaned).map_err(|e| {
            CoachError::SchemaViolation(format!("response is not valid JSON: {}", e))
        })?;

        self.schema().check(&value).map_err(CoachError::SchemaViolation)?;

        let payload = match self {
            AdvisoryRequest::LoanEligibility { .. } => AdvisoryPayload::LoanEligibility(typed(value)?),
            AdvisoryRequest::GoalProjection { .. } => {
                let prediction: GoalPrediction = typed(value)?;
                check_month(&prediction.predicted_date).map_err(CoachError::SchemaViolation)?;
                AdvisoryPayload::GoalProjection(prediction)
            }
            AdvisoryRequest::RetirementReadiness { .. } => {
                AdvisoryPayload::RetirementReadiness(typed(value)?)
            }
            AdvisoryRequest::TaxEstimate { .. } => AdvisoryPayload::TaxEstimate(typed(value)?),
            AdvisoryRequest::CreditTips { .. } => AdvisoryPayload::CreditTips(typed(value)?),
            AdvisoryRequest::InsuranceAdvice { .. } => AdvisoryPayload::InsuranceAdvice(typed(value)?),
            AdvisoryRequest::PortfolioAdvice { .. } => AdvisoryPayload::PortfolioAdvice(typed(value)?),
            AdvisoryRequest::WithdrawalSustainability { .. } => {
                AdvisoryPayload::WithdrawalSustainability(typed(value)?)
            }
            AdvisoryRequest::HealthScore { .. } => AdvisoryPayload::HealthScore(typed(value)?),
            AdvisoryRequest::BudgetOptimization { .. } => {
                AdvisoryPayload::BudgetOptimization(typed(value)?)
            }
            AdvisoryRequest::QuizGeneration { question_count, .. } => {
                let questions: Vec<QuizQuestion> = if *question_count <= 1 {
                    vec![typed(value)?]
                } else {
                    typed::<QuizEnvelope>(value)?.quiz
                };
                for (i, q) in questions.iter().enumerate() {
                    check_quiz_question(i, q).map_err(CoachError::SchemaViolation)?;
                }
                AdvisoryPayload::Quiz(questions)
            }
            AdvisoryRequest::CategorySuggestion { .. } => {
                let suggestion: CategorySuggestion = typed(value)?;
                check_category(&suggestion.category).map_err(CoachError::SchemaViolation)?;
                AdvisoryPayload::CategorySuggestion(suggestion)
            }
            AdvisoryRequest::FraudTip => AdvisoryPayload::FraudTip(typed(value)?),
            AdvisoryRequest::FinancialFact => AdvisoryPayload::FinancialFact(typed(value)?),
            AdvisoryRequest::LessonRecommendation { available_lessons, .. } => {
                let rec: LessonRecommendation = typed(value)?;
                if !available_lessons.iter().any(|l| l.id == rec.recommended_lesson_id) {
                    return Err(CoachError::SchemaViolation(format!(
                        "recommended lesson '{}' was not offered",
                        rec.recommended_lesson_id
                    )));
                }
                AdvisoryPayload::LessonRecommendation(rec)
            }
            AdvisoryRequest::HealthcareCost { .. } => AdvisoryPayload::HealthcareCost(typed(value)?),
            AdvisoryRequest::StudentLoan { .. } => AdvisoryPayload::StudentLoan(typed(value)?),
            AdvisoryRequest::SpendingTrend { .. } => AdvisoryPayload::SpendingTrend(typed(value)?),
            AdvisoryRequest::BudgetingAdvice { .. } => AdvisoryPayload::BudgetingAdvice(typed(value)?),
        };

        Ok(payload)
    }
}

fn quiz_question_schema() -> Schema {
    Schema::object()
        .field("question", Schema::string())
        .field("options", Schema::string_array().describe("exactly 4 distinct options"))
        .field("answer", Schema::string().describe("one of options"))
}

fn typed<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| CoachError::SchemaViolation(e.to_string()))
}

fn to_json_text<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

fn transactions_json(transactions: &[Transaction]) -> String {
    let rows: Vec<Value> = transactions
        .iter()
        .map(|t| {
            json!({
                "date": t.date.format("%Y-%m-%d").to_string(),
                "description": t.description,
                "category": t.category,
                "amount": t.amount,
            })
        })
        .collect();
    Value::Array(rows).to_string()
}

/// Remove a Markdown code fence the service sometimes wraps JSON in
pub fn strip_code_fence(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
