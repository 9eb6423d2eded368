//! Advisory gateway
//!
//! Single entry point for every structured advisory call. `submit` always
//! resolves: transport errors, timeouts and invalid responses all come back
//! as `AdvisoryResult::Failure`. There is no retry here; callers re-submit.

use crate::contract::{AdvisoryPayload, AdvisoryRequest, Schema};
use crate::error::CoachError;
use crate::models::Sender;
use crate::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod mock;
pub use mock::MockAdvisoryService;

/// Lazy, finite sequence of reply text deltas
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// One prior turn replayed to the service with a chat message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: Sender,
    pub text: String,
}

impl ChatTurn {
    pub fn new(role: Sender, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Generative advisory service (remote model or scripted mock)
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    /// One-shot structured generation; returns the raw response text
    async fn generate(&self, prompt: &str, schema: &Schema) -> Result<String>;

    /// Open a streamed chat reply
    async fn stream_chat(
        &self,
        directive: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChunkStream>;
}

/// Outcome of one advisory submission
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisoryResult {
    Success(AdvisoryPayload),
    Failure { reason: String },
}

impl AdvisoryResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        AdvisoryResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AdvisoryResult::Success(_))
    }

    pub fn payload(&self) -> Option<&AdvisoryPayload> {
        match self {
            AdvisoryResult::Success(payload) => Some(payload),
            AdvisoryResult::Failure { .. } => None,
        }
    }

    /// Convert back into the error taxonomy; failures become `Transport`
    pub fn into_result(self) -> Result<AdvisoryPayload> {
        match self {
            AdvisoryResult::Success(payload) => Ok(payload),
            AdvisoryResult::Failure { reason } => Err(CoachError::Transport(reason)),
        }
    }
}

/// Stateless front door to the advisory service
#[derive(Clone)]
pub struct AdvisoryGateway {
    service: Arc<dyn AdvisoryService>,
    timeout: Duration,
}

impl AdvisoryGateway {
    pub fn new(service: Arc<dyn AdvisoryService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub fn service(&self) -> Arc<dyn AdvisoryService> {
        Arc::clone(&self.service)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Submit a request and validate the response against its contract
    pub async fn submit(&self, request: &AdvisoryRequest) -> AdvisoryResult {
        let kind = request.kind();

        if let Some(payload) = request.local_answer() {
            debug!(%kind, "advisory request answered locally");
            return AdvisoryResult::Success(payload);
        }

        info!(%kind, timeout_ms = self.timeout.as_millis() as u64, "submitting advisory request");

        let schema = request.schema();
        let prompt = request.prompt();

        let raw = match tokio::time::timeout(self.timeout, self.service.generate(&prompt, &schema)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(%kind, error = %e, "advisory call failed");
                return AdvisoryResult::failure(e.to_string());
            }
            Err(_) => {
                warn!(%kind, "advisory call timed out");
                return AdvisoryResult::failure(format!(
                    "advisory service did not respond within {} ms",
                    self.timeout.as_millis()
                ));
            }
        };

        match request.parse_response(&raw) {
            Ok(payload) => {
                debug!(%kind, "advisory response validated");
                AdvisoryResult::Success(payload)
            }
            Err(e) => {
                warn!(%kind, error = %e, "advisory response rejected");
                AdvisoryResult::failure(e.to_string())
            }
        }
    }

    /// Open a chat reply stream under the same timeout policy.
    ///
    /// The timeout bounds the open and then every wait for the next delta, so
    /// a service that connects lazily or goes quiet mid-reply still fails.
    pub async fn open_chat(
        &self,
        directive: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChunkStream> {
        debug!(turns = history.len(), "opening chat stream");
        let chunks = tokio::time::timeout(
            self.timeout,
            self.service.stream_chat(directive, history, message),
        )
        .await
        .map_err(|_| {
            CoachError::Transport(format!(
                "chat stream did not open within {} ms",
                self.timeout.as_millis()
            ))
        })??;

        Ok(with_idle_timeout(chunks, self.timeout))
    }
}

/// Ends the stream with a `Transport` error once no delta arrives within `idle`
fn with_idle_timeout(chunks: ChunkStream, idle: Duration) -> ChunkStream {
    stream::unfold(Some(chunks), move |state| async move {
        let Some(mut chunks) = state else {
            return None;
        };
        match tokio::time::timeout(idle, chunks.next()).await {
            Ok(Some(item)) => Some((item, Some(chunks))),
            Ok(None) => None,
            Err(_) => {
                warn!(idle_ms = idle.as_millis() as u64, "chat stream went quiet");
                let err = CoachError::Transport(format!(
                    "no reply data within {} ms",
                    idle.as_millis()
                ));
                Some((Err(err), None))
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::contract::*;
    use crate::models::{FinancialGoal, PortfolioHolding};
    use chrono::NaiveDate;

    fn gateway(mock: &Arc<MockAdvisoryService>) -> AdvisoryGateway {
        AdvisoryGateway::new(mock.clone(), Duration::from_secs(30))
    }

    /// One request of every variant that reaches the service
    fn every_remote_request() -> Vec<AdvisoryRequest> {
        vec![
            AdvisoryRequest::LoanEligibility {
                age: 30,
                monthly_income: 70000.0,
                monthly_expenses: 25000.0,
                loan_amount: 300000.0,
                credit_score: 720,
            },
            AdvisoryRequest::GoalProjection {
                goal: FinancialGoal {
                    name: "Trip".to_string(),
                    target_amount: 100000.0,
                    current_amount: 20000.0,
                    monthly_contribution: 8000.0,
                    deadline: NaiveDate::from_ymd_opt(2027, 12, 1).unwrap(),
                },
            },
            AdvisoryRequest::RetirementReadiness {
                age: 40,
                current_savings: 1500000.0,
                monthly_contribution: 20000.0,
            },
            AdvisoryRequest::TaxEstimate {
                annual_income: 1200000.0,
                annual_deductions: 50000.0,
            },
            AdvisoryRequest::CreditTips { credit_score: 650 },
            AdvisoryRequest::InsuranceAdvice {
                has_family: true,
                owns_home: false,
            },
            AdvisoryRequest::PortfolioAdvice {
                holdings: vec![PortfolioHolding {
                    name: "Index Fund".to_string(),
                    value: 50000.0,
                }],
            },
            AdvisoryRequest::WithdrawalSustainability {
                corpus: 5000000.0,
                monthly_withdrawal: 30000.0,
                age: 65,
            },
            AdvisoryRequest::HealthScore {
                monthly_income: 90000.0,
                total_savings: 400000.0,
                monthly_expenses: 50000.0,
            },
            AdvisoryRequest::BudgetOptimization { transactions: vec![] },
            AdvisoryRequest::quiz("Saving", 3),
            AdvisoryRequest::quiz("compound interest", 1),
            AdvisoryRequest::category("Bus ticket"),
            AdvisoryRequest::FraudTip,
            AdvisoryRequest::FinancialFact,
            AdvisoryRequest::lesson_recommendation(&[]),
            AdvisoryRequest::HealthcareCost { age: 68 },
            AdvisoryRequest::StudentLoan {
                amount: 800000.0,
                annual_interest_rate: 9.5,
            },
            AdvisoryRequest::SpendingTrend { transactions: vec![] },
            AdvisoryRequest::BudgetingAdvice {
                needs: 25000.0,
                wants: 15000.0,
                savings: 5000.0,
            },
        ]
    }

    #[tokio::test]
    async fn test_schema_violation_is_failure_for_every_variant() {
        for request in every_remote_request() {
            for raw in ["not json at all", "{}", "[1, 2, 3]", r#"{"unexpected": true}"#] {
                let mock = Arc::new(MockAdvisoryService::new());
                mock.push_response(raw);
                let result = gateway(&mock).submit(&request).await;
                assert!(
                    matches!(result, AdvisoryResult::Failure { .. }),
                    "{:?} accepted {:?}",
                    request.kind(),
                    raw
                );
            }
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_failure() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_error("connection reset");
        let result = gateway(&mock).submit(&AdvisoryRequest::FraudTip).await;
        match result {
            AdvisoryResult::Failure { reason } => assert!(reason.contains("connection reset")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_numeric_fields_pass_through() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_response(
            r#"{"estimatedTax":71500,"effectiveTaxRate":5.958,"breakdown":{"incomeTax":68750,"surcharge":2750},"tips":["Invest in NPS"]}"#,
        );
        let request = AdvisoryRequest::TaxEstimate {
            annual_income: 1200000.0,
            annual_deductions: 0.0,
        };
        match gateway(&mock).submit(&request).await {
            AdvisoryResult::Success(AdvisoryPayload::TaxEstimate(tax)) => {
                assert_eq!(tax.estimated_tax, 71500.0);
                assert_eq!(tax.effective_tax_rate, 5.958);
                assert_eq!(tax.breakdown.surcharge, 2750.0);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(mock.calls(), 1);
        assert!(mock.prompts()[0].contains("1200000"));
    }

    #[tokio::test]
    async fn test_projection_figures_pass_through() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_response(r#"{"likelihood":73.25,"predictedDate":"2027-09","suggestions":["Add 1500 a month"]}"#);
        mock.push_response(r#"{"readinessScore":41.5,"predictedCorpus":18734520.75,"suggestions":["Raise SIPs"]}"#);
        mock.push_response(r#"{"isSustainable":false,"fundsDepleteAge":81.5,"suggestion":"Withdraw less"}"#);
        let requests = every_remote_request();
        let gateway = gateway(&mock);

        match gateway.submit(&requests[1]).await {
            AdvisoryResult::Success(AdvisoryPayload::GoalProjection(goal)) => {
                assert_eq!(goal.likelihood, 73.25);
                assert_eq!(goal.predicted_date, "2027-09");
            }
            other => panic!("unexpected: {:?}", other),
        }
        match gateway.submit(&requests[2]).await {
            AdvisoryResult::Success(AdvisoryPayload::RetirementReadiness(plan)) => {
                assert_eq!(plan.predicted_corpus, 18734520.75);
                assert_eq!(plan.readiness_score, 41.5);
            }
            other => panic!("unexpected: {:?}", other),
        }
        match gateway.submit(&requests[7]).await {
            AdvisoryResult::Success(AdvisoryPayload::WithdrawalSustainability(plan)) => {
                assert!(!plan.is_sustainable);
                assert_eq!(plan.funds_deplete_age, 81.5);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_failure() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.set_delay(Duration::from_secs(60));
        mock.push_response(r#"{"tip":"Never share your OTP."}"#);
        let gateway = AdvisoryGateway::new(mock.clone(), Duration::from_secs(30));
        let result = gateway.submit(&AdvisoryRequest::FraudTip).await;
        assert!(matches!(result, AdvisoryResult::Failure { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_chat_stream_times_out() {
        let mock = Arc::new(MockAdvisoryService::new());
        mock.push_chat_stalled(&["Hello"]);
        let gateway = AdvisoryGateway::new(mock.clone(), Duration::from_secs(30));

        let mut chunks = gateway.open_chat("Be brief", &[], "Hi").await.unwrap();
        assert_eq!(chunks.next().await.unwrap().unwrap(), "Hello");

        let start = tokio::time::Instant::now();
        assert!(matches!(chunks.next().await, Some(Err(CoachError::Transport(_)))));
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn test_completed_lessons_short_circuit() {
        let mock = Arc::new(MockAdvisoryService::new());
        let all: Vec<String> = catalog::lessons().iter().map(|l| l.id.to_string()).collect();
        let result = gateway(&mock)
            .submit(&AdvisoryRequest::lesson_recommendation(&all))
            .await;
        assert!(result.is_success());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_maps_to_transport_error() {
        let failure = AdvisoryResult::failure("boom");
        assert!(matches!(failure.into_result(), Err(CoachError::Transport(_))));
    }
}
