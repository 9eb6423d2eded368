//! Financial Literacy Coach
//!
//! Advisory subsystem behind a cohort-aware financial coaching app:
//! - Typed advisory requests with declared response schemas
//! - Strict validation of every generative response before it is surfaced
//! - Streaming chat sessions with a per-cohort persona
//! - Quizzes, lessons and an idempotent badge ledger
//! - Debounced expense category suggestions (last request wins)

pub mod app;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod contract;
pub mod error;
pub mod expenses;
pub mod gateway;
pub mod gemini;
pub mod ledger;
pub mod models;
pub mod quiz;
pub mod suggest;

pub use error::{CoachError, Result};

// Re-export common types
pub use app::AppContext;
pub use config::CoachConfig;
pub use contract::{AdvisoryPayload, AdvisoryRequest};
pub use gateway::{AdvisoryGateway, AdvisoryResult, AdvisoryService};
pub use models::*;
