//! Error types for the financial literacy coach

use thiserror::Error;

/// Result type alias for coach operations
pub type Result<T> = std::result::Result<T, CoachError>;

#[derive(Error, Debug)]
pub enum CoachError {

    // =============================
    // Advisory Errors
    // =============================

    /// Network failure or non-success response from the generative service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response shape does not match the declared contract
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Structurally valid but semantically empty (e.g. zero quiz questions)
    #[error("Empty result: {0}")]
    EmptyResult(String),

    // =============================
    // Client-side Errors
    // =============================

    /// Rejected before any request is issued
    #[error("Invalid input: {0}")]
    UserInput(String),

    #[error("A reply is still streaming; wait for it to finish")]
    SessionBusy,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}
