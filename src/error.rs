//! Error types for the Lifeflow engine

use crate::validation::ValidationError;
use thiserror::Error;

/// Errors raised at the engine's boundaries (parsing, store mutation, export).
///
/// The scoring, correlation and streak engines are total and never return these.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid date key: {0}")]
    InvalidDate(String),

    #[error("Habit not found: {0}")]
    HabitNotFound(String),

    #[error("Wish not found: {0}")]
    WishNotFound(String),

    #[error("No entry for date: {0}")]
    EntryNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
