//! Error taxonomy for the tutoring core
//!
//! Plumbing (CLI, config, server start-up) uses `anyhow`; the core returns
//! `TutorError` so callers can tell a missing session from a failed model call.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TutorError {
    /// Network/model failure or a response that could not be turned into data
    #[error("Generation error: {0}")]
    Generation(String),

    /// Session or incorrect-answer artifact absent
    #[error("{0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TutorError {
    pub fn generation(msg: impl Into<String>) -> Self {
        TutorError::Generation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        TutorError::NotFound(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TutorError::NotFound(_))
    }
}

pub type TutorResult<T> = std::result::Result<T, TutorError>;
