// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Difficulty fractions are not finite, negative, or do not sum to 1.
    #[error("Invalid difficulty mix [{0:.3}, {1:.3}, {2:.3}]: fractions must be non-negative and sum to 1")]
    InvalidMix(f64, f64, f64),

    /// Fewer candidates than requested. Usually carried on `Selection` rather than returned.
    #[error("Pool exhausted: {available} of {requested} questions available")]
    PoolExhausted { requested: usize, available: usize },

    #[error("Submission contains no answers matching the quiz")]
    EmptySubmission,

    #[error("Invalid study budget: block length must be at least one minute")]
    InvalidBudget,

    #[error("Unknown quiz: {0}")]
    UnknownQuiz(String),

    #[error("Question pool provider failed: {0}")]
    Provider(String),

    #[error("Corrupt stored record: {0}")]
    Corrupt(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
