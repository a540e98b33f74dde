//! Internal error type for the sampler.
//!
//! None of these variants are ever allowed to propagate out of the public
//! `Controller` API. Every public operation converts them into the
//! documented null-move / uniform-distribution / warning-log outcome before
//! returning. The type exists so internal plumbing can use `?` and so the
//! verifier can observe failures it deliberately provokes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PisError {
    #[error("configuration invalid: {reason}")]
    InvalidConfig { reason: String },

    #[error("integrity gate failed: {reason}")]
    IntegrityGate { reason: String },

    #[error("backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("evaluation failed for move {mv}: {reason}")]
    EvaluationFailed { mv: String, reason: String },

    #[error("no legal moves in position")]
    NoLegalMoves,

    #[error("empty result set after sampling")]
    EmptyResultSet,

    #[error("logger sink error: {0}")]
    LoggerSink(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PisResult<T> = Result<T, PisError>;
