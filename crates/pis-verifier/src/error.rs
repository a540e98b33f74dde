//! Internal error type for the verifier. Mirrors `pis_core::PisError`'s
//! role: used for `?`-propagation inside a single scenario run; a scenario
//! that returns one of these is recorded as a failed/errored result, it
//! never aborts the suite (§4.6, §7: "Verifier scenario exception").

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("report export failed: {0}")]
    ReportExport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VerifierResult<T> = Result<T, VerifierError>;
