//! Error types.
//!
//! - [`FitError`]: typed failures raised by the numeric core and the ingest
//!   layer, at the point of detection.
//! - [`AppError`]: the command-boundary error carrying a process exit code.
//!
//! Core errors convert into `AppError` via `From`, so `?` works all the way
//! up to `app::run`.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of ingest, estimation and simulation.
#[derive(Debug, Error)]
pub enum FitError {
    /// The file is not a delimited table we can read.
    #[error("{path}: {reason}")]
    FileFormat { path: String, reason: String },

    /// Two sequences that must be aligned sample-for-sample are not.
    #[error("input mismatch: {what} (expected {expected}, found {found})")]
    InputMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Normalization or fitting input carries no usable range.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Missing/malformed columns or events.
    #[error("schema error: {0}")]
    Schema(String),

    /// The nonlinear solver gave up.
    #[error("fit did not converge after {iterations} iterations: {reason}")]
    FitConvergence { iterations: usize, reason: String },

    /// A model function was evaluated outside its domain.
    #[error("domain error: {0}")]
    Domain(String),

    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FitError {
    /// Process exit code used when this error reaches the command boundary.
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::FileFormat { .. } | FitError::Schema(_) | FitError::Io { .. } => 2,
            FitError::InputMismatch { .. } | FitError::DegenerateInput(_) => 3,
            FitError::FitConvergence { .. } | FitError::Domain(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_errors_map_to_exit_codes() {
        let schema: AppError = FitError::Schema("missing column `y`".to_string()).into();
        assert_eq!(schema.exit_code(), 2);
        assert!(schema.to_string().contains("missing column `y`"));

        let mismatch: AppError = FitError::InputMismatch {
            what: "time/output length",
            expected: 3,
            found: 2,
        }
        .into();
        assert_eq!(mismatch.exit_code(), 3);

        let conv: AppError = FitError::FitConvergence {
            iterations: 200,
            reason: "iteration limit reached".to_string(),
        }
        .into();
        assert_eq!(conv.exit_code(), 4);
    }
}
