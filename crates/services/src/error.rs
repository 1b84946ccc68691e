//! Shared error types for the services crate.

use thiserror::Error;

use course_core::ScoringError;
use course_core::model::SectionId;
use remote::{HttpConfigError, RemoteError};

use crate::quiz::QuizStatus;

/// Errors emitted by `QuizSession` and `QuizRunner`.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    EmptyQuiz,
    #[error("section {0} has no quiz")]
    MissingQuiz(SectionId),
    #[error("cannot {action} while quiz is {status}")]
    InvalidState {
        action: &'static str,
        status: QuizStatus,
    },
    #[error("no option selected")]
    NoSelection,
    #[error("option {index} is out of range for {len} options")]
    OptionOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("quiz runner has been disposed")]
    Disposed,
}

/// Errors emitted by `CompletionCoordinator`.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("section completion failed: {0}")]
    Remote(#[from] RemoteError),
}

/// Errors emitted by `ProgressionTracker`.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressionError {
    #[error("progression refresh failed: {0}")]
    Fetch(#[from] RemoteError),
}

/// Errors emitted while reading service configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid LEARN_PROGRESSION_REFRESH_SECS value: {0}")]
    InvalidRefreshInterval(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Http(#[from] HttpConfigError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
