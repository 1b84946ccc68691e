#![forbid(unsafe_code)]

pub mod app_services;
pub mod completion;
pub mod config;
pub mod error;
pub mod progression;
pub mod quiz;
pub mod xp_history_service;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use completion::{CompletionCoordinator, CompletionOutcome};
pub use config::ProgressionConfig;
pub use error::{AppServicesError, CompletionError, ConfigError, ProgressionError, QuizError};
pub use progression::{MergeOutcome, ProgressionEvent, ProgressionTracker};
pub use quiz::{
    AnswerResult, CompletionSignal, QuizAttempt, QuizRunner, QuizSession, QuizStatus,
    SubmitOutcome,
};
pub use xp_history_service::{XpChart, XpHistoryService};
