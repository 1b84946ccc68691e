mod attempt;
mod runner;
mod session;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use attempt::{QuizAttempt, QuizStatus};
pub use runner::{AnswerResult, QuizRunner};
pub use session::{CompletionSignal, QuizSession, SubmitOutcome};
