#![forbid(unsafe_code)]

pub mod error;
pub mod levels;
pub mod model;
pub mod scoring;
pub mod time;
pub mod xp_history;

pub use error::Error;
pub use scoring::{AnswerDefect, ScoringError, is_correct, resolve_correct_index};
pub use time::Clock;
pub use xp_history::aggregate;
