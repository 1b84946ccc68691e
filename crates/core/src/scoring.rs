//! Evaluation of a single answered question.
//!
//! Only the canonical answer key is consulted; field-name variants are
//! resolved at ingestion (see [`crate::model::ingest`]).

use thiserror::Error;

use crate::model::{AnswerKey, Question, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("question {question_id} has no usable correct answer: {reason}")]
    AmbiguousOrMissingAnswer {
        question_id: QuestionId,
        reason: AnswerDefect,
    },
}

/// Why a question's correct answer could not be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerDefect {
    Missing,
    Ambiguous(Vec<usize>),
}

impl std::fmt::Display for AnswerDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerDefect::Missing => f.write_str("answer missing"),
            AnswerDefect::Ambiguous(candidates) => {
                write!(f, "conflicting answers {candidates:?}")
            }
        }
    }
}

/// Returns the index of the correct option.
///
/// # Errors
///
/// Returns `ScoringError::AmbiguousOrMissingAnswer` when ingestion could not
/// settle on a single answer.
pub fn resolve_correct_index(question: &Question) -> Result<usize, ScoringError> {
    match question.answer_key() {
        AnswerKey::Resolved { index } => Ok(*index),
        AnswerKey::Missing => Err(ScoringError::AmbiguousOrMissingAnswer {
            question_id: question.id().clone(),
            reason: AnswerDefect::Missing,
        }),
        AnswerKey::Ambiguous { candidates } => Err(ScoringError::AmbiguousOrMissingAnswer {
            question_id: question.id().clone(),
            reason: AnswerDefect::Ambiguous(candidates.clone()),
        }),
    }
}

/// Whether `selected` is the correct option of `question`.
///
/// # Errors
///
/// Propagates [`resolve_correct_index`] failures.
pub fn is_correct(question: &Question, selected: usize) -> Result<bool, ScoringError> {
    Ok(resolve_correct_index(question)? == selected)
}
