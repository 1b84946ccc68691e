use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised while building a question from upstream data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id} marks option {index} correct but only has {len} options")]
    AnswerOutOfRange {
        id: QuestionId,
        index: usize,
        len: usize,
    },
}

//
// ─── ANSWER KEY ───────────────────────────────────────────────────────────────
//

/// Canonical correct-answer slot of a question, fixed once at ingestion.
///
/// `Missing` and `Ambiguous` are kept rather than rejected so the attempt can
/// surface the problem when the learner reaches the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerKey {
    Resolved { index: usize },
    Missing,
    Ambiguous { candidates: Vec<usize> },
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with an ordered option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    answer: AnswerKey,
}

impl Question {
    /// Build a question whose correct option is known.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoOptions` for an empty option list and
    /// `QuestionError::AnswerOutOfRange` if `correct_index` is not a valid option.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Result<Self, QuestionError> {
        Self::with_answer_key(
            id,
            text,
            options,
            AnswerKey::Resolved {
                index: correct_index,
            },
        )
    }

    /// Build a question from an already-normalized answer key.
    ///
    /// # Errors
    ///
    /// Same as [`Question::new`]; ambiguous candidates are range-checked too.
    pub fn with_answer_key(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        answer: AnswerKey,
    ) -> Result<Self, QuestionError> {
        if options.is_empty() {
            return Err(QuestionError::NoOptions { id });
        }
        let len = options.len();
        let out_of_range = match &answer {
            AnswerKey::Resolved { index } => (*index >= len).then_some(*index),
            AnswerKey::Ambiguous { candidates } => candidates.iter().copied().find(|i| *i >= len),
            AnswerKey::Missing => None,
        };
        if let Some(index) = out_of_range {
            return Err(QuestionError::AnswerOutOfRange { id, index, len });
        }

        Ok(Self {
            id,
            text: text.into(),
            options,
            answer,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer_key(&self) -> &AnswerKey {
        &self.answer
    }

    /// The canonical correct index, if one was resolved at ingestion.
    #[must_use]
    pub fn correct_index(&self) -> Option<usize> {
        match self.answer {
            AnswerKey::Resolved { index } => Some(index),
            _ => None,
        }
    }
}

//
// ─── QUIZ ─────────────────────────────────────────────────────────────────────
//

/// Ordered list of questions attached to a section.
///
/// An empty quiz can be constructed (upstream data may be broken); starting
/// an attempt on it is what fails.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Quiz {
    questions: Vec<Question>,
}

impl Quiz {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn rejects_empty_options() {
        let err = Question::new(QuestionId::new("q1"), "Q", Vec::new(), 0).unwrap_err();
        assert!(matches!(err, QuestionError::NoOptions { .. }));
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let err = Question::new(QuestionId::new("q1"), "Q", options(), 3).unwrap_err();
        assert_eq!(
            err,
            QuestionError::AnswerOutOfRange {
                id: QuestionId::new("q1"),
                index: 3,
                len: 3
            }
        );
    }

    #[test]
    fn missing_key_is_kept() {
        let q = Question::with_answer_key(QuestionId::new("q1"), "Q", options(), AnswerKey::Missing)
            .unwrap();
        assert_eq!(q.correct_index(), None);
    }

    #[test]
    fn quiz_exposes_questions_in_order() {
        let quiz = Quiz::new(vec![
            Question::new(QuestionId::new("q1"), "first", options(), 0).unwrap(),
            Question::new(QuestionId::new("q2"), "second", options(), 2).unwrap(),
        ]);
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz.question(1).unwrap().text(), "second");
        assert!(quiz.question(2).is_none());
        assert!(Quiz::default().is_empty());
    }
}
