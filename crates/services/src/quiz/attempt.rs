use chrono::{DateTime, Utc};
use course_core::model::AttemptId;
use std::fmt;

/// Where a quiz attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStatus {
    NotStarted,
    /// Waiting for an answer to the question at `index`.
    Asking { index: usize },
    Passed,
    /// The question at `question_index` was answered wrongly.
    Failed { question_index: usize },
    /// A question had no usable correct answer; the attempt cannot continue.
    Error,
}

impl QuizStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QuizStatus::Passed | QuizStatus::Failed { .. } | QuizStatus::Error
        )
    }
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizStatus::NotStarted => f.write_str("not started"),
            QuizStatus::Asking { index } => write!(f, "asking question {}", index + 1),
            QuizStatus::Passed => f.write_str("passed"),
            QuizStatus::Failed { .. } => f.write_str("failed"),
            QuizStatus::Error => f.write_str("in error"),
        }
    }
}

/// One run through a quiz: where it stands, the pending choice and the
/// answers given so far. Replaced wholesale on retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    id: AttemptId,
    started_at: Option<DateTime<Utc>>,
    status: QuizStatus,
    pending: Option<usize>,
    answers: Vec<usize>,
}

impl QuizAttempt {
    pub(crate) fn fresh() -> Self {
        Self {
            id: AttemptId::generate(),
            started_at: None,
            status: QuizStatus::NotStarted,
            pending: None,
            answers: Vec::new(),
        }
    }

    pub(crate) fn begin(&mut self, at: DateTime<Utc>) {
        self.started_at = Some(at);
        self.pending = None;
        self.status = QuizStatus::Asking { index: 0 };
    }

    pub(crate) fn select(&mut self, option: usize) {
        self.pending = Some(option);
    }

    /// Consume the pending choice as the answer to the current question.
    pub(crate) fn record(&mut self, selected: usize) {
        self.pending = None;
        self.answers.push(selected);
    }

    pub(crate) fn set_status(&mut self, status: QuizStatus) {
        self.status = status;
    }

    /// Stop the attempt for good after a scoring failure.
    pub(crate) fn halt(&mut self) {
        self.pending = None;
        self.status = QuizStatus::Error;
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.status
    }

    /// Index of the question being asked, if any.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self.status {
            QuizStatus::Asking { index } => Some(index),
            _ => None,
        }
    }

    #[must_use]
    pub fn pending_selection(&self) -> Option<usize> {
        self.pending
    }

    /// Selected option per answered question, in order.
    #[must_use]
    pub fn answers(&self) -> &[usize] {
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::time::fixed_now;

    #[test]
    fn fresh_attempt_walks_through_its_state() {
        let mut attempt = QuizAttempt::fresh();
        assert_eq!(attempt.status(), QuizStatus::NotStarted);
        assert_eq!(attempt.current_index(), None);

        attempt.begin(fixed_now());
        assert_eq!(attempt.current_index(), Some(0));
        assert_eq!(attempt.started_at(), Some(fixed_now()));

        attempt.select(2);
        assert_eq!(attempt.pending_selection(), Some(2));
        attempt.record(2);
        assert_eq!(attempt.pending_selection(), None);
        assert_eq!(attempt.answers(), &[2]);

        attempt.select(1);
        attempt.halt();
        assert_eq!(attempt.status(), QuizStatus::Error);
        assert_eq!(attempt.pending_selection(), None);
        assert!(attempt.status().is_terminal());
    }
}
