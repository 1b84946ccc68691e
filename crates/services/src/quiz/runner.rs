use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use course_core::Clock;
use course_core::model::CourseId;
use tracing::{debug, warn};

use super::attempt::QuizStatus;
use super::session::{CompletionSignal, QuizSession, SubmitOutcome};
use crate::completion::{CompletionCoordinator, CompletionOutcome};
use crate::error::QuizError;

/// Result of answering through a [`QuizRunner`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerResult {
    Ignored,
    Advanced { next_index: usize },
    Failed { question_index: usize },
    /// The quiz passed and the completion went through.
    Completed(CompletionOutcome),
}

/// Drives a [`QuizSession`] and hands its completion signal to the
/// [`CompletionCoordinator`].
///
/// While the completion request is in flight further submits are ignored.
/// After [`QuizRunner::dispose`] every call fails with `QuizError::Disposed` and
/// responses that arrive late are dropped.
pub struct QuizRunner {
    course_id: CourseId,
    clock: Clock,
    session: Mutex<QuizSession>,
    coordinator: Arc<CompletionCoordinator>,
    pending_signal: Mutex<Option<CompletionSignal>>,
    completion: Mutex<Option<CompletionOutcome>>,
    live: AtomicBool,
}

impl QuizRunner {
    #[must_use]
    pub fn new(
        course_id: CourseId,
        session: QuizSession,
        coordinator: Arc<CompletionCoordinator>,
        clock: Clock,
    ) -> Self {
        Self {
            course_id,
            clock,
            session: Mutex::new(session),
            coordinator,
            pending_signal: Mutex::new(None),
            completion: Mutex::new(None),
            live: AtomicBool::new(true),
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, QuizSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<CompletionSignal>> {
        self.pending_signal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_live(&self) -> Result<(), QuizError> {
        if self.is_live() {
            Ok(())
        } else {
            Err(QuizError::Disposed)
        }
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.lock_session().status()
    }

    /// Copy of the current session state.
    #[must_use]
    pub fn session(&self) -> QuizSession {
        self.lock_session().clone()
    }

    #[must_use]
    pub fn completion(&self) -> Option<CompletionOutcome> {
        self.completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Passed quiz whose completion has not gone through yet.
    #[must_use]
    pub fn pending_signal(&self) -> Option<CompletionSignal> {
        self.lock_pending().clone()
    }

    /// # Errors
    ///
    /// See [`QuizSession::start`]; `QuizError::Disposed` after dispose.
    pub fn start(&self) -> Result<(), QuizError> {
        self.ensure_live()?;
        let now = self.clock.now();
        self.lock_session().start(now)
    }

    /// # Errors
    ///
    /// See [`QuizSession::select_option`]; `QuizError::Disposed` after dispose.
    pub fn select_option(&self, option: usize) -> Result<(), QuizError> {
        self.ensure_live()?;
        self.lock_session().select_option(option)
    }

    /// # Errors
    ///
    /// See [`QuizSession::retry`]; `QuizError::Disposed` after dispose.
    pub fn retry(&self) -> Result<(), QuizError> {
        self.ensure_live()?;
        self.lock_session().retry()
    }

    /// Submit the pending selection; a pass is completed before returning.
    ///
    /// # Errors
    ///
    /// Returns the session's `QuizError`s, `QuizError::Completion` if the pass
    /// could not be delivered (see [`QuizRunner::retry_completion`]) and
    /// `QuizError::Disposed` after dispose.
    pub async fn submit_answer(&self) -> Result<AnswerResult, QuizError> {
        self.ensure_live()?;
        let signal = {
            let mut session = self.lock_session();
            match session.submit_answer()? {
                SubmitOutcome::Ignored => return Ok(AnswerResult::Ignored),
                SubmitOutcome::Advanced { next_index } => {
                    return Ok(AnswerResult::Advanced { next_index });
                }
                SubmitOutcome::Failed { question_index } => {
                    return Ok(AnswerResult::Failed { question_index });
                }
                SubmitOutcome::Passed(signal) => {
                    session.begin_submit();
                    *self.lock_pending() = Some(signal.clone());
                    signal
                }
            }
        };
        self.deliver(signal).await
    }

    /// Re-send a completion that failed earlier.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` when nothing is waiting to be
    /// delivered, otherwise the same errors as [`QuizRunner::submit_answer`].
    pub async fn retry_completion(&self) -> Result<AnswerResult, QuizError> {
        self.ensure_live()?;
        let signal = {
            let mut session = self.lock_session();
            if session.is_submitting() {
                return Ok(AnswerResult::Ignored);
            }
            let Some(signal) = self.lock_pending().clone() else {
                return Err(QuizError::InvalidState {
                    action: "retry completion",
                    status: session.status(),
                });
            };
            session.begin_submit();
            signal
        };
        self.deliver(signal).await
    }

    async fn deliver(&self, signal: CompletionSignal) -> Result<AnswerResult, QuizError> {
        let result = self
            .coordinator
            .complete_signal(&self.course_id, &signal)
            .await;
        self.lock_session().finish_submit();

        if !self.is_live() {
            debug!(section_id = %signal.section_id, "completion arrived after dispose, dropped");
            return Err(QuizError::Disposed);
        }

        match result {
            Ok(outcome) => {
                *self.lock_pending() = None;
                *self
                    .completion
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(outcome.clone());
                Ok(AnswerResult::Completed(outcome))
            }
            Err(err) => {
                warn!(section_id = %signal.section_id, error = %err, "quiz completion not delivered");
                Err(err.into())
            }
        }
    }

    /// Tear down: later calls fail and in-flight results are dropped.
    pub fn dispose(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}
