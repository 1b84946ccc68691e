use chrono::{DateTime, Utc};
use course_core::ScoringError;
use course_core::is_correct;
use course_core::model::{AttemptId, Question, Quiz, Section, SectionId};
use tracing::{debug, info};

use super::attempt::{QuizAttempt, QuizStatus};
use crate::error::QuizError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Emitted once when every question of an attempt was answered correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSignal {
    pub section_id: SectionId,
    pub xp_reward: u32,
}

/// What a single `submit_answer` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submit was still in flight; nothing happened.
    Ignored,
    Advanced { next_index: usize },
    Failed { question_index: usize },
    Passed(CompletionSignal),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for one section's quiz.
///
/// `NotStarted → Asking(i) → Passed | Failed`, with `Failed → NotStarted` via
/// [`QuizSession::retry`]. A single wrong answer fails the attempt. Questions
/// without a usable answer key move the session to `Error` for good.
#[derive(Debug, Clone)]
pub struct QuizSession {
    section_id: SectionId,
    quiz: Quiz,
    xp_reward: u32,
    attempt: QuizAttempt,
    error: Option<ScoringError>,
    in_flight: bool,
}

impl QuizSession {
    #[must_use]
    pub fn new(section_id: SectionId, quiz: Quiz, xp_reward: u32) -> Self {
        Self {
            section_id,
            quiz,
            xp_reward,
            attempt: QuizAttempt::fresh(),
            error: None,
            in_flight: false,
        }
    }

    /// Build a session for a section's quiz, rewarding the section's XP.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MissingQuiz` if the section has no quiz.
    pub fn for_section(section: &Section) -> Result<Self, QuizError> {
        let quiz = section
            .quiz()
            .cloned()
            .ok_or_else(|| QuizError::MissingQuiz(section.id().clone()))?;
        Ok(Self::new(section.id().clone(), quiz, section.xp_reward()))
    }

    #[must_use]
    pub fn section_id(&self) -> &SectionId {
        &self.section_id
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.attempt.status()
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn xp_reward(&self) -> u32 {
        self.xp_reward
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.attempt
            .current_index()
            .and_then(|index| self.quiz.question(index))
    }

    #[must_use]
    pub fn pending_selection(&self) -> Option<usize> {
        self.attempt.pending_selection()
    }

    /// The scoring failure that put the session into `Error`.
    #[must_use]
    pub fn error(&self) -> Option<&ScoringError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn attempt(&self) -> &QuizAttempt {
        &self.attempt
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt.id()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// Ask the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless the session is `NotStarted`, and
    /// `QuizError::EmptyQuiz` if there are no questions.
    pub fn start(&mut self, started_at: DateTime<Utc>) -> Result<(), QuizError> {
        self.require(self.status() == QuizStatus::NotStarted, "start")?;
        if self.quiz.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        self.attempt.begin(started_at);
        Ok(())
    }

    /// Record a pending choice for the current question. Does not change state.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `Asking` and
    /// `QuizError::OptionOutOfRange` for an index past the option list.
    pub fn select_option(&mut self, option: usize) -> Result<(), QuizError> {
        let len = match self.current_question() {
            Some(question) => question.options().len(),
            None => return Err(self.invalid("select an option")),
        };
        if option >= len {
            return Err(QuizError::OptionOutOfRange { index: option, len });
        }
        self.attempt.select(option);
        Ok(())
    }

    /// Score the pending selection and move the state machine.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `Asking`, `QuizError::NoSelection`
    /// without a pending selection, and `QuizError::Scoring` when the question has
    /// no usable answer (the session is then in `Error`).
    pub fn submit_answer(&mut self) -> Result<SubmitOutcome, QuizError> {
        if self.in_flight {
            debug!(section_id = %self.section_id, "submit ignored while another is in flight");
            return Ok(SubmitOutcome::Ignored);
        }
        let Some(index) = self.attempt.current_index() else {
            return Err(self.invalid("submit an answer"));
        };
        let selected = self
            .attempt
            .pending_selection()
            .ok_or(QuizError::NoSelection)?;
        let question = self
            .quiz
            .question(index)
            .ok_or_else(|| self.invalid("submit an answer"))?;

        let correct = match is_correct(question, selected) {
            Ok(correct) => correct,
            Err(err) => {
                self.attempt.halt();
                self.error = Some(err.clone());
                return Err(QuizError::Scoring(err));
            }
        };

        self.attempt.record(selected);

        if !correct {
            self.attempt.set_status(QuizStatus::Failed {
                question_index: index,
            });
            debug!(section_id = %self.section_id, question_index = index, "quiz attempt failed");
            return Ok(SubmitOutcome::Failed {
                question_index: index,
            });
        }

        let next_index = index + 1;
        if next_index < self.quiz.len() {
            self.attempt
                .set_status(QuizStatus::Asking { index: next_index });
            return Ok(SubmitOutcome::Advanced { next_index });
        }

        self.attempt.set_status(QuizStatus::Passed);
        info!(section_id = %self.section_id, xp_reward = self.xp_reward, "quiz passed");
        Ok(SubmitOutcome::Passed(CompletionSignal {
            section_id: self.section_id.clone(),
            xp_reward: self.xp_reward,
        }))
    }

    /// Start over after a failed attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless the session is `Failed`.
    pub fn retry(&mut self) -> Result<(), QuizError> {
        self.require(matches!(self.status(), QuizStatus::Failed { .. }), "retry")?;
        self.attempt = QuizAttempt::fresh();
        Ok(())
    }

    pub(crate) fn begin_submit(&mut self) {
        self.in_flight = true;
    }

    pub(crate) fn finish_submit(&mut self) {
        self.in_flight = false;
    }

    fn require(&self, allowed: bool, action: &'static str) -> Result<(), QuizError> {
        if allowed {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidState {
            action,
            status: self.status(),
        }
    }
}
