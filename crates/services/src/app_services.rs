use std::sync::Arc;

use course_core::Clock;
use course_core::model::{CourseId, Section};
use remote::{HttpConfig, Remote};

use crate::completion::CompletionCoordinator;
use crate::config::ProgressionConfig;
use crate::error::{AppServicesError, QuizError};
use crate::progression::ProgressionTracker;
use crate::quiz::{QuizRunner, QuizSession};
use crate::xp_history_service::XpHistoryService;

/// Assembles app-facing services around one backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    tracker: Arc<ProgressionTracker>,
    coordinator: Arc<CompletionCoordinator>,
    xp_history: Arc<XpHistoryService>,
}

impl AppServices {
    #[must_use]
    pub fn new(remote: Remote, clock: Clock, config: ProgressionConfig) -> Self {
        let tracker = Arc::new(ProgressionTracker::new(
            Arc::clone(&remote.progression),
            Arc::clone(&remote.activity),
            config,
        ));
        let coordinator = Arc::new(CompletionCoordinator::new(
            Arc::clone(&remote.sections),
            Arc::clone(&remote.activity),
            Arc::clone(&tracker),
        ));
        let xp_history = Arc::new(XpHistoryService::new(clock, Arc::clone(&remote.xp_history)));

        Self {
            clock,
            tracker,
            coordinator,
            xp_history,
        }
    }

    /// Build services backed by the HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Remote` if the HTTP client cannot be built.
    pub fn http(
        http: HttpConfig,
        clock: Clock,
        config: ProgressionConfig,
    ) -> Result<Self, AppServicesError> {
        let remote = Remote::http(http)?;
        Ok(Self::new(remote, clock, config))
    }

    /// Read both configurations from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for missing or invalid settings.
    pub fn from_env(clock: Clock) -> Result<Self, AppServicesError> {
        let http = HttpConfig::from_env()?;
        let config = ProgressionConfig::from_env()?;
        Self::http(http, clock, config)
    }

    /// Begin periodic progression refresh. Requires a tokio runtime.
    pub fn start(&self) {
        self.tracker.start();
    }

    /// Stop background work; later progression updates are ignored.
    pub fn dispose(&self) {
        self.tracker.dispose();
    }

    /// A runner for `section`'s quiz that completes into `course_id`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MissingQuiz` if the section has no quiz.
    pub fn quiz_runner(
        &self,
        course_id: CourseId,
        section: &Section,
    ) -> Result<QuizRunner, QuizError> {
        let session = QuizSession::for_section(section)?;
        Ok(QuizRunner::new(
            course_id,
            session,
            Arc::clone(&self.coordinator),
            self.clock,
        ))
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn tracker(&self) -> Arc<ProgressionTracker> {
        Arc::clone(&self.tracker)
    }

    #[must_use]
    pub fn coordinator(&self) -> Arc<CompletionCoordinator> {
        Arc::clone(&self.coordinator)
    }

    #[must_use]
    pub fn xp_history(&self) -> Arc<XpHistoryService> {
        Arc::clone(&self.xp_history)
    }
}
