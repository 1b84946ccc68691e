use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use course_core::model::{Course, CourseId, Section, SectionId, UserProgression};
use remote::{ActivityGateway, SectionGateway};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::CompletionError;
use crate::progression::ProgressionTracker;
use crate::quiz::CompletionSignal;

/// What a call to [`CompletionCoordinator::complete`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    /// Tracker snapshot after the completion was merged.
    pub progression: UserProgression,
    pub section: Option<Section>,
    pub xp_earned: u32,
    /// `true` when no request was issued because the section was already done.
    pub replayed: bool,
    /// The completion closed the last open section of a registered course.
    pub course_completed: bool,
}

type CompletionCells = HashMap<SectionId, Arc<OnceCell<CompletionRecord>>>;

#[derive(Debug, Clone)]
struct CompletionRecord {
    section: Option<Section>,
    xp_earned: u32,
    course_completed: bool,
}

/// Sends each section completion to the backend at most once.
///
/// Concurrent calls for the same section share one request; later calls
/// replay the recorded result. A failed request leaves the section open so
/// the caller can retry.
pub struct CompletionCoordinator {
    sections: Arc<dyn SectionGateway>,
    activity: Arc<dyn ActivityGateway>,
    tracker: Arc<ProgressionTracker>,
    completions: Mutex<CompletionCells>,
    courses: Mutex<HashMap<CourseId, Course>>,
}

impl CompletionCoordinator {
    #[must_use]
    pub fn new(
        sections: Arc<dyn SectionGateway>,
        activity: Arc<dyn ActivityGateway>,
        tracker: Arc<ProgressionTracker>,
    ) -> Self {
        Self {
            sections,
            activity,
            tracker,
            completions: Mutex::new(HashMap::new()),
            courses: Mutex::new(HashMap::new()),
        }
    }

    fn lock_completions(&self) -> MutexGuard<'_, CompletionCells> {
        self.completions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_courses(&self) -> MutexGuard<'_, HashMap<CourseId, Course>> {
        self.courses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cell(&self, section_id: &SectionId) -> Arc<OnceCell<CompletionRecord>> {
        Arc::clone(
            self.lock_completions()
                .entry(section_id.clone())
                .or_default(),
        )
    }

    /// Track a course so completions can report when it is finished.
    ///
    /// Sections already marked completed are treated as done: completing them
    /// again issues no request.
    pub fn register_course(&self, course: &Course) {
        for section in course.sections().iter().filter(|s| s.is_completed()) {
            let record = CompletionRecord {
                section: Some(section.clone()),
                xp_earned: 0,
                course_completed: false,
            };
            // Already completed or in flight: keep what is there.
            let _ = self.cell(section.id()).set(record);
        }
        self.lock_courses().insert(course.id().clone(), course.clone());
    }

    /// Local view of a registered course, including completions made here.
    #[must_use]
    pub fn course(&self, course_id: &CourseId) -> Option<Course> {
        self.lock_courses().get(course_id).cloned()
    }

    #[must_use]
    pub fn is_completed(&self, section_id: &SectionId) -> bool {
        self.lock_completions()
            .get(section_id)
            .is_some_and(|cell| cell.initialized())
    }

    /// Complete a section, or replay the earlier result if it is already done.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::Remote` if the completion request fails. The
    /// progression and activity side effects only happen after a success.
    pub async fn complete(
        &self,
        course_id: &CourseId,
        section_id: &SectionId,
        xp_reward: u32,
    ) -> Result<CompletionOutcome, CompletionError> {
        let cell = self.cell(section_id);
        let issued = AtomicBool::new(false);
        let issued_ref = &issued;
        let record = cell
            .get_or_try_init(|| async move {
                issued_ref.store(true, Ordering::SeqCst);
                self.submit(course_id, section_id, xp_reward).await
            })
            .await?;

        let replayed = !issued.load(Ordering::SeqCst);
        if replayed {
            debug!(%section_id, "section already completed, replaying last result");
        }
        Ok(CompletionOutcome {
            progression: self.tracker.snapshot(),
            section: record.section.clone(),
            xp_earned: record.xp_earned,
            replayed,
            course_completed: !replayed && record.course_completed,
        })
    }

    /// Hand-off point for a passed quiz.
    ///
    /// # Errors
    ///
    /// See [`CompletionCoordinator::complete`].
    pub async fn complete_signal(
        &self,
        course_id: &CourseId,
        signal: &CompletionSignal,
    ) -> Result<CompletionOutcome, CompletionError> {
        self.complete(course_id, &signal.section_id, signal.xp_reward)
            .await
    }

    async fn submit(
        &self,
        course_id: &CourseId,
        section_id: &SectionId,
        xp_reward: u32,
    ) -> Result<CompletionRecord, CompletionError> {
        let sequence = self.tracker.next_sequence();
        let completion = self.sections.complete_section(section_id).await?;

        if let Some(partial) = &completion.progression {
            self.tracker.apply(partial, sequence).await;
        }

        let (section, course_completed) =
            self.update_course(course_id, section_id, completion.section);
        info!(%course_id, %section_id, xp_reward, course_completed, "section completed");
        if course_completed {
            info!(%course_id, "course completed");
        }

        if let Err(err) = self
            .activity
            .record_section_completion(course_id, section_id, xp_reward)
            .await
        {
            warn!(
                %section_id,
                transient = err.is_transient(),
                error = %err,
                "failed to record section completion activity"
            );
        }

        Ok(CompletionRecord {
            section,
            xp_earned: xp_reward,
            course_completed,
        })
    }

    fn update_course(
        &self,
        course_id: &CourseId,
        section_id: &SectionId,
        returned: Option<Section>,
    ) -> (Option<Section>, bool) {
        // The request succeeded, so the section is completed whatever the body says.
        let returned = returned.map(|mut section| {
            section.mark_completed();
            section
        });

        let mut courses = self.lock_courses();
        let Some(course) = courses.get_mut(course_id) else {
            return (returned, false);
        };
        let was_completed = course.is_completed();
        let update = returned.or_else(|| {
            course.section(section_id).cloned().map(|mut section| {
                section.mark_completed();
                section
            })
        });
        let Some(update) = update else {
            return (None, false);
        };
        if !course.apply_section_update(update.clone()) {
            return (Some(update), false);
        }
        let section = course.section(section_id).cloned();
        (section, !was_completed && course.is_completed())
    }
}
