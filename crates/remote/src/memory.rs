use async_trait::async_trait;
use course_core::Clock;
use course_core::model::{
    CourseId, Section, SectionId, UserProgression, UserProgressionPartial, XpPeriod, XpSnapshot,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::gateway::{
    ActivityGateway, ProgressionGateway, RemoteError, SectionCompletion, SectionGateway,
    XpHistoryGateway,
};

/// Backend calls that can be counted and made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CompleteSection,
    FetchProgression,
    RecordActivity,
    FetchXpHistory,
}

/// Number of requests received per operation, including failed ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub complete_section: usize,
    pub fetch_progression: usize,
    pub record_activity: usize,
    pub fetch_xp_history: usize,
}

/// Activity entries written through [`ActivityGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityRecord {
    LevelUp {
        level: u32,
    },
    SectionCompletion {
        course_id: CourseId,
        section_id: SectionId,
        xp_earned: u32,
    },
}

#[derive(Default)]
struct BackendState {
    total_xp: u64,
    sections: HashMap<SectionId, Section>,
    snapshots: Vec<XpSnapshot>,
    activity: Vec<ActivityRecord>,
    calls: CallCounts,
    failing: HashSet<Operation>,
}

/// In-process stand-in for the learning backend, for tests and offline demos.
///
/// Awards XP on first completion of a known section and keeps a daily XP
/// snapshot the way the real service does.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    clock: Clock,
    state: Arc<Mutex<BackendState>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(BackendState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn with_total_xp(self, total_xp: u64) -> Self {
        self.set_total_xp(total_xp);
        self
    }

    #[must_use]
    pub fn with_section(self, section: Section) -> Self {
        self.lock().sections.insert(section.id().clone(), section);
        self
    }

    #[must_use]
    pub fn with_snapshots(self, snapshots: Vec<XpSnapshot>) -> Self {
        self.lock().snapshots = snapshots;
        self
    }

    pub fn set_total_xp(&self, total_xp: u64) {
        self.lock().total_xp = total_xp;
    }

    pub fn set_failing(&self, operation: Operation, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(operation);
        } else {
            state.failing.remove(&operation);
        }
    }

    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    #[must_use]
    pub fn activity(&self) -> Vec<ActivityRecord> {
        self.lock().activity.clone()
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<Section> {
        self.lock().sections.get(id).cloned()
    }

    #[must_use]
    pub fn progression(&self) -> UserProgression {
        UserProgression::from_total_xp(self.lock().total_xp)
    }

    fn enter(&self, operation: Operation) -> Result<MutexGuard<'_, BackendState>, RemoteError> {
        let mut state = self.lock();
        match operation {
            Operation::CompleteSection => state.calls.complete_section += 1,
            Operation::FetchProgression => state.calls.fetch_progression += 1,
            Operation::RecordActivity => state.calls.record_activity += 1,
            Operation::FetchXpHistory => state.calls.fetch_xp_history += 1,
        }
        if state.failing.contains(&operation) {
            return Err(RemoteError::Unavailable);
        }
        Ok(state)
    }
}

#[async_trait]
impl SectionGateway for InMemoryBackend {
    async fn complete_section(
        &self,
        section_id: &SectionId,
    ) -> Result<SectionCompletion, RemoteError> {
        let today = self.clock.today();
        let mut state = self.enter(Operation::CompleteSection)?;
        let section = state
            .sections
            .get(section_id)
            .cloned()
            .ok_or(RemoteError::NotFound)?;

        if !section.is_completed() {
            state.total_xp += u64::from(section.xp_reward());
            let total_xp = state.total_xp;
            match state.snapshots.iter_mut().find(|s| s.date == today) {
                Some(snapshot) => snapshot.xp = total_xp,
                None => state.snapshots.push(XpSnapshot::new(today, total_xp)),
            }
        }
        let mut completed = section;
        completed.mark_completed();
        state.sections.insert(section_id.clone(), completed.clone());

        // The completion endpoint does not send level progress.
        let full = UserProgression::from_total_xp(state.total_xp);
        let progression = UserProgressionPartial {
            level_progress: None,
            ..UserProgressionPartial::from(&full)
        };
        Ok(SectionCompletion {
            progression: Some(progression),
            section: Some(completed),
        })
    }
}

#[async_trait]
impl ProgressionGateway for InMemoryBackend {
    async fn fetch_progression(&self) -> Result<UserProgression, RemoteError> {
        let state = self.enter(Operation::FetchProgression)?;
        Ok(UserProgression::from_total_xp(state.total_xp))
    }
}

#[async_trait]
impl ActivityGateway for InMemoryBackend {
    async fn record_level_up(&self, level: u32) -> Result<(), RemoteError> {
        let mut state = self.enter(Operation::RecordActivity)?;
        state.activity.push(ActivityRecord::LevelUp { level });
        Ok(())
    }

    async fn record_section_completion(
        &self,
        course_id: &CourseId,
        section_id: &SectionId,
        xp_earned: u32,
    ) -> Result<(), RemoteError> {
        let mut state = self.enter(Operation::RecordActivity)?;
        state.activity.push(ActivityRecord::SectionCompletion {
            course_id: course_id.clone(),
            section_id: section_id.clone(),
            xp_earned,
        });
        Ok(())
    }
}

#[async_trait]
impl XpHistoryGateway for InMemoryBackend {
    async fn fetch_xp_history(
        &self,
        _period: XpPeriod,
        limit: usize,
    ) -> Result<Vec<XpSnapshot>, RemoteError> {
        let state = self.enter(Operation::FetchXpHistory)?;
        let mut snapshots = state.snapshots.clone();
        // Newest first like the real endpoint, so the limit keeps recent points.
        snapshots.sort_by(|a, b| b.date.cmp(&a.date));
        snapshots.truncate(limit);
        Ok(snapshots)
    }
}
