use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use course_core::model::{UserProgression, UserProgressionPartial};
use remote::{ActivityGateway, ProgressionGateway};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ProgressionConfig;
use crate::error::ProgressionError;

const EVENT_CAPACITY: usize = 16;

/// Notifications published by [`ProgressionTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionEvent {
    /// The level rose; carries the final level even for multi-level jumps.
    LevelUp(u32),
}

/// Result of a single merge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied { level_up: Option<u32> },
    /// Older than an already applied update.
    Stale,
    /// Arrived after `dispose`.
    Discarded,
}

#[derive(Debug)]
struct TrackerState {
    progression: UserProgression,
    last_applied: Option<u64>,
    has_baseline: bool,
    pending_level_up: Option<u32>,
    error: Option<ProgressionError>,
}

/// Sole owner and mutator of the learner's `UserProgression`.
///
/// Updates are ordered by sequence numbers handed out by
/// [`ProgressionTracker::next_sequence`] when a request is issued, so a slow
/// response can never overwrite one issued later.
pub struct ProgressionTracker {
    gateway: Arc<dyn ProgressionGateway>,
    activity: Arc<dyn ActivityGateway>,
    config: ProgressionConfig,
    state: Mutex<TrackerState>,
    sequence: AtomicU64,
    live: AtomicBool,
    events: broadcast::Sender<ProgressionEvent>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressionTracker {
    /// Tracker starting from the level-1 fallback record.
    ///
    /// The first applied update becomes the baseline and never counts as a
    /// level-up.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ProgressionGateway>,
        activity: Arc<dyn ActivityGateway>,
        config: ProgressionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            activity,
            config,
            state: Mutex::new(TrackerState {
                progression: UserProgression::default(),
                last_applied: None,
                has_baseline: false,
                pending_level_up: None,
                error: None,
            }),
            sequence: AtomicU64::new(0),
            live: AtomicBool::new(true),
            events,
            refresh_task: Mutex::new(None),
        }
    }

    /// Use `progression` as the known baseline.
    #[must_use]
    pub fn with_initial(self, progression: UserProgression) -> Self {
        {
            let mut state = self.lock_state();
            state.progression = progression;
            state.has_baseline = true;
        }
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn config(&self) -> ProgressionConfig {
        self.config
    }

    /// Reserve the sequence number for a request about to be issued.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn snapshot(&self) -> UserProgression {
        self.lock_state().progression.clone()
    }

    /// Last refresh failure, cleared by the next applied update.
    #[must_use]
    pub fn error(&self) -> Option<ProgressionError> {
        self.lock_state().error.clone()
    }

    #[must_use]
    pub fn pending_level_up(&self) -> Option<u32> {
        self.lock_state().pending_level_up
    }

    /// Clear the pending level-up marker, returning it.
    pub fn acknowledge_level_up(&self) -> Option<u32> {
        self.lock_state().pending_level_up.take()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressionEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Apply the fields present in `partial` if `sequence` is not older than the
    /// last applied update. Equal sequence numbers are applied.
    ///
    /// The level never goes down within the tracker's lifetime: a lower level
    /// in `partial` keeps the current one while the other fields still apply.
    pub fn merge(&self, partial: &UserProgressionPartial, sequence: u64) -> MergeOutcome {
        if !self.is_live() {
            debug!(sequence, "progression update after dispose discarded");
            return MergeOutcome::Discarded;
        }

        let mut state = self.lock_state();
        if let Some(last) = state.last_applied {
            if sequence < last {
                debug!(sequence, last, "stale progression update discarded");
                return MergeOutcome::Stale;
            }
        }

        let previous_level = state.progression.level;
        let partial = UserProgressionPartial {
            level: partial.level.map(|level| level.max(previous_level)),
            ..partial.clone()
        };
        state.progression.apply(&partial);
        state.last_applied = Some(sequence);
        state.error = None;

        if !state.has_baseline {
            state.has_baseline = true;
            return MergeOutcome::Applied { level_up: None };
        }

        let level_up = partial.level.filter(|level| *level > previous_level);
        if let Some(level) = level_up {
            state.pending_level_up = Some(level);
            drop(state);
            info!(from = previous_level, to = level, "level up");
            // No subscribers is fine.
            let _ = self.events.send(ProgressionEvent::LevelUp(level));
        }
        MergeOutcome::Applied { level_up }
    }

    /// [`ProgressionTracker::merge`] plus the best-effort level-up activity write.
    pub async fn apply(&self, partial: &UserProgressionPartial, sequence: u64) -> MergeOutcome {
        let outcome = self.merge(partial, sequence);
        if let MergeOutcome::Applied {
            level_up: Some(level),
        } = outcome
        {
            if level > 1 && self.config.record_level_ups {
                if let Err(err) = self.activity.record_level_up(level).await {
                    warn!(level, error = %err, "failed to record level-up activity");
                }
            }
        }
        outcome
    }

    /// Fetch the full record and merge it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::Fetch` if the fetch fails. The in-memory
    /// record is left untouched and the error flag is set.
    pub async fn refresh(&self) -> Result<MergeOutcome, ProgressionError> {
        let sequence = self.next_sequence();
        match self.gateway.fetch_progression().await {
            Ok(progression) => Ok(self
                .apply(&UserProgressionPartial::from(&progression), sequence)
                .await),
            Err(err) => {
                let transient = err.is_transient();
                let err = ProgressionError::Fetch(err);
                if self.is_live() {
                    warn!(sequence, transient, error = %err, "progression refresh failed");
                    self.lock_state().error = Some(err.clone());
                }
                Err(err)
            }
        }
    }

    /// Spawn the periodic refresh: once immediately, then every
    /// `refresh_interval`. Calling it again while running does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        if !self.is_live() {
            return;
        }
        let mut task = self
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let period = self.config.refresh_interval;
        if period.is_zero() {
            warn!("zero refresh interval, periodic refresh not started");
            return;
        }
        let tracker = Arc::downgrade(self);
        *task = Some(tokio::spawn(refresh_loop(tracker, period)));
    }

    /// Stop the periodic refresh and ignore every later update.
    pub fn dispose(&self) {
        self.live.store(false, Ordering::SeqCst);
        let task = self
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = task {
            handle.abort();
        }
    }
}

async fn refresh_loop(tracker: Weak<ProgressionTracker>, period: std::time::Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now(), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(tracker) = tracker.upgrade() else {
            break;
        };
        if !tracker.is_live() {
            break;
        }
        // Failures are recorded on the tracker.
        let _ = tracker.refresh().await;
    }
}

impl Drop for ProgressionTracker {
    fn drop(&mut self) {
        let task = self
            .refresh_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = task {
            handle.abort();
        }
    }
}
