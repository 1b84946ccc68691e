use crate::levels::{LevelStanding, xp_for_level};

/// Level and XP standing of the signed-in learner.
///
/// `level` starts at 1. For records built from the level curve
/// `current_level_xp < total_xp_for_next_level` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProgression {
    pub level: u32,
    pub total_xp: u64,
    pub current_level_xp: u64,
    pub total_xp_for_next_level: u64,
    /// Percent through the current level, `0..=100`.
    pub level_progress: f64,
}

impl Default for UserProgression {
    fn default() -> Self {
        Self {
            level: 1,
            total_xp: 0,
            current_level_xp: 0,
            total_xp_for_next_level: xp_for_level(2),
            level_progress: 0.0,
        }
    }
}

impl UserProgression {
    /// Derive a full, internally consistent record from a cumulative XP total.
    #[must_use]
    pub fn from_total_xp(total_xp: u64) -> Self {
        let standing = LevelStanding::from_total_xp(total_xp);
        Self {
            level: standing.level,
            total_xp,
            current_level_xp: standing.current_level_xp,
            total_xp_for_next_level: standing.level_span,
            level_progress: standing.progress(),
        }
    }

    /// Overwrite only the fields present in `partial`.
    pub fn apply(&mut self, partial: &UserProgressionPartial) {
        if let Some(level) = partial.level {
            self.level = level.max(1);
        }
        if let Some(total_xp) = partial.total_xp {
            self.total_xp = total_xp;
        }
        if let Some(current) = partial.current_level_xp {
            self.current_level_xp = current;
        }
        if let Some(next) = partial.total_xp_for_next_level {
            self.total_xp_for_next_level = next;
        }
        if let Some(progress) = partial.level_progress {
            self.level_progress = progress.clamp(0.0, 100.0);
        }
    }
}

/// A progression update where any field may be absent.
///
/// Some sources (e.g. the section completion response) only carry a level and
/// XP delta, so absent fields must keep their previous value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProgressionPartial {
    pub level: Option<u32>,
    pub total_xp: Option<u64>,
    pub current_level_xp: Option<u64>,
    pub total_xp_for_next_level: Option<u64>,
    pub level_progress: Option<f64>,
}

impl UserProgressionPartial {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl From<&UserProgression> for UserProgressionPartial {
    fn from(full: &UserProgression) -> Self {
        Self {
            level: Some(full.level),
            total_xp: Some(full.total_xp),
            current_level_xp: Some(full.current_level_xp),
            total_xp_for_next_level: Some(full.total_xp_for_next_level),
            level_progress: Some(full.level_progress),
        }
    }
}
