//! Level curve and XP reward table.
//!
//! Level 1 is free. Entering level 2 costs 500 XP and every further level
//! costs 10% of that base more than the previous one (level 3: 550, level 4: 600, ...).

/// XP awarded for passing a section quiz.
pub const QUIZ_COMPLETION_XP: u32 = 250;

/// XP awarded for completing a section without a quiz.
pub const SECTION_COMPLETION_XP: u32 = 100;

const BASE_LEVEL_XP: u64 = 500;
const LEVEL_STEP_XP: u64 = BASE_LEVEL_XP / 10;

/// XP needed to go from `level - 1` to `level`.
#[must_use]
pub fn xp_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    BASE_LEVEL_XP + LEVEL_STEP_XP * u64::from(level - 2)
}

/// Cumulative XP needed to reach `level` starting from level 1.
#[must_use]
pub fn total_xp_for_level(level: u32) -> u64 {
    (2..=level).map(xp_for_level).sum()
}

/// Percentage of the way through a level, clamped to `0..=100`.
#[must_use]
pub fn level_progress(current_level_xp: u64, level_span: u64) -> f64 {
    if level_span == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = current_level_xp as f64 / level_span as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

/// Where a cumulative XP total sits on the level curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStanding {
    pub level: u32,
    /// XP earned since entering `level`.
    pub current_level_xp: u64,
    /// XP the current level spans; reaching it means the next level.
    pub level_span: u64,
}

impl LevelStanding {
    #[must_use]
    pub fn from_total_xp(total_xp: u64) -> Self {
        let mut level = 1_u32;
        let mut accumulated = 0_u64;
        loop {
            let span = xp_for_level(level.saturating_add(1));
            if accumulated.saturating_add(span) > total_xp || level == u32::MAX {
                return Self {
                    level,
                    current_level_xp: total_xp - accumulated,
                    level_span: span,
                };
            }
            accumulated += span;
            level += 1;
        }
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        level_progress(self.current_level_xp, self.level_span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_matches_reference_values() {
        assert_eq!(xp_for_level(1), 0);
        assert_eq!(xp_for_level(2), 500);
        assert_eq!(xp_for_level(3), 550);
        assert_eq!(xp_for_level(4), 600);
        assert_eq!(total_xp_for_level(1), 0);
        assert_eq!(total_xp_for_level(4), 1650);
    }

    #[test]
    fn standing_below_first_threshold() {
        let s = LevelStanding::from_total_xp(499);
        assert_eq!(s.level, 1);
        assert_eq!(s.current_level_xp, 499);
        assert_eq!(s.level_span, 500);
    }

    #[test]
    fn standing_on_exact_threshold_moves_up() {
        let s = LevelStanding::from_total_xp(500);
        assert_eq!(s.level, 2);
        assert_eq!(s.current_level_xp, 0);
        assert_eq!(s.level_span, 550);

        let s = LevelStanding::from_total_xp(1700);
        assert_eq!(s.level, 4);
        assert_eq!(s.current_level_xp, 50);
        assert!(s.current_level_xp < s.level_span);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(level_progress(250, 500), 50.0);
        assert_eq!(level_progress(900, 500), 100.0);
        assert_eq!(level_progress(10, 0), 0.0);
    }
}
