use chrono::{DateTime, NaiveDate};
use course_core::model::{
    CourseId, Section, SectionId, SectionRecord, UserProgression, UserProgressionPartial,
    XpSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::gateway::{RemoteError, SectionCompletion};

fn decode<E: core::fmt::Display>(e: E) -> RemoteError {
    RemoteError::Decode(e.to_string())
}

/// Progression payload; every field may be missing on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProgressionDto {
    level: Option<u32>,
    total_xp: Option<u64>,
    current_level_xp: Option<u64>,
    #[serde(alias = "xpToNextLevel")]
    total_xp_for_next_level: Option<u64>,
    level_progress: Option<f64>,
}

impl ProgressionDto {
    pub(crate) fn into_partial(self) -> UserProgressionPartial {
        UserProgressionPartial {
            level: self.level,
            total_xp: self.total_xp,
            current_level_xp: self.current_level_xp,
            total_xp_for_next_level: self.total_xp_for_next_level,
            level_progress: self.level_progress,
        }
    }

    /// Missing fields fall back to the level-1 defaults.
    pub(crate) fn into_progression(self) -> UserProgression {
        let mut progression = UserProgression::default();
        progression.apply(&self.into_partial());
        progression
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionResponseDto {
    #[serde(default)]
    progress_data: Option<ProgressionDto>,
    #[serde(default)]
    section: Option<SectionRecord>,
}

impl CompletionResponseDto {
    pub(crate) fn into_completion(self) -> Result<SectionCompletion, RemoteError> {
        let section: Option<Section> = self
            .section
            .map(SectionRecord::into_section)
            .transpose()
            .map_err(decode)?;
        Ok(SectionCompletion {
            progression: self
                .progress_data
                .map(ProgressionDto::into_partial)
                .filter(|p| !p.is_empty()),
            section,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct XpSnapshotDto {
    date: String,
    #[serde(default)]
    xp: u64,
}

impl XpSnapshotDto {
    pub(crate) fn into_snapshot(self) -> Result<XpSnapshot, RemoteError> {
        Ok(XpSnapshot::new(parse_day(&self.date)?, self.xp))
    }
}

/// Accepts full RFC 3339 timestamps (UTC day is taken) or plain `YYYY-MM-DD`.
pub(crate) fn parse_day(raw: &str) -> Result<NaiveDate, RemoteError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.naive_utc().date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(decode)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompleteSectionBody {
    pub is_completed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct LevelUpBody {
    pub level: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SectionCompletionActivityBody<'a> {
    pub course_id: &'a CourseId,
    pub section_id: &'a SectionId,
    pub xp_earned: u32,
}
