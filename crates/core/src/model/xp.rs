use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cumulative XP total recorded for a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpSnapshot {
    pub date: NaiveDate,
    pub xp: u64,
}

impl XpSnapshot {
    #[must_use]
    pub fn new(date: NaiveDate, xp: u64) -> Self {
        Self { date, xp }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown xp period: {0}")]
pub struct PeriodParseError(String);

/// Granularity of an XP history chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XpPeriod {
    Daily,
    /// Weeks start on Sunday.
    Weekly,
    Monthly,
}

impl XpPeriod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            XpPeriod::Daily => "daily",
            XpPeriod::Weekly => "weekly",
            XpPeriod::Monthly => "monthly",
        }
    }

    /// Number of buckets the chart shows when the caller has no preference.
    #[must_use]
    pub fn default_limit(self) -> usize {
        match self {
            XpPeriod::Daily => 14,
            XpPeriod::Weekly => 8,
            XpPeriod::Monthly => 6,
        }
    }
}

impl fmt::Display for XpPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XpPeriod {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(PeriodParseError(other.to_string())),
        }
    }
}

/// One slot of a charted XP series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpBucket {
    pub label: String,
    /// Position on the chart's x axis, 0 = oldest.
    pub x: usize,
    pub xp: u64,
    /// The snapshot's real date, or the bucket's canonical start for placeholders.
    pub date: NaiveDate,
    /// True when no snapshot fell into this bucket and `xp` is a zero placeholder.
    pub synthesized: bool,
}

impl XpBucket {
    #[must_use]
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
