use std::sync::Arc;

use course_core::model::{XpBucket, XpPeriod};
use course_core::{Clock, aggregate};
use remote::XpHistoryGateway;
use tracing::warn;

/// Chart-ready XP series for one period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpChart {
    pub period: XpPeriod,
    /// Oldest first; always `limit` buckets long.
    pub buckets: Vec<XpBucket>,
    /// The history could not be fetched and `buckets` is the zero-filled series.
    pub fallback: bool,
}

impl XpChart {
    #[must_use]
    pub fn max_xp(&self) -> u64 {
        self.buckets.iter().map(|b| b.xp).max().unwrap_or(0)
    }
}

/// Fetches XP snapshots and buckets them for charting.
#[derive(Clone)]
pub struct XpHistoryService {
    clock: Clock,
    gateway: Arc<dyn XpHistoryGateway>,
}

impl XpHistoryService {
    #[must_use]
    pub fn new(clock: Clock, gateway: Arc<dyn XpHistoryGateway>) -> Self {
        Self { clock, gateway }
    }

    /// Never fails: a fetch error yields the all-zero series with `fallback` set.
    pub async fn chart(&self, period: XpPeriod, limit: usize) -> XpChart {
        let today = self.clock.today();
        match self.gateway.fetch_xp_history(period, limit).await {
            Ok(snapshots) => XpChart {
                period,
                buckets: aggregate(&snapshots, period, limit, today),
                fallback: false,
            },
            Err(err) => {
                warn!(period = %period, error = %err, "xp history unavailable, using empty chart");
                XpChart {
                    period,
                    buckets: aggregate(&[], period, limit, today),
                    fallback: true,
                }
            }
        }
    }

    /// [`XpHistoryService::chart`] with the period's default window.
    pub async fn default_chart(&self, period: XpPeriod) -> XpChart {
        self.chart(period, period.default_limit()).await
    }
}
