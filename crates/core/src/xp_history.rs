//! Dense, period-aligned XP series for charting.
//!
//! The backend only stores snapshots for periods in which XP changed. Charts
//! need one point per period, so missing buckets are filled with zero-valued
//! placeholders dated at the bucket start.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::model::{XpBucket, XpPeriod, XpSnapshot};

/// Build exactly `limit` buckets ending with the bucket that contains `today`.
///
/// Output is oldest first. Snapshot order on input does not matter; when
/// several snapshots share a bucket the latest one wins since values are
/// cumulative. Snapshots dated after `today` are ignored.
#[must_use]
pub fn aggregate(
    snapshots: &[XpSnapshot],
    period: XpPeriod,
    limit: usize,
    today: NaiveDate,
) -> Vec<XpBucket> {
    let mut sorted = snapshots.to_vec();
    sorted.sort_by_key(|snapshot| snapshot.date);

    let mut by_bucket: BTreeMap<NaiveDate, XpSnapshot> = BTreeMap::new();
    for snapshot in sorted.into_iter().filter(|s| s.date <= today) {
        by_bucket.insert(bucket_start(period, snapshot.date), snapshot);
    }

    let current = bucket_start(period, today);
    (0..limit)
        .rev()
        .map(|back| step_back(period, current, back))
        .enumerate()
        .map(|(x, start)| match by_bucket.get(&start) {
            Some(snapshot) => XpBucket {
                label: label(period, start),
                x,
                xp: snapshot.xp,
                date: snapshot.date,
                synthesized: false,
            },
            None => XpBucket {
                label: label(period, start),
                x,
                xp: 0,
                date: start,
                synthesized: true,
            },
        })
        .collect()
}

/// Canonical first day of the bucket containing `date`.
#[must_use]
pub fn bucket_start(period: XpPeriod, date: NaiveDate) -> NaiveDate {
    match period {
        XpPeriod::Daily => date,
        XpPeriod::Weekly => {
            let offset = u64::from(date.weekday().num_days_from_sunday());
            date.checked_sub_days(Days::new(offset)).unwrap_or(NaiveDate::MIN)
        }
        XpPeriod::Monthly => date.with_day(1).unwrap_or(date),
    }
}

fn step_back(period: XpPeriod, start: NaiveDate, steps: usize) -> NaiveDate {
    let steps = u64::try_from(steps).unwrap_or(u64::MAX);
    let shifted = match period {
        XpPeriod::Daily => start.checked_sub_days(Days::new(steps)),
        XpPeriod::Weekly => start.checked_sub_days(Days::new(steps.saturating_mul(7))),
        XpPeriod::Monthly => {
            start.checked_sub_months(Months::new(u32::try_from(steps).unwrap_or(u32::MAX)))
        }
    };
    shifted.unwrap_or(NaiveDate::MIN)
}

/// Weeks are numbered within the month of their Saturday, so a week that
/// starts on the last Sunday of a month counts as week 1 of the next one.
fn label(period: XpPeriod, start: NaiveDate) -> String {
    match period {
        XpPeriod::Daily => start.format("%a").to_string(),
        XpPeriod::Weekly => {
            let saturday = start.checked_add_days(Days::new(6)).unwrap_or(start);
            format!("Week {}", saturday.day0() / 7 + 1)
        }
        XpPeriod::Monthly => start.format("%b").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Tuesday
    fn today() -> NaiveDate {
        day(2023, 11, 14)
    }

    #[test]
    fn empty_daily_series_is_all_zero_and_ends_today() {
        let buckets = aggregate(&[], XpPeriod::Daily, 7, today());

        assert_eq!(buckets.len(), 7);
        assert!(buckets.iter().all(|b| b.xp == 0 && b.synthesized));
        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["Wed", "Thu", "Fri", "Sat", "Sun", "Mon", "Tue"]);
        assert_eq!(buckets.last().unwrap().date, today());
        assert_eq!(buckets[0].date, day(2023, 11, 8));
        assert!(buckets.windows(2).all(|w| w[0].date < w[1].date));
        assert!(buckets.iter().enumerate().all(|(i, b)| b.x == i));
    }

    #[test]
    fn weekly_places_snapshot_in_its_sunday_week() {
        let d = day(2023, 11, 1);
        let buckets = aggregate(&[XpSnapshot::new(d, 100)], XpPeriod::Weekly, 4, today());

        assert_eq!(buckets.len(), 4);
        let starts: Vec<_> = buckets.iter().map(|b| b.iso_date()).collect();
        assert_eq!(starts, ["2023-10-22", "2023-11-01", "2023-11-05", "2023-11-12"]);
        let hits: Vec<_> = buckets.iter().filter(|b| b.xp == 100).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].x, 1);
        assert!(!hits[0].synthesized);

        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["Week 4", "Week 1", "Week 2", "Week 3"]);
    }

    #[test]
    fn week_straddling_months_is_labeled_by_its_saturday() {
        let buckets = aggregate(&[], XpPeriod::Weekly, 1, day(2024, 1, 2));
        assert_eq!(buckets[0].date, day(2023, 12, 31));
        assert_eq!(buckets[0].label, "Week 1");

        let buckets = aggregate(&[], XpPeriod::Weekly, 1, day(2023, 10, 31));
        assert_eq!(buckets[0].date, day(2023, 10, 29));
        assert_eq!(buckets[0].label, "Week 1");
    }

    #[test]
    fn monthly_series_uses_month_abbreviations() {
        let buckets = aggregate(
            &[XpSnapshot::new(day(2023, 9, 20), 900)],
            XpPeriod::Monthly,
            6,
            today(),
        );
        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["Jun", "Jul", "Aug", "Sep", "Oct", "Nov"]);
        assert_eq!(buckets[0].date, day(2023, 6, 1));
        assert_eq!(buckets[3].xp, 900);
        assert_eq!(buckets[3].date, day(2023, 9, 20));
    }

    #[test]
    fn unordered_input_keeps_latest_snapshot_per_bucket() {
        let snapshots = [
            XpSnapshot::new(day(2023, 11, 13), 300),
            XpSnapshot::new(day(2023, 11, 12), 150),
            XpSnapshot::new(day(2023, 11, 14), 450),
        ];
        let weekly = aggregate(&snapshots, XpPeriod::Weekly, 2, today());
        assert_eq!(weekly[1].xp, 450);
        assert_eq!(weekly[1].date, today());

        let daily = aggregate(&snapshots, XpPeriod::Daily, 3, today());
        let xps: Vec<_> = daily.iter().map(|b| b.xp).collect();
        assert_eq!(xps, [150, 300, 450]);
    }

    #[test]
    fn future_and_out_of_window_snapshots_are_ignored() {
        let snapshots = [
            XpSnapshot::new(day(2023, 11, 20), 999),
            XpSnapshot::new(day(2023, 1, 1), 5),
        ];
        let buckets = aggregate(&snapshots, XpPeriod::Daily, 3, today());
        assert!(buckets.iter().all(|b| b.xp == 0));
    }

    #[test]
    fn zero_limit_yields_nothing() {
        assert!(aggregate(&[], XpPeriod::Monthly, 0, today()).is_empty());
    }

    #[test]
    fn output_is_deterministic() {
        let snapshots = [XpSnapshot::new(day(2023, 11, 10), 70)];
        assert_eq!(
            aggregate(&snapshots, XpPeriod::Weekly, 8, today()),
            aggregate(&snapshots, XpPeriod::Weekly, 8, today())
        );
    }
}
