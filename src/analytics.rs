//! On-demand dashboard aggregates.
//!
//! The admin dashboard polls these every 10-15 seconds, so everything here
//! works on timestamps fetched through an indexed `created_at` range scan
//! plus a single COUNT(*) for the all-time total. No caching between polls.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;

use crate::db::models::Payment;
use crate::error::AppError;

/// Counts for the four standard reporting windows. Windows are
/// non-exclusive: an event from this morning lands in all four.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct WindowedCounts {
    pub today: i64,
    pub last7days: i64,
    pub last30days: i64,
    pub total: i64,
}

/// Count events per window relative to `now`.
///
/// `timestamps` must cover at least the trailing 30 days; `total` comes from
/// a separate COUNT(*) so the range scan stays bounded.
pub fn windowed_counts(
    timestamps: &[DateTime<Utc>],
    now: DateTime<Utc>,
    total: i64,
) -> WindowedCounts {
    let today = now.date_naive();
    let week_ago = now - Duration::days(7);
    let month_ago = now - Duration::days(30);

    let mut counts = WindowedCounts {
        today: 0,
        last7days: 0,
        last30days: 0,
        total,
    };

    for ts in timestamps {
        if ts.date_naive() == today {
            counts.today += 1;
        }
        if *ts >= week_ago {
            counts.last7days += 1;
        }
        if *ts >= month_ago {
            counts.last30days += 1;
        }
    }

    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Last7Days,
    Last30Days,
}

impl Period {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "today" => Ok(Period::Today),
            "7d" => Ok(Period::Last7Days),
            "30d" => Ok(Period::Last30Days),
            _ => Err(AppError::validation(
                "period",
                format!("unknown period '{}', expected today, 7d or 30d", value),
            )),
        }
    }

    /// Earliest timestamp the period covers, for the range scan.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always valid")
                .and_utc(),
            Period::Last7Days => now - Duration::days(7),
            Period::Last30Days => now - Duration::days(30),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    pub label: String,
    pub count: i64,
}

/// Bucket timestamps into an ordered, zero-filled series for charting:
/// per-hour for today, per-day for the 7d and 30d periods. Empty buckets
/// are emitted with count 0 to keep the chart axis continuous.
pub fn time_series(
    timestamps: &[DateTime<Utc>],
    period: Period,
    now: DateTime<Utc>,
) -> Vec<TimeSeriesPoint> {
    match period {
        Period::Today => {
            let today = now.date_naive();
            let mut buckets = [0i64; 24];
            for ts in timestamps {
                if ts.date_naive() == today {
                    buckets[ts.hour() as usize] += 1;
                }
            }
            buckets
                .iter()
                .enumerate()
                .map(|(hour, count)| TimeSeriesPoint {
                    label: format!("{:02}:00", hour),
                    count: *count,
                })
                .collect()
        }
        Period::Last7Days => daily_series(timestamps, now, 7),
        Period::Last30Days => daily_series(timestamps, now, 30),
    }
}

fn daily_series(timestamps: &[DateTime<Utc>], now: DateTime<Utc>, days: i64) -> Vec<TimeSeriesPoint> {
    let today = now.date_naive();
    (0..days)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            let count = timestamps.iter().filter(|ts| ts.date_naive() == day).count() as i64;
            TimeSeriesPoint {
                label: day.format("%Y-%m-%d").to_string(),
                count,
            }
        })
        .collect()
}

/// Registration payment aggregates for the dashboard.
///
/// Total revenue sums every payment regardless of the verified flag, which
/// matches the observed behavior this system reproduces; the verified and
/// pending counts are exposed alongside so a verified-only figure can be
/// derived by the consumer.
#[derive(Debug, Serialize)]
pub struct PaymentStats {
    pub total_revenue: f64,
    pub verified_count: i64,
    pub pending_count: i64,
}

pub fn payment_stats(payments: &[Payment]) -> PaymentStats {
    let total_revenue = payments.iter().map(|p| p.amount).sum();
    let verified_count = payments.iter().filter(|p| p.verified).count() as i64;
    let pending_count = payments.len() as i64 - verified_count;
    PaymentStats {
        total_revenue,
        verified_count,
        pending_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn payment(amount: f64, verified: bool) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            submission_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount,
            verified,
            proof_handle: "proof.pdf".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_windows_are_non_exclusive() {
        let now = at(2025, 6, 15, 12);
        let events = vec![at(2025, 6, 15, 9)];
        let counts = windowed_counts(&events, now, 1);
        assert_eq!(
            counts,
            WindowedCounts {
                today: 1,
                last7days: 1,
                last30days: 1,
                total: 1,
            }
        );
    }

    #[test]
    fn test_window_boundaries() {
        let now = at(2025, 6, 15, 12);
        let events = vec![
            at(2025, 6, 14, 23), // yesterday: 7d and 30d only
            at(2025, 6, 1, 12),  // two weeks back: 30d only
            at(2025, 4, 1, 12),  // outside every window but total
        ];
        let counts = windowed_counts(&events, now, 57);
        assert_eq!(counts.today, 0);
        assert_eq!(counts.last7days, 1);
        assert_eq!(counts.last30days, 2);
        assert_eq!(counts.total, 57);
    }

    #[test]
    fn test_today_series_has_24_zero_filled_buckets() {
        let now = at(2025, 6, 15, 12);
        let events = vec![at(2025, 6, 15, 9), at(2025, 6, 15, 9), at(2025, 6, 14, 9)];
        let series = time_series(&events, Period::Today, now);
        assert_eq!(series.len(), 24);
        assert_eq!(series[0].label, "00:00");
        assert_eq!(series[9].count, 2);
        assert_eq!(series[10].count, 0);
    }

    #[test]
    fn test_daily_series_is_ordered_and_zero_filled() {
        let now = at(2025, 6, 15, 12);
        let events = vec![at(2025, 6, 13, 8), at(2025, 6, 15, 1)];
        let series = time_series(&events, Period::Last7Days, now);
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].label, "2025-06-09");
        assert_eq!(series[6].label, "2025-06-15");
        assert_eq!(series[4].count, 1);
        assert_eq!(series[5].count, 0);
        assert_eq!(series[6].count, 1);
    }

    #[test]
    fn test_thirty_day_series_length() {
        let now = at(2025, 6, 15, 12);
        let series = time_series(&[], Period::Last30Days, now);
        assert_eq!(series.len(), 30);
        assert!(series.iter().all(|p| p.count == 0));
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse("today").unwrap(), Period::Today);
        assert_eq!(Period::parse("7d").unwrap(), Period::Last7Days);
        assert_eq!(Period::parse("30d").unwrap(), Period::Last30Days);
        assert!(Period::parse("90d").is_err());
    }

    #[test]
    fn test_revenue_includes_unverified_payments() {
        let payments = vec![payment(100.0, true), payment(250.0, false)];
        let stats = payment_stats(&payments);
        assert_eq!(stats.total_revenue, 350.0);
        assert_eq!(stats.verified_count, 1);
        assert_eq!(stats.pending_count, 1);
    }
}
