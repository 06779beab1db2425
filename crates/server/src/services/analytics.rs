//! Visit aggregation for the dashboard.
//!
//! Counters are stored per day. A row counts towards a window when its day's
//! midnight (UTC) is at or after the window's start, so "last 24 hours"
//! includes today's row and excludes yesterday's.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, DurationRound, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use vitrine_core::TenantRef;

use crate::db::{AnalyticsRepository, RepositoryError};
use crate::models::VisitRecord;

/// Chart window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Range {
    #[serde(rename = "24h")]
    H24,
    #[default]
    #[serde(rename = "7d")]
    D7,
    #[serde(rename = "30d")]
    D30,
    #[serde(rename = "all")]
    All,
}

impl Range {
    pub const ALL: [Self; 4] = [Self::H24, Self::D7, Self::D30, Self::All];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::H24 => "24h",
            Self::D7 => "7d",
            Self::D30 => "30d",
            Self::All => "all",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::H24 => "Last 24 hours",
            Self::D7 => "Last 7 days",
            Self::D30 => "Last 30 days",
            Self::All => "All time",
        }
    }

    /// Start of the window ending at `now`; `None` for all time.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::H24 => Some(now - Duration::hours(24)),
            Self::D7 => Some(now - Duration::days(7)),
            Self::D30 => Some(now - Duration::days(30)),
            Self::All => None,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Self::H24),
            "7d" => Ok(Self::D7),
            "30d" => Ok(Self::D30),
            "all" => Ok(Self::All),
            _ => Err(format!("invalid range: {s}")),
        }
    }
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Visit totals over the standard windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitSummary {
    pub last_24h: i64,
    pub last_7d: i64,
    pub last_30d: i64,
    pub all_time: i64,
}

impl VisitSummary {
    #[must_use]
    pub fn from_rows(rows: &[VisitRecord], now: DateTime<Utc>) -> Self {
        let mut summary = Self::default();

        for row in rows {
            let at = day_start(row.day);
            let visits = i64::from(row.visits);
            let within = |range: Range| range.start(now).is_none_or(|start| at >= start);

            if within(Range::H24) {
                summary.last_24h += visits;
            }
            if within(Range::D7) {
                summary.last_7d += visits;
            }
            if within(Range::D30) {
                summary.last_30d += visits;
            }
            summary.all_time += visits;
        }

        summary
    }
}

/// One chart bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub bucket: DateTime<Utc>,
    pub label: String,
    pub visits: i64,
}

/// Bucket `rows` for the chart.
///
/// `24h` gives 24 hourly buckets ending at the current hour; every day row
/// lands on its midnight bucket. The other ranges give one bucket per day,
/// ending today. `all` starts at the oldest row.
#[must_use]
pub fn chart_series(rows: &[VisitRecord], range: Range, now: DateTime<Utc>) -> Vec<ChartPoint> {
    match range {
        Range::H24 => hourly_series(rows, now),
        Range::D7 => daily_series(rows, now.date_naive() - Duration::days(6), now.date_naive()),
        Range::D30 => daily_series(rows, now.date_naive() - Duration::days(29), now.date_naive()),
        Range::All => {
            let today = now.date_naive();
            let first = rows.iter().map(|r| r.day).min().unwrap_or(today).min(today);
            daily_series(rows, first, today)
        }
    }
}

fn hourly_series(rows: &[VisitRecord], now: DateTime<Utc>) -> Vec<ChartPoint> {
    let current_hour = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
    let first_hour = current_hour - Duration::hours(23);

    let mut points: Vec<ChartPoint> = (0..24)
        .map(|i| {
            let bucket = first_hour + Duration::hours(i);
            ChartPoint {
                bucket,
                label: bucket.format("%H:00").to_string(),
                visits: 0,
            }
        })
        .collect();

    for row in rows {
        let at = day_start(row.day);
        if at < first_hour || at > current_hour {
            continue;
        }
        let index = usize::try_from((at - first_hour).num_hours()).unwrap_or(usize::MAX);
        if let Some(point) = points.get_mut(index) {
            point.visits += i64::from(row.visits);
        }
    }

    points
}

fn daily_series(rows: &[VisitRecord], first: NaiveDate, last: NaiveDate) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| ChartPoint {
            bucket: day_start(day),
            label: day.format("%Y-%m-%d").to_string(),
            visits: 0,
        })
        .collect();

    for row in rows {
        if row.day < first || row.day > last {
            continue;
        }
        let index = usize::try_from((row.day - first).num_days()).unwrap_or(usize::MAX);
        if let Some(point) = points.get_mut(index) {
            point.visits += i64::from(row.visits);
        }
    }

    points
}

/// Summary plus chart series, as served by `/api/analytics`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: Range,
    pub summary: VisitSummary,
    pub series: Vec<ChartPoint>,
    pub generated_at: DateTime<Utc>,
}

/// Build the report for `range`, optionally narrowed to one tenant.
///
/// # Errors
///
/// Returns an error if the counters cannot be loaded.
pub async fn report(
    pool: &PgPool,
    range: Range,
    tenant: Option<TenantRef>,
    now: DateTime<Utc>,
) -> Result<AnalyticsReport, RepositoryError> {
    let rows = AnalyticsRepository::new(pool).list(tenant, None).await?;

    Ok(AnalyticsReport {
        range,
        summary: VisitSummary::from_rows(&rows, now),
        series: chart_series(&rows, range, now),
        generated_at: now,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use vitrine_core::AgentId;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap()
    }

    fn row(day: &str, visits: i32) -> VisitRecord {
        VisitRecord {
            id: 1,
            day: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            tenant: TenantRef::Agent(AgentId::new(1)),
            visits,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!("24h".parse::<Range>(), Ok(Range::H24));
        assert_eq!("all".parse::<Range>(), Ok(Range::All));
        assert!("1y".parse::<Range>().is_err());
        assert_eq!(Range::default(), Range::D7);
    }

    #[test]
    fn test_summary_thresholds_use_day_midnight() {
        let rows = [
            row("2026-03-15", 3), // today
            row("2026-03-14", 5), // yesterday: midnight is more than 24h ago
            row("2026-03-09", 7), // 6 days ago
            row("2026-03-08", 11), // midnight 7d+14h30 ago
            row("2026-02-14", 13), // 29 days ago
            row("2026-01-01", 17),
        ];

        let summary = VisitSummary::from_rows(&rows, now());

        assert_eq!(summary.last_24h, 3);
        assert_eq!(summary.last_7d, 3 + 5 + 7);
        assert_eq!(summary.last_30d, 3 + 5 + 7 + 11 + 13);
        assert_eq!(summary.all_time, 3 + 5 + 7 + 11 + 13 + 17);
    }

    #[test]
    fn test_hourly_series_puts_today_on_midnight_bucket() {
        let rows = [row("2026-03-15", 4), row("2026-03-14", 9)];
        let series = chart_series(&rows, Range::H24, now());

        assert_eq!(series.len(), 24);
        assert_eq!(series.first().unwrap().label, "15:00");
        assert_eq!(series.last().unwrap().label, "14:00");

        let midnight = series.iter().find(|p| p.label == "00:00").unwrap();
        assert_eq!(midnight.visits, 4);
        assert_eq!(series.iter().map(|p| p.visits).sum::<i64>(), 4);
    }

    #[test]
    fn test_daily_series_covers_range_and_skips_older_rows() {
        let rows = [
            row("2026-03-15", 2),
            row("2026-03-15", 1),
            row("2026-03-10", 6),
            row("2026-03-01", 50),
        ];
        let series = chart_series(&rows, Range::D7, now());

        assert_eq!(series.len(), 7);
        assert_eq!(series.first().unwrap().label, "2026-03-09");
        assert_eq!(series.last().unwrap().visits, 3);
        assert_eq!(series.iter().map(|p| p.visits).sum::<i64>(), 9);

        assert_eq!(chart_series(&rows, Range::D30, now()).len(), 30);
    }

    #[test]
    fn test_all_time_series_starts_at_oldest_row() {
        let rows = [row("2026-03-13", 1), row("2026-03-15", 1)];
        let series = chart_series(&rows, Range::All, now());
        assert_eq!(series.len(), 3);
        assert_eq!(series.first().unwrap().label, "2026-03-13");

        assert_eq!(chart_series(&[], Range::All, now()).len(), 1);
    }
}
