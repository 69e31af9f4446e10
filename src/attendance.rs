// src/attendance.rs

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::HrClient;
use crate::clock::Clock;
use crate::error::HrError;
use crate::models::{AttendanceAction, AttendanceLog, AttendanceLogCreate, AttendanceStatus};

pub const STATUS_ENDPOINT: &str = "/api/attendance/status";
pub const LOGS_ENDPOINT: &str = "/api/attendance/logs";
pub const LOG_ENDPOINT: &str = "/api/attendance/log";

pub const DEFAULT_HISTORY_DAYS: usize = 10;

const SECONDS_PER_HOUR: i64 = 3600;

// --- Day aggregation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Absent,
    Present,
    Incomplete,
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            DayStatus::Absent => "Absent",
            DayStatus::Present => "Present",
            DayStatus::Incomplete => "Incomplete",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: DayStatus,
    pub working_hours: Decimal,
}

impl DaySummary {
    fn absent(date: NaiveDate) -> Self {
        Self {
            date,
            check_in: None,
            check_out: None,
            status: DayStatus::Absent,
            working_hours: Decimal::ZERO,
        }
    }
}

/// Hours between two instants, rounded half away from zero to two places.
///
/// A check-out earlier than its check-in yields zero.
pub fn working_hours(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Decimal {
    let seconds = (check_out - check_in).num_seconds();
    if seconds < 0 {
        warn!(
            "Check-out {} precedes check-in {}; counting zero hours",
            check_out, check_in
        );
        return Decimal::ZERO;
    }
    (Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Buckets logs by the UTC calendar day of their timestamp, each bucket sorted by time.
pub fn group_by_date(logs: &[AttendanceLog]) -> BTreeMap<NaiveDate, Vec<&AttendanceLog>> {
    let mut days: BTreeMap<NaiveDate, Vec<&AttendanceLog>> = BTreeMap::new();
    for log in logs {
        days.entry(log.timestamp.date_naive()).or_default().push(log);
    }
    for day in days.values_mut() {
        day.sort_by_key(|log| log.timestamp);
    }
    days
}

/// Status and hours for one day. Uses the earliest check-in and the latest check-out.
pub fn summarize_day(logs: &[AttendanceLog], date: NaiveDate) -> DaySummary {
    let mut day: Vec<&AttendanceLog> = logs
        .iter()
        .filter(|log| log.timestamp.date_naive() == date)
        .collect();
    day.sort_by_key(|log| log.timestamp);
    summarize_sorted(date, &day)
}

fn summarize_sorted(date: NaiveDate, day: &[&AttendanceLog]) -> DaySummary {
    let check_in = day
        .iter()
        .find(|log| log.action == AttendanceAction::CheckIn)
        .map(|log| log.timestamp);
    let check_out = day
        .iter()
        .rev()
        .find(|log| log.action == AttendanceAction::CheckOut)
        .map(|log| log.timestamp);

    match (check_in, check_out) {
        (None, _) => DaySummary {
            check_out,
            ..DaySummary::absent(date)
        },
        (Some(start), None) => DaySummary {
            date,
            check_in: Some(start),
            check_out: None,
            status: DayStatus::Incomplete,
            working_hours: Decimal::ZERO,
        },
        (Some(start), Some(end)) => DaySummary {
            date,
            check_in: Some(start),
            check_out: Some(end),
            status: DayStatus::Present,
            working_hours: working_hours(start, end),
        },
    }
}

// --- Views ---

pub fn today_view(logs: &[AttendanceLog], today: NaiveDate) -> DaySummary {
    summarize_day(logs, today)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekSummary {
    pub start: NaiveDate,
    pub days: Vec<DaySummary>,
    pub total_hours: Decimal,
    pub present_days: usize,
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Sunday through Saturday of the week containing `today`, absent days included.
pub fn week_view(logs: &[AttendanceLog], today: NaiveDate) -> WeekSummary {
    let start = week_start(today);
    let grouped = group_by_date(logs);
    let days: Vec<DaySummary> = (0..7)
        .map(|offset| {
            let date = start + Duration::days(offset);
            grouped
                .get(&date)
                .map(|day| summarize_sorted(date, day))
                .unwrap_or_else(|| DaySummary::absent(date))
        })
        .collect();

    WeekSummary {
        start,
        total_hours: days.iter().map(|d| d.working_hours).sum(),
        present_days: days.iter().filter(|d| d.status == DayStatus::Present).count(),
        days,
    }
}

/// The most recent `limit` days that have any logs, newest first.
pub fn history_view(logs: &[AttendanceLog], limit: usize) -> Vec<DaySummary> {
    group_by_date(logs)
        .iter()
        .rev()
        .take(limit)
        .map(|(date, day)| summarize_sorted(*date, day))
        .collect()
}

// --- Service ---

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSnapshot {
    pub status: AttendanceStatus,
    pub logs: Vec<AttendanceLog>,
}

fn refused(message: &str) -> HrError {
    HrError::Validation {
        message: message.to_string(),
        fields: Vec::new(),
    }
}

pub struct AttendanceService {
    client: Arc<HrClient>,
    clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(client: Arc<HrClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    pub async fn status(&self) -> Result<AttendanceStatus, HrError> {
        self.client.require_session()?;
        self.client.get(STATUS_ENDPOINT, "attendance status").await
    }

    pub async fn logs(&self) -> Result<Vec<AttendanceLog>, HrError> {
        self.client.require_session()?;
        self.client.get(LOGS_ENDPOINT, "attendance logs").await
    }

    pub async fn snapshot(&self) -> Result<AttendanceSnapshot, HrError> {
        Ok(AttendanceSnapshot {
            status: self.status().await?,
            logs: self.logs().await?,
        })
    }

    pub async fn check_in(&self, location: Option<String>) -> Result<AttendanceSnapshot, HrError> {
        let status = self.status().await?;
        if status.checked_in {
            return Err(refused("Already checked in today"));
        }
        self.record(AttendanceAction::CheckIn, location).await
    }

    pub async fn check_out(&self, location: Option<String>) -> Result<AttendanceSnapshot, HrError> {
        let status = self.status().await?;
        if !status.checked_in {
            return Err(refused("Please check in first"));
        }
        if status.checked_out {
            return Err(refused("Already checked out today"));
        }
        self.record(AttendanceAction::CheckOut, location).await
    }

    async fn record(
        &self,
        action: AttendanceAction,
        location: Option<String>,
    ) -> Result<AttendanceSnapshot, HrError> {
        let body = AttendanceLogCreate {
            action,
            location: location.filter(|l| !l.trim().is_empty()),
        };
        let _: serde_json::Value = self
            .client
            .post_json(LOG_ENDPOINT, &body, "record attendance")
            .await?;
        info!("Recorded {} at {}", action.as_str(), self.clock.now());
        self.snapshot().await
    }

    pub async fn today(&self) -> Result<DaySummary, HrError> {
        Ok(today_view(&self.logs().await?, self.clock.today()))
    }

    pub async fn week(&self) -> Result<WeekSummary, HrError> {
        Ok(week_view(&self.logs().await?, self.clock.today()))
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<DaySummary>, HrError> {
        Ok(history_view(&self.logs().await?, limit))
    }
}
