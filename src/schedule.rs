//! Reading-schedule progress and overdue reminders.
//!
//! Everything here is derived from a group's date range and the current local
//! time. Nothing is cached: callers recompute on every read.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::api::Group;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub percentage: u8,
    pub overdue: bool,
    pub elapsed_days: f64,
    pub total_days: f64,
}

/// Fractional days from `from` to `to`; negative when `to` is earlier.
pub fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Schedule dates are local midnight boundaries. The total span never drops
/// below one day, so same-day and inverted ranges still produce a value.
pub fn compute_progress(start: NaiveDate, end: NaiveDate, now: NaiveDateTime) -> Progress {
    let start_at = midnight(start);
    let total_days = days_between(start_at, midnight(end)).max(1.0);
    let elapsed_days = days_between(start_at, now);

    let ratio = elapsed_days.max(0.0) / total_days;
    let percentage = (ratio * 100.0).round().clamp(0.0, 100.0) as u8;
    let overdue = elapsed_days > 0.0 && elapsed_days > total_days;

    Progress {
        percentage,
        overdue,
        elapsed_days,
        total_days,
    }
}

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub group_id: i64,
    pub percentage: u8,
    pub overdue: bool,
    pub target_date: NaiveDate,
}

impl ProgressSnapshot {
    pub fn for_group(group: &Group, now: NaiveDateTime) -> Self {
        let progress = compute_progress(group.start_date, group.end_date, now);
        Self {
            group_id: group.id,
            percentage: progress.percentage,
            overdue: progress.overdue,
            target_date: group.end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub group_id: i64,
    pub group_name: String,
    pub end_date: NaiveDate,
    pub message: String,
}

impl Reminder {
    /// A reminder exists only while the group is past its end date.
    pub fn for_group(group: &Group, now: NaiveDateTime) -> Option<Self> {
        if !compute_progress(group.start_date, group.end_date, now).overdue {
            return None;
        }
        Some(Self {
            group_id: group.id,
            group_name: group.name.clone(),
            end_date: group.end_date,
            message: format!(
                "Group \"{}\" is behind schedule! Aim to finish by {}.",
                group.name,
                group.end_date.format("%Y-%m-%d")
            ),
        })
    }
}

pub fn reminders(groups: &[Group], now: NaiveDateTime) -> Vec<Reminder> {
    groups
        .iter()
        .filter_map(|group| Reminder::for_group(group, now))
        .collect()
}
