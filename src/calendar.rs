// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Roster calendar arithmetic.
//!
//! The roster grid has 4 weeks per month and 3 months per quarter, giving
//! 48 roster weeks a year. ISO weeks 49 to 53 fall into December and Q4.
//! Real dates (week ranges, reminder times) use ISO weeks with a Monday
//! start.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::ops::RangeInclusive;

pub const WEEKS_PER_MONTH: u32 = 4;
pub const MONTHS_PER_QUARTER: u32 = 3;
pub const ROSTER_WEEKS: u32 = WEEKS_PER_MONTH * 12;

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Roster month (1..=12) containing `week`.
pub fn month_for_week(week: u32) -> u32 {
    ((week.max(1) - 1) / WEEKS_PER_MONTH + 1).min(12)
}

/// Quarter (1..=4) containing `week`.
pub fn quarter_for_week(week: u32) -> u32 {
    ((week.max(1) - 1) / (WEEKS_PER_MONTH * MONTHS_PER_QUARTER) + 1).min(4)
}

/// Quarter (1..=4) containing `month`.
pub fn quarter_for_month(month: u32) -> u32 {
    (month.clamp(1, 12) - 1) / MONTHS_PER_QUARTER + 1
}

/// Roster weeks belonging to `month`.
pub fn weeks_in_month(month: u32) -> RangeInclusive<u32> {
    let month = month.clamp(1, 12);
    (month - 1) * WEEKS_PER_MONTH + 1..=month * WEEKS_PER_MONTH
}

/// Months belonging to `quarter`.
pub fn months_in_quarter(quarter: u32) -> RangeInclusive<u32> {
    let quarter = quarter.clamp(1, 4);
    (quarter - 1) * MONTHS_PER_QUARTER + 1..=quarter * MONTHS_PER_QUARTER
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn current_year() -> i32 {
    today().year()
}

pub fn current_month() -> u32 {
    today().month()
}

/// ISO week number of today (Monday start, 4-day minimum first week).
pub fn current_week() -> u32 {
    today().iso_week().week()
}

pub fn current_quarter() -> u32 {
    quarter_for_month(current_month())
}

/// (abbreviation, full name) of `month`, or `None` outside 1..=12.
pub fn month_info(month: u32) -> Option<(&'static str, &'static str)> {
    let idx = month.checked_sub(1)? as usize;
    Some((*MONTH_ABBREVS.get(idx)?, *MONTH_NAMES.get(idx)?))
}

/// English ordinal of a day of the month ("1st", "12th", "23rd").
pub fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// Monday of ISO week `week` of `year`.
pub fn week_start(year: i32, week: u32) -> Option<NaiveDate> {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
}

/// Monday to Sunday of an ISO week, formatted "1st Jan\n7th Jan".
pub fn week_date_range(year: i32, week: u32) -> Option<String> {
    let start = week_start(year, week)?;
    let end = start + chrono::Duration::days(6);
    let label = |d: NaiveDate| -> Option<String> {
        Some(format!("{} {}", ordinal(d.day()), month_info(d.month())?.0))
    };
    Some(format!("{}\n{}", label(start)?, label(end)?))
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

/// Fraction of `month` elapsed on `day`, clamped to 0..=1.
pub fn month_progress(year: i32, month: u32, day: u32) -> f32 {
    match days_in_month(year, month) {
        Some(total) => (day as f32 / total as f32).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// 09:00 on the Monday of an ISO week.
pub fn week_event_start(year: i32, week: u32) -> Option<NaiveDateTime> {
    Some(week_start(year, week)?.and_time(reminder_time()))
}

/// 09:00 on the first day of a month.
pub fn month_event_start(year: i32, month: u32) -> Option<NaiveDateTime> {
    Some(NaiveDate::from_ymd_opt(year, month, 1)?.and_time(reminder_time()))
}

fn reminder_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}
