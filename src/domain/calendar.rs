//! Calendar domain logic for the period engine.
//!
//! All date arithmetic for monthly periods lives here: canonical period ids,
//! month boundaries, and end-of-month helpers. Everything is a pure function
//! of the supplied instant — no clock access, no state, no errors — so
//! rollover and reconciliation behavior is fully deterministic in tests.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Canonical identifier for the calendar month containing `instant`.
///
/// Zero-padded `"YYYY-MM"`, so lexicographic order matches chronological
/// order.
pub fn period_id(instant: NaiveDateTime) -> String {
    format!("{:04}-{:02}", instant.year(), instant.month())
}

/// Human-readable label for the month containing `instant`, e.g.
/// `"January 2024"`.
pub fn display_name(instant: NaiveDateTime) -> String {
    instant.format("%B %Y").to_string()
}

/// First and last instant of the calendar month containing `instant`,
/// inclusive on both ends.
pub fn month_bounds(instant: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = first_of_month(instant.date()).and_time(NaiveTime::MIN);
    let next = first_of_next_month(instant.date()).and_time(NaiveTime::MIN);
    (start, next - Duration::nanoseconds(1))
}

/// True when `a` and `b` fall in the same calendar month.
pub fn same_month(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    period_id(a) == period_id(b)
}

/// Whole days left in the month containing `instant`, not counting today.
pub fn remaining_days(instant: NaiveDateTime) -> i64 {
    let (_, end) = month_bounds(instant);
    end.date().signed_duration_since(instant.date()).num_days()
}

/// True within the last three days of the month.
pub fn is_end_of_month(instant: NaiveDateTime) -> bool {
    remaining_days(instant) <= 3
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of month is always a valid date")
}
