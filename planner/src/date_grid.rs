// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Visible date ranges for each calendar zoom level.
//!
//! Everything here is a pure function of the anchor date and the
//! granularity. Weeks start on Monday regardless of locale, and labels use
//! the German names the office staff works with.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use common::Granularity;
use serde::Serialize;

/// First hour row of the day/week table.
pub const FIRST_HOUR: u32 = 8;
/// End of the hour axis. The last row starts one hour earlier.
pub const AXIS_END_HOUR: u32 = 18;

pub const MONTH_NAMES: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

pub const MONTH_SHORT_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mär", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dez",
];

/// Month grid header, Monday first.
pub const WEEKDAY_SHORT_NAMES: [&str; 7] = ["Mo", "Di", "Mi", "Do", "Fr", "Sa", "So"];

const WEEKDAY_NAMES: [&str; 7] = [
    "Montag",
    "Dienstag",
    "Mittwoch",
    "Donnerstag",
    "Freitag",
    "Samstag",
    "Sonntag",
];

/// One cell of a visible range.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateBucket {
    /// A column of the day/week table with its hour rows.
    Day { date: NaiveDate, hour_slots: Vec<u32> },
    /// A real day in the month grid.
    MonthDay { date: NaiveDate, day_number: u32 },
    /// Leading blank so the first of the month lands in its weekday column.
    Padding,
    /// One of the twelve year cells. `month` is 1-based.
    Month { month: u32, first_day: NaiveDate },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VisibleRange {
    pub granularity: Granularity,
    pub cells: Vec<DateBucket>,
    pub label: String,
}

impl VisibleRange {
    /// Real dates covered by day and month-day cells, in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.cells
            .iter()
            .filter_map(|cell| match cell {
                DateBucket::Day { date, .. } | DateBucket::MonthDay { date, .. } => Some(*date),
                _ => None,
            })
            .collect()
    }
}

/// Hours of the day/week table: 08 through 17.
pub fn hour_axis() -> Vec<u32> {
    (FIRST_HOUR..AXIS_END_HOUR).collect()
}

pub fn compute_visible_range(anchor: NaiveDate, granularity: Granularity) -> VisibleRange {
    let cells = match granularity {
        Granularity::Day => vec![DateBucket::Day {
            date: anchor,
            hour_slots: hour_axis(),
        }],
        Granularity::Week => week_days(anchor)
            .into_iter()
            .map(|date| DateBucket::Day {
                date,
                hour_slots: hour_axis(),
            })
            .collect(),
        Granularity::Month => month_cells(anchor.year(), anchor.month()),
        Granularity::Year => (1..=12)
            .filter_map(|month| {
                NaiveDate::from_ymd_opt(anchor.year(), month, 1)
                    .map(|first_day| DateBucket::Month { month, first_day })
            })
            .collect(),
    };

    VisibleRange {
        granularity,
        cells,
        label: range_label(anchor, granularity),
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// The seven days Monday..Sunday of the week containing `date`.
pub fn week_days(date: NaiveDate) -> Vec<NaiveDate> {
    week_start(date).iter_days().take(7).collect()
}

/// ISO-8601 week number (the week containing the Thursday).
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        // December of the last representable year.
        _ => 31,
    }
}

/// Blank cells before the first of the month in a Monday-first grid.
pub fn leading_padding(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first| first.weekday().num_days_from_monday())
        .unwrap_or(0)
}

fn month_cells(year: i32, month: u32) -> Vec<DateBucket> {
    let padding = (0..leading_padding(year, month)).map(|_| DateBucket::Padding);
    let days = (1..=days_in_month(year, month)).filter_map(move |day| {
        NaiveDate::from_ymd_opt(year, month, day).map(|date| DateBucket::MonthDay {
            date,
            day_number: day,
        })
    });
    padding.chain(days).collect()
}

/// Moves the anchor by `offset` steps of the granularity.
///
/// Month and year steps clamp the day to the target month's length
/// (31 January + 1 month is 28/29 February). Returns `None` only when the
/// result would leave chrono's representable range.
pub fn step(anchor: NaiveDate, granularity: Granularity, offset: i32) -> Option<NaiveDate> {
    let magnitude = offset.unsigned_abs();
    let forward = offset >= 0;
    match granularity {
        Granularity::Day | Granularity::Week => {
            let per_step = if granularity == Granularity::Week { 7 } else { 1 };
            let days = Days::new(u64::from(magnitude) * per_step);
            if forward {
                anchor.checked_add_days(days)
            } else {
                anchor.checked_sub_days(days)
            }
        }
        Granularity::Month | Granularity::Year => {
            let per_step = if granularity == Granularity::Year { 12 } else { 1 };
            let months = Months::new(magnitude.checked_mul(per_step)?);
            if forward {
                anchor.checked_add_months(months)
            } else {
                anchor.checked_sub_months(months)
            }
        }
    }
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[((month.max(1) - 1) % 12) as usize]
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_monday() as usize]
}

/// Column header of the day/week table, e.g. `Montag (29.12.)`.
pub fn day_header(date: NaiveDate) -> String {
    format!(
        "{} ({:02}.{:02}.)",
        weekday_name(date.weekday()),
        date.day(),
        date.month()
    )
}

pub fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}

pub fn range_label(anchor: NaiveDate, granularity: Granularity) -> String {
    let month_year = format!("{} {}", month_name(anchor.month()), anchor.year());
    match granularity {
        Granularity::Day => format!("{}. {}", anchor.day(), month_year),
        Granularity::Week => format!("KW {} · {}", iso_week(anchor), month_year),
        Granularity::Month => month_year,
        Granularity::Year => anchor.year().to_string(),
    }
}
