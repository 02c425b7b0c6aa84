// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Turns the view state and the job store into a view-agnostic render model.
//!
//! The model is what a front end paints: a table of hour rows for day/week,
//! a day grid for month, twelve month cells for year, and the unscheduled
//! pool beside all of them. "Today" and the current-time line always refer
//! to the wall clock passed in as `now`, never to the anchor date.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use common::{EmployeeFilter, Granularity, Job, JobStatus, MAINTENANCE_TYPE};
use serde::{Serialize, Serializer};

use crate::colors::{EmployeeColorMap, HslColor};
use crate::date_grid::{self, DateBucket};
use crate::job_store::JobStore;
use crate::view_state::ViewState;

/// Border color of a job card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardColor {
    /// Color of the first assigned employee.
    Employee(HslColor),
    /// Maintenance jobs.
    Accent,
    Primary,
    /// Anything still in the pool.
    Neutral,
}

impl CardColor {
    pub fn css(&self) -> String {
        match self {
            CardColor::Employee(color) => color.to_string(),
            CardColor::Accent => "var(--accent-color)".to_string(),
            CardColor::Primary => "var(--primary-color)".to_string(),
            CardColor::Neutral => "var(--text-muted)".to_string(),
        }
    }
}

impl Serialize for CardColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.css())
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardIcon {
    Maintenance,
    Standard,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JobCard {
    pub id: String,
    pub title: String,
    pub customer: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    /// `HH:MM` of the start, when there is one.
    pub time_label: Option<String>,
    pub color: CardColor,
    pub icon: CardIcon,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ColumnHeader {
    pub date: NaiveDate,
    pub label: String,
    pub is_today: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SlotCell {
    pub date: NaiveDate,
    pub hour: u32,
    pub is_today: bool,
    pub jobs: Vec<JobCard>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HourRow {
    pub hour: u32,
    pub label: String,
    pub slots: Vec<SlotCell>,
}

/// Horizontal "now" line inside one slot, `offset_percent` from the top.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NowIndicator {
    pub date: NaiveDate,
    pub hour: u32,
    pub offset_percent: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonthCell {
    Padding,
    Day {
        date: NaiveDate,
        day_number: u32,
        has_jobs: bool,
        is_today: bool,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct YearCell {
    pub month: u32,
    pub name: &'static str,
    pub is_current: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderModel {
    Timeline {
        columns: Vec<ColumnHeader>,
        rows: Vec<HourRow>,
        now: Option<NowIndicator>,
    },
    Month {
        weekdays: Vec<&'static str>,
        cells: Vec<MonthCell>,
    },
    Year {
        year: i32,
        months: Vec<YearCell>,
    },
}

impl RenderModel {
    pub fn now_indicator(&self) -> Option<&NowIndicator> {
        match self {
            RenderModel::Timeline { now, .. } => now.as_ref(),
            _ => None,
        }
    }
}

/// Everything the planning page shows at once.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ScheduleView {
    pub anchor: NaiveDate,
    pub granularity: Granularity,
    pub filter: EmployeeFilter,
    pub label: String,
    pub model: RenderModel,
    pub pool: Vec<JobCard>,
}

/// Card color precedence: pool jobs are neutral; planned jobs with an
/// assignee take the first assignee's color (primary when that employee is
/// unknown); otherwise maintenance gets the accent and the rest primary.
pub fn card_color(job: &Job, colors: &EmployeeColorMap) -> CardColor {
    if job.is_unscheduled() {
        return CardColor::Neutral;
    }
    if job.status == JobStatus::Planned {
        if let Some(first) = job.assigned_to.first() {
            return colors
                .get(first)
                .map(CardColor::Employee)
                .unwrap_or(CardColor::Primary);
        }
    }
    if job.is_maintenance() {
        CardColor::Accent
    } else {
        CardColor::Primary
    }
}

pub fn card_icon(job: &Job) -> CardIcon {
    let described = job
        .description
        .as_deref()
        .is_some_and(|d| d.contains(MAINTENANCE_TYPE));
    if job.is_maintenance() || described {
        CardIcon::Maintenance
    } else {
        CardIcon::Standard
    }
}

pub fn job_card(job: &Job, colors: &EmployeeColorMap) -> JobCard {
    JobCard {
        id: job.id.clone(),
        title: job.title.clone(),
        customer: job.customer.clone(),
        job_type: job.job_type.clone(),
        status: job.status,
        time_label: job.start.map(|s| s.format("%H:%M").to_string()),
        color: card_color(job, colors),
        icon: card_icon(job),
    }
}

/// The current-time line, when `now` falls on a visible day inside the hour axis.
pub fn now_indicator(visible: &[NaiveDate], now: NaiveDateTime) -> Option<NowIndicator> {
    let hour = now.hour();
    if !(date_grid::FIRST_HOUR..date_grid::AXIS_END_HOUR).contains(&hour) {
        return None;
    }
    let today = now.date();
    if !visible.contains(&today) {
        return None;
    }
    Some(NowIndicator {
        date: today,
        hour,
        offset_percent: f64::from(now.minute()) / 60.0 * 100.0,
    })
}

pub fn render(
    view: &ViewState,
    store: &JobStore,
    pool_search: Option<&str>,
    now: NaiveDateTime,
) -> ScheduleView {
    let range = date_grid::compute_visible_range(view.anchor, view.granularity);
    let today = now.date();

    let model = match view.granularity {
        Granularity::Day | Granularity::Week => {
            render_timeline(&range.cells, store, &view.filter, now)
        }
        Granularity::Month => RenderModel::Month {
            weekdays: date_grid::WEEKDAY_SHORT_NAMES.to_vec(),
            cells: range
                .cells
                .iter()
                .filter_map(|cell| match cell {
                    DateBucket::Padding => Some(MonthCell::Padding),
                    DateBucket::MonthDay { date, day_number } => Some(MonthCell::Day {
                        date: *date,
                        day_number: *day_number,
                        has_jobs: store.has_jobs_on(*date, &view.filter),
                        is_today: *date == today,
                    }),
                    _ => None,
                })
                .collect(),
        },
        Granularity::Year => {
            let year = view.anchor.year();
            let months = range
                .cells
                .iter()
                .filter_map(|cell| match cell {
                    DateBucket::Month { month, .. } => Some(YearCell {
                        month: *month,
                        name: date_grid::MONTH_SHORT_NAMES[(*month - 1) as usize],
                        is_current: year == today.year() && *month == today.month(),
                    }),
                    _ => None,
                })
                .collect();
            RenderModel::Year { year, months }
        }
    };

    let pool = store
        .unscheduled_pool(pool_search)
        .into_iter()
        .map(|job| job_card(job, store.colors()))
        .collect();

    ScheduleView {
        anchor: view.anchor,
        granularity: view.granularity,
        filter: view.filter.clone(),
        label: range.label,
        model,
        pool,
    }
}

fn render_timeline(
    cells: &[DateBucket],
    store: &JobStore,
    filter: &EmployeeFilter,
    now: NaiveDateTime,
) -> RenderModel {
    let today = now.date();
    let days: Vec<NaiveDate> = cells
        .iter()
        .filter_map(|cell| match cell {
            DateBucket::Day { date, .. } => Some(*date),
            _ => None,
        })
        .collect();

    let columns = days
        .iter()
        .map(|date| ColumnHeader {
            date: *date,
            label: date_grid::day_header(*date),
            is_today: *date == today,
        })
        .collect();

    // Jobs sharing a slot are stacked by start time, ties in store order.
    let rows = date_grid::hour_axis()
        .into_iter()
        .map(|hour| HourRow {
            hour,
            label: date_grid::hour_label(hour),
            slots: days
                .iter()
                .map(|date| {
                    let mut jobs = store.filter_by_slot(*date, hour, filter);
                    jobs.sort_by_key(|job| job.start);
                    SlotCell {
                        date: *date,
                        hour,
                        is_today: *date == today,
                        jobs: jobs
                            .into_iter()
                            .map(|job| job_card(job, store.colors()))
                            .collect(),
                    }
                })
                .collect(),
        })
        .collect();

    RenderModel::Timeline {
        columns,
        rows,
        now: now_indicator(&days, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::color_for;
    use crate::job_store::tests::{at, job, sample_store};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week_of_29th() -> ViewState {
        ViewState::new(date(2025, 12, 29))
    }

    fn slot<'a>(model: &'a RenderModel, day: NaiveDate, hour: u32) -> &'a SlotCell {
        match model {
            RenderModel::Timeline { rows, .. } => rows
                .iter()
                .find(|r| r.hour == hour)
                .and_then(|r| r.slots.iter().find(|s| s.date == day))
                .unwrap(),
            other => panic!("expected timeline, got {other:?}"),
        }
    }

    #[test]
    fn test_week_grid_shape() {
        let view = render(&week_of_29th(), &sample_store(), None, at("2025-12-29T10:30"));
        match &view.model {
            RenderModel::Timeline { columns, rows, .. } => {
                assert_eq!(columns.len(), 7);
                assert_eq!(columns[0].label, "Montag (29.12.)");
                assert_eq!(rows.len(), 10);
                assert_eq!(rows[0].label, "08:00");
                assert!(rows.iter().all(|r| r.slots.len() == 7));
            }
            other => panic!("expected timeline, got {other:?}"),
        }
        assert_eq!(view.label, "KW 1 · Dezember 2025");
    }

    #[test]
    fn test_jobs_land_in_their_slots() {
        let view = render(&week_of_29th(), &sample_store(), None, at("2025-12-29T10:30"));
        let monday_eight = slot(&view.model, date(2025, 12, 29), 8);
        assert_eq!(monday_eight.jobs.len(), 1);
        assert_eq!(monday_eight.jobs[0].id, "j1");
        assert_eq!(monday_eight.jobs[0].time_label.as_deref(), Some("08:00"));
        assert!(monday_eight.is_today);

        let tuesday_nine = slot(&view.model, date(2025, 12, 30), 9);
        assert_eq!(tuesday_nine.jobs[0].id, "j2");
        assert!(!tuesday_nine.is_today);
    }

    #[test]
    fn test_color_precedence() {
        let store = sample_store();
        let colors = store.colors();
        // Planned with assignees: first assignee wins.
        let j1 = store.find_by_id("j1").unwrap();
        assert_eq!(card_color(j1, colors), CardColor::Employee(color_for("max")));
        // Pool job is neutral whatever its type.
        let mut open = job("x", "Wartung", "Wartung", JobStatus::Open, None, None, &[]);
        assert_eq!(card_color(&open, colors), CardColor::Neutral);
        // Planned maintenance without assignee gets the accent.
        open.status = JobStatus::Planned;
        open.start = Some(at("2025-12-29T09:00"));
        assert_eq!(card_color(&open, colors), CardColor::Accent);
        // Done jobs fall through to the type colors even with assignees.
        let done = job(
            "y",
            "Fertig",
            "Installation",
            JobStatus::Done,
            Some("2025-12-29T09:00"),
            None,
            &["u1"],
        );
        assert_eq!(card_color(&done, colors), CardColor::Primary);
        // Unknown assignee falls back to primary.
        let stranger = job(
            "z",
            "Fremd",
            "Wartung",
            JobStatus::Planned,
            Some("2025-12-29T09:00"),
            None,
            &["u9"],
        );
        assert_eq!(card_color(&stranger, colors), CardColor::Primary);
    }

    #[test]
    fn test_icon_from_type_or_description() {
        let mut j = job("a", "Heizung", "Standard", JobStatus::Open, None, None, &[]);
        assert_eq!(card_icon(&j), CardIcon::Standard);
        j.description = Some("Jährliche Wartung".to_string());
        assert_eq!(card_icon(&j), CardIcon::Maintenance);
    }

    #[test]
    fn test_filter_narrows_grid_but_not_pool() {
        let mut view_state = week_of_29th();
        view_state.set_filter(EmployeeFilter::Employee("u2".to_string()));
        let view = render(&view_state, &sample_store(), None, at("2025-12-29T10:30"));
        assert_eq!(slot(&view.model, date(2025, 12, 29), 8).jobs[0].id, "j1");
        assert!(slot(&view.model, date(2025, 12, 31), 8).jobs.is_empty());
        assert_eq!(view.pool.len(), 1);
        assert_eq!(view.pool[0].color, CardColor::Neutral);
    }

    #[test]
    fn test_now_indicator_position() {
        let view = render(&week_of_29th(), &sample_store(), None, at("2025-12-31T14:45"));
        assert_eq!(
            view.model.now_indicator(),
            Some(&NowIndicator {
                date: date(2025, 12, 31),
                hour: 14,
                offset_percent: 75.0
            })
        );
    }

    #[test]
    fn test_now_indicator_outside_axis_or_range() {
        let days = vec![date(2025, 12, 29)];
        assert!(now_indicator(&days, at("2025-12-29T07:59")).is_none());
        assert!(now_indicator(&days, at("2025-12-29T18:00")).is_none());
        assert!(now_indicator(&days, at("2025-12-30T10:00")).is_none());
        assert!(now_indicator(&days, at("2025-12-29T17:59")).is_some());
    }

    #[test]
    fn test_month_view_marks_days() {
        let mut view_state = week_of_29th();
        view_state.switch_view(Granularity::Month);
        let view = render(&view_state, &sample_store(), None, at("2025-12-30T10:00"));
        let RenderModel::Month { weekdays, cells } = &view.model else {
            panic!("expected month grid");
        };
        assert_eq!(weekdays[0], "Mo");
        assert_eq!(cells.len(), 31);
        assert!(!cells.contains(&MonthCell::Padding));
        assert_eq!(
            cells[29],
            MonthCell::Day {
                date: date(2025, 12, 30),
                day_number: 30,
                has_jobs: true,
                is_today: true
            }
        );
        assert_eq!(
            cells[0],
            MonthCell::Day {
                date: date(2025, 12, 1),
                day_number: 1,
                has_jobs: false,
                is_today: false
            }
        );
    }

    #[test]
    fn test_year_view_highlights_real_month() {
        let mut view_state = week_of_29th();
        view_state.switch_view(Granularity::Year);
        let view = render(&view_state, &sample_store(), None, at("2025-03-10T10:00"));
        let RenderModel::Year { year, months } = &view.model else {
            panic!("expected year grid");
        };
        assert_eq!(*year, 2025);
        let current: Vec<_> = months.iter().filter(|m| m.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name, "Mär");

        let other_year = render(&view_state, &sample_store(), None, at("2026-03-10T10:00"));
        let RenderModel::Year { months, .. } = &other_year.model else {
            panic!("expected year grid");
        };
        assert!(months.iter().all(|m| !m.is_current));
    }

    #[test]
    fn test_pool_search_passes_through() {
        let view = render(&week_of_29th(), &sample_store(), Some("nichts"), at("2025-12-29T10:00"));
        assert!(view.pool.is_empty());
    }
}
