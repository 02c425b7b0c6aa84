// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{Datelike, NaiveDate};
use common::{EmployeeFilter, Granularity};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::date_grid;

/// The calendar viewport. Lives for the page session only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ViewState {
    pub anchor: NaiveDate,
    pub granularity: Granularity,
    pub filter: EmployeeFilter,
}

impl ViewState {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            anchor,
            granularity: Granularity::default(),
            filter: EmployeeFilter::All,
        }
    }

    /// One step back (`-1`) or forward (`1`) at the current granularity.
    pub fn navigate(&mut self, offset: i32) {
        match date_grid::step(self.anchor, self.granularity, offset) {
            Some(anchor) => {
                debug!(
                    "Navigating {:?} by {}: {} -> {}",
                    self.granularity, offset, self.anchor, anchor
                );
                self.anchor = anchor;
            }
            None => warn!(
                "Cannot navigate {:?} by {} from {}: out of calendar range",
                self.granularity, offset, self.anchor
            ),
        }
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.anchor = date;
    }

    pub fn switch_view(&mut self, granularity: Granularity) {
        self.granularity = granularity;
    }

    pub fn set_filter(&mut self, filter: EmployeeFilter) {
        self.filter = filter;
    }

    /// Month grid drill-down: show the picked day on its own.
    pub fn select_day(&mut self, date: NaiveDate) {
        self.anchor = date;
        self.granularity = Granularity::Day;
    }

    /// Year grid drill-down: show the picked month (1-based) of the anchor's year.
    ///
    /// The day of month is clamped, so 31 January picking April lands on 30 April.
    pub fn select_month(&mut self, month: u32) {
        if !(1..=12).contains(&month) {
            warn!("Ignoring selection of month {}", month);
            return;
        }
        let year = self.anchor.year();
        let day = self.anchor.day().min(date_grid::days_in_month(year, month));
        if let Some(anchor) = NaiveDate::from_ymd_opt(year, month, day) {
            self.anchor = anchor;
            self.granularity = Granularity::Month;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_step_follows_granularity() {
        let mut view = ViewState::new(date(2025, 12, 29));
        view.navigate(1);
        assert_eq!(view.anchor, date(2026, 1, 5));

        view.switch_view(Granularity::Day);
        view.navigate(-1);
        assert_eq!(view.anchor, date(2026, 1, 4));

        view.switch_view(Granularity::Month);
        view.navigate(-1);
        assert_eq!(view.anchor, date(2025, 12, 4));

        view.switch_view(Granularity::Year);
        view.navigate(1);
        assert_eq!(view.anchor, date(2026, 12, 4));
    }

    #[test]
    fn test_out_of_range_keeps_anchor() {
        let mut view = ViewState::new(NaiveDate::MAX);
        view.switch_view(Granularity::Day);
        view.navigate(1);
        assert_eq!(view.anchor, NaiveDate::MAX);
    }

    #[test]
    fn test_drill_down() {
        let mut view = ViewState::new(date(2026, 1, 31));
        view.switch_view(Granularity::Year);
        view.select_month(4);
        assert_eq!(view.anchor, date(2026, 4, 30));
        assert_eq!(view.granularity, Granularity::Month);

        view.select_day(date(2026, 4, 7));
        assert_eq!(view.anchor, date(2026, 4, 7));
        assert_eq!(view.granularity, Granularity::Day);

        view.select_month(13);
        assert_eq!(view.granularity, Granularity::Day);
    }
}
