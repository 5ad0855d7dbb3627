use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use tracing::debug;

use crate::activity::Activity;
use crate::datetime::{add_days, end_of_week, format_day_label, start_of_week};
use crate::intensity::classify;
use crate::months::{MonthLabel, month_labels};

pub const DAYS_PER_WEEK: usize = 7;

/// Which days the grid covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Every week touched by the data, from the week of the earliest day to
    /// the week of the latest day.
    FullRange,
    /// A fixed number of weeks, the last one being the week that contains
    /// the reference day.
    Trailing { weeks: u32 },
}

/// Week convention plus window policy. The two named constructors are the
/// layouts used by the terminal and browser views respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub week_start: Weekday,
    pub window: WindowPolicy,
}

impl GridLayout {
    pub const TRAILING_WEEKS: u32 = 53;

    /// Monday-start rows covering the whole data extent.
    pub fn full_range() -> Self {
        Self {
            week_start: Weekday::Mon,
            window: WindowPolicy::FullRange,
        }
    }

    /// Sunday-start rows covering `weeks` weeks up to the reference day.
    pub fn trailing(weeks: u32) -> Self {
        Self {
            week_start: Weekday::Sun,
            window: WindowPolicy::Trailing { weeks },
        }
    }

    /// Row order, top to bottom.
    pub fn weekdays(&self) -> [Weekday; DAYS_PER_WEEK] {
        let mut out = [self.week_start; DAYS_PER_WEEK];
        for idx in 1..DAYS_PER_WEEK {
            out[idx] = out[idx - 1].succ();
        }
        out
    }

    /// First and last day of the grid, both on week boundaries.
    fn bounds(&self, activity: &Activity, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self.window {
            WindowPolicy::FullRange => {
                let first = activity.first_day()?;
                let last = activity.last_day()?;
                Some((
                    start_of_week(first, self.week_start),
                    end_of_week(last, self.week_start),
                ))
            }
            WindowPolicy::Trailing { weeks } => {
                if weeks == 0 {
                    return None;
                }
                let boundary = start_of_week(today, self.week_start);
                let start = add_days(boundary, -(i64::from(weeks) * 7 - 7));
                Some((start, add_days(boundary, 6)))
            }
        }
    }

    /// Last day drawn as a real cell. Full-range grids keep every data day,
    /// even one dated after the reference day.
    fn last_real_day(&self, activity: &Activity, today: NaiveDate) -> NaiveDate {
        match self.window {
            WindowPolicy::FullRange => activity.last_day().map_or(today, |last| last.max(today)),
            WindowPolicy::Trailing { .. } => today,
        }
    }
}

/// One day of the grid. Placeholders stand for days after the reference
/// day (and, in full range, after the last data day) and carry neither a
/// level nor a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub is_placeholder: bool,
    pub intensity_level: u8,
    pub description: String,
}

impl Cell {
    pub fn placeholder() -> Self {
        Self {
            is_placeholder: true,
            intensity_level: 0,
            description: String::new(),
        }
    }

    fn observed(day: NaiveDate, count: u64, max_count: u64) -> Self {
        Self {
            is_placeholder: false,
            intensity_level: classify(count, max_count),
            description: format!("{}: {count} journeys", format_day_label(day)),
        }
    }
}

/// A week-column: its first day and seven cells in layout row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Week {
    pub start: NaiveDate,
    pub cells: Vec<Cell>,
}

/// Chronological week-columns, each exactly seven cells tall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub layout: GridLayout,
    pub weeks: Vec<Week>,
}

impl Grid {
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.weeks.first().map(|week| week.start)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.weeks
            .last()
            .map(|week| add_days(week.start, DAYS_PER_WEEK as i64 - 1))
    }

    pub fn week_starts(&self) -> Vec<NaiveDate> {
        self.weeks.iter().map(|week| week.start).collect()
    }

    pub fn month_labels(&self, column_width: usize) -> Vec<MonthLabel> {
        month_labels(&self.week_starts(), column_width)
    }

    pub fn into_columns(self) -> Vec<Vec<Cell>> {
        self.weeks.into_iter().map(|week| week.cells).collect()
    }
}

/// Lays `activity` out on a calendar grid.
///
/// Levels are scaled against the maximum of the whole mapping, not only the
/// visible window. Every day up to and including `today` is a real cell,
/// zero counts included, and so is every day of the data span.
#[tracing::instrument(skip(activity), fields(days = activity.len()))]
pub fn build_grid(activity: &Activity, today: NaiveDate, layout: GridLayout) -> Grid {
    let Some((start, end)) = layout.bounds(activity, today) else {
        debug!("nothing to lay out");
        return Grid {
            layout,
            weeks: vec![],
        };
    };

    let max_count = activity.max_count();
    let cutoff = layout.last_real_day(activity, today);
    let week_count = (end - start).num_days() / DAYS_PER_WEEK as i64 + 1;

    let weeks: Vec<Week> = (0..week_count)
        .map(|w| {
            let week_start = add_days(start, w * DAYS_PER_WEEK as i64);
            let cells = (0..DAYS_PER_WEEK as i64)
                .map(|d| {
                    let day = add_days(week_start, d);
                    if day > cutoff {
                        Cell::placeholder()
                    } else {
                        Cell::observed(day, activity.count_on(day), max_count)
                    }
                })
                .collect();
            Week {
                start: week_start,
                cells,
            }
        })
        .collect();

    debug!(
        %start,
        %end,
        weeks = weeks.len(),
        max_count,
        "built grid"
    );

    Grid { layout, weeks }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Datelike, NaiveDate, Weekday};

    use super::{DAYS_PER_WEEK, GridLayout, build_grid};
    use crate::activity::Activity;
    use crate::datetime::add_days;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn activity(entries: &[(&str, u64)]) -> Activity {
        let raw: BTreeMap<String, u64> =
            entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        Activity::parse(&raw).expect("valid activity")
    }

    #[test]
    fn full_range_aligns_to_monday_and_sunday() {
        let data = activity(&[("2024-01-16", 5), ("2024-01-15", 3), ("2024-01-24", 1)]);
        let grid = build_grid(&data, day(2026, 1, 1), GridLayout::full_range());

        let first = grid.first_day().expect("first day");
        let last = grid.last_day().expect("last day");
        assert_eq!(first, day(2024, 1, 15));
        assert_eq!(first.weekday(), Weekday::Mon);
        assert_eq!(last, day(2024, 1, 28));
        assert_eq!(last.weekday(), Weekday::Sun);

        let span_days = (last - first).num_days() as usize + 1;
        assert_eq!(grid.weeks.len() * DAYS_PER_WEEK, span_days);
        assert!(grid.weeks.iter().all(|w| w.cells.len() == DAYS_PER_WEEK));
    }

    #[test]
    fn full_range_week_count_holds_for_varied_extents() {
        let start = day(2023, 3, 1);
        for extra in [0_i64, 1, 6, 7, 13, 40, 200, 366] {
            let last = add_days(start, extra);
            let raw: BTreeMap<String, u64> = [
                (start.format("%Y-%m-%d").to_string(), 1),
                (last.format("%Y-%m-%d").to_string(), 2),
            ]
            .into_iter()
            .collect();
            let data = Activity::parse(&raw).expect("valid activity");
            let grid = build_grid(&data, day(2030, 1, 1), GridLayout::full_range());

            let first = grid.first_day().expect("first day");
            let end = grid.last_day().expect("last day");
            assert_eq!(
                grid.weeks.len() * 7,
                (end - first).num_days() as usize + 1,
                "extent of {extra} days"
            );
            assert!(first <= start && end >= last);
        }
    }

    #[test]
    fn full_range_cells_carry_levels_and_descriptions() {
        let data = activity(&[("2024-01-15", 3), ("2024-01-16", 5), ("2024-01-22", 1)]);
        let grid = build_grid(&data, day(2026, 1, 1), GridLayout::full_range());

        let monday = &grid.weeks[0].cells[0];
        assert!(!monday.is_placeholder);
        assert_eq!(monday.intensity_level, 3);
        assert_eq!(monday.description, "15 Jan 2024: 3 journeys");

        assert_eq!(grid.weeks[0].cells[1].intensity_level, 4);

        let quiet = &grid.weeks[0].cells[2];
        assert!(!quiet.is_placeholder);
        assert_eq!(quiet.intensity_level, 0);
        assert_eq!(quiet.description, "17 Jan 2024: 0 journeys");

        assert_eq!(grid.weeks[1].cells[0].intensity_level, 1);
    }

    #[test]
    fn full_range_keeps_data_days_after_today() {
        let data = activity(&[("2024-01-15", 3), ("2024-01-17", 5)]);
        let grid = build_grid(&data, day(2024, 1, 16), GridLayout::full_range());

        let cells = &grid.weeks[0].cells;
        let late = &cells[2];
        assert!(!late.is_placeholder);
        assert_eq!(late.intensity_level, 4);
        assert_eq!(late.description, "17 Jan 2024: 5 journeys");

        // Padding after both today and the last data day stays blank.
        assert!(cells[3..].iter().all(|c| c.is_placeholder));
    }

    #[test]
    fn empty_mapping_in_full_range_has_no_weeks() {
        let grid = build_grid(&Activity::default(), day(2024, 1, 1), GridLayout::full_range());
        assert!(grid.is_empty());
        assert!(grid.month_labels(3).is_empty());
    }

    #[test]
    fn trailing_window_is_fixed_width_and_sunday_aligned() {
        // 2024-06-12 is a Wednesday; its week starts Sunday 2024-06-09.
        let today = day(2024, 6, 12);
        let grid = build_grid(&Activity::default(), today, GridLayout::trailing(53));

        assert_eq!(grid.weeks.len(), 53);
        let first = grid.first_day().expect("first day");
        assert_eq!(first.weekday(), Weekday::Sun);
        assert_eq!(first, day(2023, 6, 11));
        assert_eq!(grid.weeks[52].start, day(2024, 6, 9));

        let last_week = &grid.weeks[52].cells;
        assert!(last_week[..4].iter().all(|c| !c.is_placeholder));
        assert!(last_week[4..].iter().all(|c| c.is_placeholder));
        assert!(last_week[4].description.is_empty());

        let placeholders = grid
            .weeks
            .iter()
            .flat_map(|w| &w.cells)
            .filter(|c| c.is_placeholder)
            .count();
        assert_eq!(placeholders, 3);
    }

    #[test]
    fn trailing_window_on_a_sunday_has_one_real_day_in_the_last_column() {
        let today = day(2024, 6, 9);
        let grid = build_grid(&Activity::default(), today, GridLayout::trailing(53));
        let last_week = &grid.weeks[52].cells;
        assert!(!last_week[0].is_placeholder);
        assert!(last_week[1..].iter().all(|c| c.is_placeholder));
    }

    #[test]
    fn trailing_levels_use_the_global_maximum() {
        let today = day(2024, 6, 12);
        let data = activity(&[("2020-01-01", 100), ("2024-06-10", 50)]);
        let grid = build_grid(&data, today, GridLayout::trailing(53));

        // Monday of the final week, scaled against the out-of-window 100.
        let cell = &grid.weeks[52].cells[1];
        assert_eq!(cell.intensity_level, 2);
        assert_eq!(cell.description, "10 Jun 2024: 50 journeys");
    }

    #[test]
    fn layouts_expose_row_order() {
        assert_eq!(
            GridLayout::full_range().weekdays(),
            [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun
            ]
        );
        let sunday_first = GridLayout::trailing(53).weekdays();
        assert_eq!(sunday_first[0], Weekday::Sun);
        assert_eq!(sunday_first[6], Weekday::Sat);
    }

    #[test]
    fn zero_trailing_weeks_is_an_empty_grid() {
        let grid = build_grid(&Activity::default(), day(2024, 6, 12), GridLayout::trailing(0));
        assert!(grid.is_empty());
    }
}
