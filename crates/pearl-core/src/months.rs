use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::datetime::month_abbrev;

/// Horizontal run of week-columns attributed to one calendar month.
/// `offset` and `width` are in the caller's column units (pixels or
/// characters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthLabel {
    pub name: String,
    pub offset: usize,
    pub width: usize,
}

/// Labels the week-columns starting on `week_starts`, each `column_width`
/// wide. A new label opens whenever a column starts in a different month
/// from the previous column; each label is closed by the next one, and the
/// last by the total grid width. Months in which no column starts get no
/// label.
pub fn month_labels(week_starts: &[NaiveDate], column_width: usize) -> Vec<MonthLabel> {
    let mut labels: Vec<MonthLabel> = Vec::new();
    let mut previous: Option<(i32, u32)> = None;

    for (idx, start) in week_starts.iter().enumerate() {
        let month = (start.year(), start.month());
        if previous == Some(month) {
            continue;
        }

        let offset = idx * column_width;
        if let Some(open) = labels.last_mut() {
            open.width = offset - open.offset;
        }
        labels.push(MonthLabel {
            name: month_abbrev(*start),
            offset,
            width: 0,
        });
        previous = Some(month);
    }

    if let Some(last) = labels.last_mut() {
        last.width = week_starts.len() * column_width - last.offset;
    }

    labels
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::month_labels;
    use crate::datetime::add_days;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn weekly(start: NaiveDate, weeks: usize) -> Vec<NaiveDate> {
        (0..weeks).map(|w| add_days(start, 7 * w as i64)).collect()
    }

    #[test]
    fn labels_partition_the_grid_width() {
        // 2024-01-07 is a Sunday; ten weeks reach into March.
        let labels = month_labels(&weekly(day(2024, 1, 7), 10), 13);

        let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Jan", "Feb", "Mar"]);

        assert_eq!(labels[0].offset, 0);
        for pair in labels.windows(2) {
            assert_eq!(pair[0].offset + pair[0].width, pair[1].offset);
        }
        let total: usize = labels.iter().map(|l| l.width).sum();
        assert_eq!(total, 10 * 13);

        // Jan 7, 14, 21, 28 -> four columns.
        assert_eq!(labels[0].width, 4 * 13);
        // Feb 4, 11, 18, 25 -> four columns.
        assert_eq!(labels[1].offset, 4 * 13);
        assert_eq!(labels[1].width, 4 * 13);
    }

    #[test]
    fn single_month_yields_one_full_width_label() {
        let labels = month_labels(&weekly(day(2024, 4, 1), 3), 3);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Apr");
        assert_eq!(labels[0].offset, 0);
        assert_eq!(labels[0].width, 9);

        let one = month_labels(&[day(2024, 4, 28)], 13);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].width, 13);
    }

    #[test]
    fn months_without_a_starting_column_are_skipped() {
        let starts = vec![day(2024, 1, 29), day(2024, 3, 4)];
        let labels = month_labels(&starts, 3);
        let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Jan", "Mar"]);
        assert_eq!(labels[1].offset, 3);
        assert_eq!(labels[1].width, 3);
    }

    #[test]
    fn same_month_in_different_years_gets_separate_labels() {
        let starts = vec![day(2023, 1, 30), day(2024, 1, 1)];
        let labels = month_labels(&starts, 1);
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn no_columns_no_labels() {
        assert!(month_labels(&[], 13).is_empty());
    }
}
