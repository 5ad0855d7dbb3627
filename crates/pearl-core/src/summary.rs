use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::activity::Activity;
use crate::datetime::{add_days, format_day_label};

pub const DEFAULT_WINDOW_DAYS: u32 = 365;

/// Shown as the busiest day when the window has no journeys.
pub const NO_DATA_LABEL: &str = "–";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_count: u64,
    pub active_day_count: usize,
    pub busiest_date_label: String,
}

impl Summary {
    /// Aggregates the records dated within `[today - window_days, today]`.
    ///
    /// Every record in the window counts as an active day, zero counts
    /// included. The busiest day is the first record, in date order, with
    /// the strictly greatest non-zero count.
    #[tracing::instrument(skip(activity))]
    pub fn trailing(activity: &Activity, today: NaiveDate, window_days: u32) -> Self {
        let since = add_days(today, -i64::from(window_days));

        let mut total_count: u64 = 0;
        let mut active_day_count = 0;
        let mut busiest: Option<(NaiveDate, u64)> = None;

        for record in activity
            .records()
            .filter(|r| r.date >= since && r.date <= today)
        {
            total_count = total_count.saturating_add(record.count);
            active_day_count += 1;
            let best = busiest.map(|(_, count)| count).unwrap_or(0);
            if record.count > best {
                busiest = Some((record.date, record.count));
            }
        }

        let busiest_date_label = busiest
            .map(|(date, _)| format_day_label(date))
            .unwrap_or_else(|| NO_DATA_LABEL.to_string());

        debug!(
            %since,
            total_count,
            active_day_count,
            busiest = %busiest_date_label,
            "computed trailing summary"
        );

        Self {
            total_count,
            active_day_count,
            busiest_date_label,
        }
    }
}
