use chrono::NaiveDate;
use serde::Serialize;

use crate::activity::{Activity, RawActivity};
use crate::error::HeatmapError;
use crate::grid::{Cell, GridLayout, build_grid};
use crate::months::MonthLabel;
use crate::summary::Summary;

/// Pixel width of one week-column in the browser view: an 11px cell plus a
/// 2px gap.
pub const CELL_WIDTH_PX: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapSettings {
    pub trailing_weeks: u32,
    pub window_days: u32,
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            trailing_weeks: GridLayout::TRAILING_WEEKS,
            window_days: crate::summary::DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Everything the browser view draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapData {
    pub weeks: Vec<Vec<Cell>>,
    pub month_labels: Vec<MonthLabel>,
    pub total_journeys: u64,
    pub active_days: usize,
    pub busiest_day: String,
}

impl HeatmapData {
    pub fn grid_width(&self) -> usize {
        self.weeks.len() * CELL_WIDTH_PX
    }
}

/// Builds the Sunday-start trailing-window payload for the browser view.
/// Any key that is not a calendar date fails the whole build.
#[tracing::instrument(skip(raw), fields(entries = raw.len()))]
pub fn build_heatmap_data(
    raw: &RawActivity,
    today: NaiveDate,
    settings: HeatmapSettings,
) -> Result<HeatmapData, HeatmapError> {
    let activity = Activity::parse(raw)?;

    let grid = build_grid(&activity, today, GridLayout::trailing(settings.trailing_weeks));
    let month_labels = grid.month_labels(CELL_WIDTH_PX);
    let summary = Summary::trailing(&activity, today, settings.window_days);

    Ok(HeatmapData {
        weeks: grid.into_columns(),
        month_labels,
        total_journeys: summary.total_count,
        active_days: summary.active_day_count,
        busiest_day: summary.busiest_date_label,
    })
}
