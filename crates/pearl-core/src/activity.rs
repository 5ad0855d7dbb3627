use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::datetime::{format_iso_day, parse_day, parse_export_day};
use crate::error::HeatmapError;

/// Journey counts keyed by ISO `YYYY-MM-DD` date, as handed over by a source.
pub type RawActivity = BTreeMap<String, u64>;

/// One observed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRecord {
    pub date: NaiveDate,
    pub count: u64,
}

/// A validated mapping of calendar day to journey count. Days that are not
/// present were never observed and read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activity {
    days: BTreeMap<NaiveDate, u64>,
}

impl Activity {
    /// Parses every key of `raw`. The first key that is not a calendar date
    /// aborts the whole parse.
    #[tracing::instrument(skip_all, fields(entries = raw.len()))]
    pub fn parse(raw: &RawActivity) -> Result<Self, HeatmapError> {
        let mut days = BTreeMap::new();
        for (key, count) in raw {
            let date = parse_day(key)?;
            days.insert(date, *count);
        }
        debug!(days = days.len(), "parsed activity mapping");
        Ok(Self { days })
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ActivityRecord>,
    {
        let mut days = BTreeMap::new();
        for record in records {
            let slot = days.entry(record.date).or_insert(0_u64);
            *slot = slot.saturating_add(record.count);
        }
        Self { days }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn count_on(&self, date: NaiveDate) -> u64 {
        self.days.get(&date).copied().unwrap_or(0)
    }

    /// Largest count anywhere in the mapping; zero when empty.
    pub fn max_count(&self) -> u64 {
        self.days.values().copied().max().unwrap_or(0)
    }

    /// Sum of every count, pinned at `u64::MAX` rather than wrapping.
    pub fn total(&self) -> u64 {
        self.days.values().fold(0, |acc, count| acc.saturating_add(*count))
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    /// Records in chronological order.
    pub fn records(&self) -> impl Iterator<Item = ActivityRecord> + '_ {
        self.days
            .iter()
            .map(|(date, count)| ActivityRecord { date: *date, count: *count })
    }

    pub fn to_raw(&self) -> RawActivity {
        self.days
            .iter()
            .map(|(date, count)| (format_iso_day(*date), *count))
            .collect()
    }
}

/// Supplies the per-day journey counts. Implementations must fail rather
/// than return a partial mapping.
pub trait ActivitySource: Send + Sync {
    fn name(&self) -> String;

    fn fetch_activity(&self, reference: DateTime<Utc>) -> Result<RawActivity, HeatmapError>;
}

/// In-memory source.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    activity: RawActivity,
}

impl StaticSource {
    pub fn new(activity: RawActivity) -> Self {
        Self { activity }
    }
}

impl ActivitySource for StaticSource {
    fn name(&self) -> String {
        "static".to_string()
    }

    fn fetch_activity(&self, _reference: DateTime<Utc>) -> Result<RawActivity, HeatmapError> {
        Ok(self.activity.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JourneyRow {
    date: String,
    count: u64,
}

/// Reads journey counts from a JSON-lines export, one
/// `{"date": "...", "count": N}` object per line.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ActivitySource for JsonlSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    #[tracing::instrument(skip(self), fields(file = %self.path.display()))]
    fn fetch_activity(&self, reference: DateTime<Utc>) -> Result<RawActivity, HeatmapError> {
        debug!(%reference, "loading journey counts");
        let records = load_jsonl(&self.path)
            .map_err(|reason| HeatmapError::source_unavailable(self.name(), reason))?;

        let activity = Activity::from_records(records);
        info!(
            days = activity.len(),
            total = activity.total(),
            "loaded journey counts"
        );
        Ok(activity.to_raw())
    }
}

fn load_jsonl(path: &Path) -> Result<Vec<ActivityRecord>, String> {
    let file = fs::File::open(path).map_err(|err| format!("failed to open: {err}"))?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| format!("failed reading line {}: {err}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let row: JourneyRow = serde_json::from_str(trimmed)
            .map_err(|err| format!("failed parsing line {}: {err}", idx + 1))?;
        let date = parse_export_day(&row.date)
            .map_err(|err| format!("line {}: {err}", idx + 1))?;
        out.push(ActivityRecord { date, count: row.count });
    }

    debug!(count = out.len(), "loaded rows from jsonl");
    Ok(out)
}
