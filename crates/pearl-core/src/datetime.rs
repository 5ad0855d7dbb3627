use anyhow::anyhow;
use chrono::{
  DateTime,
  Datelike,
  Duration,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;

use crate::error::HeatmapError;

pub const ISO_DAY_FORMAT: &str =
  "%Y-%m-%d";
const EXPORT_DAY_FORMAT: &str =
  "%d-%b-%y";
const LABEL_DAY_FORMAT: &str =
  "%d %b %Y";

/// Parses a mapping key. Only
/// `YYYY-MM-DD` is accepted.
pub fn parse_day(
  input: &str
) -> Result<NaiveDate, HeatmapError> {
  NaiveDate::parse_from_str(
    input,
    ISO_DAY_FORMAT
  )
  .map_err(|_| {
    HeatmapError::DateParse {
      input: input.to_string()
    }
  })
}

/// Parses a row date as it appears in
/// journey exports: `15-Jan-24`, or
/// ISO as a fallback.
pub fn parse_export_day(
  input: &str
) -> Result<NaiveDate, HeatmapError> {
  let token = input.trim();
  NaiveDate::parse_from_str(
    token,
    EXPORT_DAY_FORMAT
  )
  .or_else(|_| parse_day(token))
}

#[must_use]
pub fn format_iso_day(
  day: NaiveDate
) -> String {
  day.format(ISO_DAY_FORMAT).to_string()
}

#[must_use]
pub fn format_day_label(
  day: NaiveDate
) -> String {
  day
    .format(LABEL_DAY_FORMAT)
    .to_string()
}

#[must_use]
pub fn month_abbrev(
  day: NaiveDate
) -> String {
  day.format("%b").to_string()
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

/// First day of the week containing
/// `day`, for weeks beginning on
/// `week_start`.
pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

pub fn end_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  add_days(
    start_of_week(day, week_start),
    6
  )
}

/// Calendar day of `now` as seen from
/// `timezone`.
#[must_use]
pub fn reference_day(
  now: DateTime<Utc>,
  timezone: Tz
) -> NaiveDate {
  now
    .with_timezone(&timezone)
    .date_naive()
}

pub fn parse_timezone(
  raw: &str
) -> anyhow::Result<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(anyhow!(
      "timezone cannot be empty"
    ));
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        timezone = %trimmed,
        "parsed timezone"
      );
      Ok(tz)
    }
    | Err(err) => {
      Err(anyhow!(
        "invalid timezone id \
         {trimmed:?}: {err}"
      ))
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    TimeZone,
    Utc,
    Weekday
  };

  use super::{
    end_of_week,
    format_day_label,
    parse_day,
    parse_export_day,
    parse_timezone,
    reference_day,
    start_of_week
  };

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn parses_iso_keys_strictly() {
    assert_eq!(
      parse_day("2024-01-15")
        .expect("iso day"),
      day(2024, 1, 15)
    );
    let err = parse_day("not-a-date")
      .expect_err("bad key");
    assert!(err.is_date_parse());
    assert!(
      parse_day("2024-02-30").is_err()
    );
    assert!(
      parse_day("15-Jan-24").is_err()
    );
  }

  #[test]
  fn parses_export_dates() {
    assert_eq!(
      parse_export_day("15-Jan-24")
        .expect("export day"),
      day(2024, 1, 15)
    );
    assert_eq!(
      parse_export_day("2024-01-15")
        .expect("iso fallback"),
      day(2024, 1, 15)
    );
  }

  #[test]
  fn aligns_weeks_for_both_conventions(
  ) {
    // 2024-01-17 is a Wednesday.
    let wed = day(2024, 1, 17);
    assert_eq!(
      start_of_week(wed, Weekday::Mon),
      day(2024, 1, 15)
    );
    assert_eq!(
      end_of_week(wed, Weekday::Mon),
      day(2024, 1, 21)
    );
    assert_eq!(
      start_of_week(wed, Weekday::Sun),
      day(2024, 1, 14)
    );
    assert_eq!(
      end_of_week(wed, Weekday::Sun),
      day(2024, 1, 20)
    );

    let sunday = day(2024, 1, 21);
    assert_eq!(
      start_of_week(
        sunday,
        Weekday::Sun
      ),
      sunday
    );
    assert_eq!(
      end_of_week(sunday, Weekday::Mon),
      sunday
    );
  }

  #[test]
  fn formats_human_labels() {
    assert_eq!(
      format_day_label(day(2024, 1, 5)),
      "05 Jan 2024"
    );
  }

  #[test]
  fn reference_day_follows_timezone() {
    let now = Utc
      .with_ymd_and_hms(
        2026, 2, 17, 23, 30, 0
      )
      .single()
      .expect("valid now");
    let london =
      parse_timezone("Europe/London")
        .expect("london");
    let tokyo =
      parse_timezone("Asia/Tokyo")
        .expect("tokyo");
    assert_eq!(
      reference_day(now, london),
      day(2026, 2, 17)
    );
    assert_eq!(
      reference_day(now, tokyo),
      day(2026, 2, 18)
    );
    assert!(
      parse_timezone("Mars/Olympus")
        .is_err()
    );
  }
}
