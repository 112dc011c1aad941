//! Calendar-date and zoom-percentage conversions.
//!
//! Every lab date is a UTC calendar day; conversion to local time is left to
//! the renderer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{SeriesPoint, Timestamp, DAY_MS};

pub const DEFAULT_PAD_DAYS: u32 = 7;
pub const DEFAULT_HORIZON_DAYS: u32 = 60;

/// Time bounds of the chart. Both ends are absent for an empty chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TimeExtent {
    pub min_ts: Option<Timestamp>,
    pub max_ts: Option<Timestamp>,
}

impl TimeExtent {
    pub fn new(min_ts: Timestamp, max_ts: Timestamp) -> Self {
        Self {
            min_ts: Some(min_ts),
            max_ts: Some(max_ts),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.min_ts?, self.max_ts?))
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        match self.bounds() {
            Some((min, max)) => ts >= min && ts <= max,
            None => true,
        }
    }
}

/// `YYYY-MM-DD` of the given timestamp, or an empty string when it is out of
/// the representable range.
pub fn to_iso_date(ts: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Midnight of the given calendar day.
pub fn parse_iso_date(value: &str) -> Option<Timestamp> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

pub fn parse_optional_date(value: Option<&str>) -> Option<Timestamp> {
    value.and_then(parse_iso_date)
}

pub fn percent_to_timestamp(
    pct: f64,
    min_ts: Option<Timestamp>,
    max_ts: Option<Timestamp>,
) -> Option<Timestamp> {
    let (min, max) = (min_ts?, max_ts?);
    if !pct.is_finite() {
        return None;
    }
    let offset = (max - min) as f64 * (pct / 100.0);
    Some(min + offset.round() as i64)
}

/// Position of `ts` inside the extent, clamped to `[0, 100]`.
///
/// A degenerate extent (absent bounds or `min == max`, e.g. a single lab
/// draw) maps everything to `0`.
pub fn timestamp_to_percent(
    ts: Timestamp,
    min_ts: Option<Timestamp>,
    max_ts: Option<Timestamp>,
) -> f64 {
    let (Some(min), Some(max)) = (min_ts, max_ts) else {
        return 0.0;
    };
    if max == min {
        return 0.0;
    }
    let pct = (ts - min) as f64 / (max - min) as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

/// First and last sample of a series.
pub fn extent_of(series: &[SeriesPoint]) -> TimeExtent {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return TimeExtent::empty();
    };
    match (parse_iso_date(&first.date), parse_iso_date(&last.date)) {
        (Some(min), Some(max)) => TimeExtent::new(min, max),
        _ => TimeExtent::empty(),
    }
}

/// Union of all parsable sample dates, widened by `pad_days` before and
/// `horizon_days` after so projected treatment ends stay on screen.
pub fn extent_with_horizon<'a, I>(series_list: I, pad_days: u32, horizon_days: u32) -> TimeExtent
where
    I: IntoIterator<Item = &'a [SeriesPoint]>,
{
    let mut bounds: Option<(Timestamp, Timestamp)> = None;
    for series in series_list {
        for ts in series.iter().filter_map(|point| parse_iso_date(&point.date)) {
            bounds = Some(match bounds {
                Some((min, max)) => (min.min(ts), max.max(ts)),
                None => (ts, ts),
            });
        }
    }

    match bounds {
        Some((min, max)) => TimeExtent::new(
            min - i64::from(pad_days) * DAY_MS,
            max + i64::from(horizon_days) * DAY_MS,
        ),
        None => TimeExtent::empty(),
    }
}

pub fn percent_to_date(series: &[SeriesPoint], pct: f64) -> Option<Timestamp> {
    let extent = extent_of(series);
    percent_to_timestamp(pct, extent.min_ts, extent.max_ts)
}
