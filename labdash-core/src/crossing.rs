//! Threshold crossings of a lab series.
//!
//! A crossing is the instant, found by linear interpolation between two
//! consecutive samples, at which the series passes from one side of a limit
//! to the other. Each crossing is tagged with the treatments active at that
//! instant so the chart can show "day +N of treatment X".
//!
//! Bad samples never abort detection: segments with unparsable dates,
//! non-increasing dates or non-finite values are skipped.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::date_scale::{parse_iso_date, to_iso_date};
use crate::treatment::{treatments_at, TreatmentDay, TreatmentInterval};
use crate::{SeriesPoint, Timestamp};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CrossingDirection {
    Up,
    Down,
}

impl CrossingDirection {
    /// `Down` when leaving `>= limit` for `< limit`, `Up` when leaving
    /// `<= limit` for `> limit`. A segment that only reaches the limit is
    /// not a crossing.
    pub fn between(v0: f64, v1: f64, limit: f64) -> Option<Self> {
        if v0 >= limit && v1 < limit {
            Some(CrossingDirection::Down)
        } else if v0 <= limit && v1 > limit {
            Some(CrossingDirection::Up)
        } else {
            None
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            CrossingDirection::Up => "↑",
            CrossingDirection::Down => "↓",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossingEvent {
    pub direction: CrossingDirection,
    pub ts: Timestamp,
    pub date_iso: String,
    /// Index of the sample before the crossing.
    pub i0: usize,
    /// Index of the sample after the crossing.
    pub i1: usize,
    pub v0: f64,
    pub v1: f64,
    #[serde(default)]
    pub treatments: Vec<TreatmentDay>,
}

impl CrossingEvent {
    pub fn treatment(&self, name: &str, start: Timestamp) -> Option<&TreatmentDay> {
        self.treatments
            .iter()
            .find(|day| day.name == name && day.start == start)
    }
}

/// Crossings of `series` against `limit`, without treatment context.
pub fn detect(series: &[SeriesPoint], limit: f64) -> Vec<CrossingEvent> {
    let mut out = Vec::new();
    if series.len() < 2 || !limit.is_finite() {
        return out;
    }

    for (i0, pair) in series.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        if !a.value.is_finite() || !b.value.is_finite() {
            continue;
        }
        let (Some(t0), Some(t1)) = (parse_iso_date(&a.date), parse_iso_date(&b.date)) else {
            debug!("segment {i0} skipped: unparsable date");
            continue;
        };
        if t1 <= t0 {
            continue;
        }
        if let Some(event) = interpolate(i0, (t0, a.value), (t1, b.value), limit) {
            out.push(event);
        }
    }
    out
}

fn interpolate(
    i0: usize,
    (t0, v0): (Timestamp, f64),
    (t1, v1): (Timestamp, f64),
    limit: f64,
) -> Option<CrossingEvent> {
    let direction = CrossingDirection::between(v0, v1, limit)?;
    let slope = v1 - v0;
    if slope == 0.0 {
        return None;
    }
    let alpha = (limit - v0) / slope;
    if !(0.0..=1.0).contains(&alpha) {
        return None;
    }

    let ts = (t0 as f64 + (t1 - t0) as f64 * alpha).round() as Timestamp;
    Some(CrossingEvent {
        direction,
        ts,
        date_iso: to_iso_date(ts),
        i0,
        i1: i0 + 1,
        v0,
        v1,
        treatments: Vec::new(),
    })
}

/// Tag each crossing with every interval containing it.
pub fn attach_treatments(
    crossings: Vec<CrossingEvent>,
    intervals: &[TreatmentInterval],
) -> Vec<CrossingEvent> {
    crossings
        .into_iter()
        .map(|mut crossing| {
            crossing.treatments = treatments_at(crossing.ts, intervals);
            crossing
        })
        .collect()
}

pub fn detect_with_treatments(
    series: &[SeriesPoint],
    limit: f64,
    intervals: &[TreatmentInterval],
) -> Vec<CrossingEvent> {
    attach_treatments(detect(series, limit), intervals)
}
