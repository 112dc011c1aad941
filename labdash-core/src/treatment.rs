//! Concrete treatment windows derived from timeline records.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::date_scale::parse_optional_date;
use crate::{Timestamp, TreatmentRecord, DAY_MS};

pub const DEFAULT_TREATMENT_NAME: &str = "Tratamiento";

/// Window during which a treatment is considered active. `end >= start`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreatmentInterval {
    pub name: String,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TreatmentInterval {
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Treatment day on which the interval ends.
    pub fn day_span(&self) -> i64 {
        treatment_day(self.end, self.start)
    }
}

/// Treatment active at some instant, with its 1-indexed treatment day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreatmentDay {
    pub name: String,
    pub day: i64,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Day 1 is the start date itself.
pub fn treatment_day(ts: Timestamp, start: Timestamp) -> i64 {
    (ts - start).div_euclid(DAY_MS) + 1
}

/// End of a treatment: the explicit end date, else `start` plus the
/// standard (or default) number of days. `None` means open-ended.
pub fn resolve_end(
    record: &TreatmentRecord,
    start: Timestamp,
    default_days: Option<i64>,
) -> Option<Timestamp> {
    if let Some(end) = parse_optional_date(record.end_date.as_deref()) {
        return Some(end);
    }
    let days = record.standard_days.or(default_days)?;
    days.checked_mul(DAY_MS)
        .and_then(|span| start.checked_add(span))
}

pub fn display_name(record: &TreatmentRecord) -> String {
    match record.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_TREATMENT_NAME.to_string(),
    }
}

/// Build the intervals for every bounded treatment. Records without a start,
/// open-ended records and reversed windows are left out.
pub fn build_intervals(
    records: &[TreatmentRecord],
    default_days: Option<i64>,
) -> Vec<TreatmentInterval> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let Some(start) = parse_optional_date(record.start_date.as_deref()) else {
            debug!("treatment {:?} skipped: no usable start date", record.name);
            continue;
        };
        let Some(end) = resolve_end(record, start, default_days) else {
            debug!("treatment {:?} skipped: open-ended", record.name);
            continue;
        };
        if end < start {
            debug!("treatment {:?} skipped: ends before it starts", record.name);
            continue;
        }
        out.push(TreatmentInterval {
            name: display_name(record),
            start,
            end,
        });
    }
    out
}

/// Every interval active at `ts`.
pub fn treatments_at(ts: Timestamp, intervals: &[TreatmentInterval]) -> Vec<TreatmentDay> {
    intervals
        .iter()
        .filter(|interval| interval.contains(ts))
        .map(|interval| TreatmentDay {
            name: interval.name.clone(),
            day: treatment_day(ts, interval.start),
            start: interval.start,
            end: interval.end,
        })
        .collect()
}
