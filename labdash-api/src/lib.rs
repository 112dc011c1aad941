//! Backend JSON payloads (`/series`, `/ranges`, `/timeline`,
//! `/param_limits`) to `DashboardSnapshot`.
//!
//! Payloads are read leniently: a bad point, record or limit is dropped and
//! the rest of the payload still goes through. Only a payload missing its
//! top-level collection is rejected.

use std::collections::HashMap;

use chrono::Utc;
use labdash_core::annotation::{limit_annotations, merge, range_annotations};
use labdash_core::date_scale::{extent_with_horizon, parse_iso_date};
use labdash_core::summary::summarize_treatments;
use labdash_core::timeline::{events_within, group_by_day, timeline_areas, timeline_events};
use labdash_core::treatment::build_intervals;
use labdash_core::{
    crossing, kpi, DashboardConfig, DashboardError, DashboardSnapshot, HospitalStayRecord,
    LimitDefinition, ParameterPanel, RangeBand, SeriesPoint, TimelineData, TreatmentInterval,
    TreatmentRecord,
};
use log::{debug, warn};
use serde_json::Value;

/// One selected parameter with its series and limits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterInput {
    pub key: String,
    pub label: Option<String>,
    pub points: Vec<SeriesPoint>,
    pub limits: Vec<LimitDefinition>,
}

/// Inputs of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardInput {
    pub parameters: Vec<ParameterInput>,
    pub ranges: HashMap<String, RangeBand>,
    pub timeline: TimelineData,
}

/// Summarize a dashboard bundle given as JSON text.
pub fn summarize_bundle_str(
    bundle_json: &str,
    config: &DashboardConfig,
) -> Result<DashboardSnapshot, DashboardError> {
    let value: Value =
        serde_json::from_str(bundle_json).map_err(|err| DashboardError::Parse(err.to_string()))?;
    summarize_bundle_value(&value, config)
}

/// Summarize a dashboard bundle:
/// `{ "parameters": [{ "key", "series", "limits" }], "ranges", "timeline" }`
/// where each nested payload has the backend's response shape.
pub fn summarize_bundle_value(
    bundle: &Value,
    config: &DashboardConfig,
) -> Result<DashboardSnapshot, DashboardError> {
    let input = parse_bundle(bundle)?;
    Ok(summarize_dashboard(&input, config))
}

/// Only a missing `parameters` list rejects the bundle. A broken series,
/// limits, ranges or timeline payload is logged and replaced by an empty one
/// so the other panels still render.
pub fn parse_bundle(bundle: &Value) -> Result<DashboardInput, DashboardError> {
    let parameters = bundle
        .get("parameters")
        .and_then(Value::as_array)
        .ok_or(DashboardError::MissingData)?;

    let mut input = DashboardInput::default();

    for entry in parameters {
        let Some(key) = entry.get("key").and_then(non_empty_str) else {
            debug!("parameter without key skipped");
            continue;
        };
        let series = entry.get("series");
        let points = series
            .map(|series| {
                parse_series(series).unwrap_or_else(|err| {
                    warn!("{key}: series payload ignored: {err}");
                    Vec::new()
                })
            })
            .unwrap_or_default();
        let limits = entry
            .get("limits")
            .filter(|limits| !limits.is_null())
            .map(|limits| {
                parse_limits(limits).unwrap_or_else(|err| {
                    warn!("{key}: limits payload ignored: {err}");
                    Vec::new()
                })
            })
            .unwrap_or_default();
        let label = series
            .and_then(|series| series.get("label"))
            .and_then(non_empty_str)
            .or_else(|| entry.get("label").and_then(non_empty_str));

        input.parameters.push(ParameterInput {
            key,
            label,
            points,
            limits,
        });
    }

    if let Some(ranges) = bundle.get("ranges").filter(|v| !v.is_null()) {
        input.ranges = parse_ranges(ranges).unwrap_or_else(|err| {
            warn!("ranges payload ignored: {err}");
            HashMap::new()
        });
    }
    if let Some(timeline) = bundle.get("timeline").filter(|v| !v.is_null()) {
        input.timeline = parse_timeline(timeline).unwrap_or_else(|err| {
            warn!("timeline payload ignored: {err}");
            TimelineData::default()
        });
    }

    Ok(input)
}

/// `/series` response: `{ "points": [{ "date", "value" }] }`. A bare array
/// of points or of `[date, value]` pairs is accepted as well.
pub fn parse_series(payload: &Value) -> Result<Vec<SeriesPoint>, DashboardError> {
    let raw = match payload {
        Value::Array(items) => items,
        _ => payload
            .get("points")
            .and_then(Value::as_array)
            .ok_or(DashboardError::MissingData)?,
    };

    let mut points: Vec<(i64, SeriesPoint)> = raw
        .iter()
        .filter_map(|item| {
            let (date, value) = match item {
                Value::Array(pair) => (pair.first()?, pair.get(1)?),
                _ => (item.get("date")?, item.get("value")?),
            };
            let date = date.as_str()?.trim();
            let Some(ts) = parse_iso_date(date) else {
                debug!("series point with unparsable date {date:?} dropped");
                return None;
            };
            let value = number_from(value)?;
            Some((ts, SeriesPoint::new(date, value)))
        })
        .collect();

    points.sort_by_key(|(ts, _)| *ts);
    Ok(points.into_iter().map(|(_, point)| point).collect())
}

/// `/ranges` response: `{ "ranges": { key: { min, max, unit, label, category } } }`.
pub fn parse_ranges(payload: &Value) -> Result<HashMap<String, RangeBand>, DashboardError> {
    let ranges = payload
        .get("ranges")
        .and_then(Value::as_object)
        .ok_or(DashboardError::MissingData)?;

    Ok(ranges
        .iter()
        .filter(|(_, band)| band.is_object())
        .map(|(key, band)| {
            let band = RangeBand {
                min: band.get("min").and_then(number_from),
                max: band.get("max").and_then(number_from),
                unit: band.get("unit").and_then(non_empty_str),
                label: band.get("label").and_then(non_empty_str),
                category: band.get("category").and_then(non_empty_str),
            };
            (key.clone(), band)
        })
        .collect())
}

/// `/timeline` response. Treatments are read from `treatments`, falling
/// back to the `treatments.js` key older backends emitted.
pub fn parse_timeline(payload: &Value) -> Result<TimelineData, DashboardError> {
    if !payload.is_object() {
        return Err(DashboardError::MissingData);
    }

    let treatment_default_days = payload
        .get("config")
        .and_then(|config| config.get("treatment_default_days"))
        .and_then(whole_days);

    let treatments = payload
        .get("treatments")
        .or_else(|| payload.get("treatments.js"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_treatment).collect())
        .unwrap_or_default();

    let hospital_stays = payload
        .get("hospital_stays")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_hospital_stay).collect())
        .unwrap_or_default();

    Ok(TimelineData {
        treatment_default_days,
        treatments,
        hospital_stays,
    })
}

/// `/param_limits` response: `{ "limits": [{ label, value, enabled }] }`.
pub fn parse_limits(payload: &Value) -> Result<Vec<LimitDefinition>, DashboardError> {
    let limits = match payload {
        Value::Array(items) => items,
        _ => payload
            .get("limits")
            .and_then(Value::as_array)
            .ok_or(DashboardError::MissingData)?,
    };

    Ok(limits
        .iter()
        .filter_map(|limit| {
            let value = limit.get("value").and_then(number_from)?;
            Some(LimitDefinition {
                label: limit.get("label").and_then(non_empty_str),
                value,
                enabled: limit.get("enabled").map_or(true, flag_from),
            })
        })
        .collect())
}

/// Assemble the panel of one parameter.
pub fn summarize_parameter(
    param: &ParameterInput,
    band: &RangeBand,
    intervals: &[TreatmentInterval],
    config: &DashboardConfig,
) -> ParameterPanel {
    let crossing_limit = param
        .limits
        .iter()
        .find(|limit| limit.is_active())
        .map(|limit| limit.value);

    let crossings = crossing_limit
        .map(|limit| crossing::detect_with_treatments(&param.points, limit, intervals))
        .unwrap_or_default();
    if !crossings.is_empty() {
        debug!(
            "{}: {} crossing(s) of limit {:?}",
            param.key,
            crossings.len(),
            crossing_limit
        );
    }

    let annotations = merge(
        range_annotations(band),
        limit_annotations(&param.limits),
        config.annotation_step_px,
    );

    let label = param
        .label
        .clone()
        .or_else(|| band.label.clone())
        .unwrap_or_else(|| param.key.clone());

    ParameterPanel {
        key: param.key.clone(),
        label,
        unit: band.unit.clone(),
        kpi: kpi::aggregate(&param.points, band, config.recent_alert_limit),
        crossing_limit,
        crossings,
        annotations,
        points: param.points.clone(),
    }
}

/// Run every analysis of one refresh cycle.
pub fn summarize_dashboard(input: &DashboardInput, config: &DashboardConfig) -> DashboardSnapshot {
    let default_days = input.timeline.default_days(config);
    let intervals = build_intervals(&input.timeline.treatments, default_days);

    let extent = extent_with_horizon(
        input.parameters.iter().map(|param| param.points.as_slice()),
        config.extent_pad_days,
        config.extent_horizon_days,
    );

    let events = timeline_events(&input.timeline);
    let markers = group_by_day(&events_within(&events, &extent));
    let areas = timeline_areas(&input.timeline, default_days);

    let unbounded = RangeBand::default();
    let panels: Vec<ParameterPanel> = input
        .parameters
        .iter()
        .map(|param| {
            let band = input.ranges.get(&param.key).unwrap_or(&unbounded);
            summarize_parameter(param, band, &intervals, config)
        })
        .collect();

    let treatment_summaries = summarize_treatments(
        &intervals,
        panels.iter().filter_map(|panel| {
            panel
                .crossing_limit
                .map(|limit| (panel.key.as_str(), limit, panel.crossings.as_slice()))
        }),
    );

    DashboardSnapshot {
        generated_at: Utc::now(),
        extent,
        intervals,
        markers,
        areas,
        panels,
        treatment_summaries,
    }
}

fn parse_treatment(value: &Value) -> Option<TreatmentRecord> {
    if !value.is_object() {
        return None;
    }
    Some(TreatmentRecord {
        name: value.get("name").and_then(non_empty_str),
        start_date: value.get("start_date").and_then(non_empty_str),
        end_date: value.get("end_date").and_then(non_empty_str),
        standard_days: value.get("standard_days").and_then(whole_days),
        notes: value.get("notes").and_then(non_empty_str),
    })
}

fn parse_hospital_stay(value: &Value) -> Option<HospitalStayRecord> {
    if !value.is_object() {
        return None;
    }
    Some(HospitalStayRecord {
        admission_date: value.get("admission_date").and_then(non_empty_str),
        discharge_date: value.get("discharge_date").and_then(non_empty_str),
        notes: value.get("notes").and_then(non_empty_str),
    })
}

fn non_empty_str(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Finite number, or a numeric string (decimal comma allowed).
fn number_from(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn whole_days(value: &Value) -> Option<i64> {
    number_from(value).map(|days| days.round() as i64)
}

fn flag_from(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !matches!(text.trim(), "0" | "false"),
        _ => true,
    }
}
