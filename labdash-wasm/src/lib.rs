//! WASM <-> JavaScript bridge, independent of any chart library.
//!
//! Timestamps cross the boundary as JS numbers (milliseconds since epoch).

use labdash_core::date_scale;
use labdash_core::{DashboardConfig, DashboardError, LegendSelection, Timestamp, ViewState};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
struct JsDashboardConfig {
    #[serde(default)]
    treatment_default_days: Option<u32>,
    #[serde(default)]
    annotation_step_px: Option<f64>,
    #[serde(default)]
    extent_pad_days: Option<u32>,
    #[serde(default)]
    extent_horizon_days: Option<u32>,
    #[serde(default)]
    recent_alert_limit: Option<usize>,
}

impl From<JsDashboardConfig> for DashboardConfig {
    fn from(cfg: JsDashboardConfig) -> Self {
        let mut base = DashboardConfig::default();
        if let Some(days) = cfg.treatment_default_days {
            base.treatment_default_days = Some(days);
        }
        if let Some(step) = cfg.annotation_step_px.filter(|step| step.is_finite()) {
            base.annotation_step_px = step;
        }
        if let Some(days) = cfg.extent_pad_days {
            base.extent_pad_days = days;
        }
        if let Some(days) = cfg.extent_horizon_days {
            base.extent_horizon_days = days;
        }
        if let Some(limit) = cfg.recent_alert_limit {
            base.recent_alert_limit = limit;
        }
        base
    }
}

#[derive(Serialize)]
struct LegendUpdate {
    state: ViewState,
    /// Selection to restore when the user hid every series.
    restore: Option<LegendSelection>,
}

/// Build the dashboard snapshot from a bundle of backend payloads.
#[wasm_bindgen]
pub fn summarize_bundle(
    input_bundle: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let bundle_value = from_value::<serde_json::Value>(input_bundle)
        .map_err(|err| JsValue::from_str(&format!("No se pudo leer el bundle JSON: {err}")))?;

    let cfg = match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsDashboardConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("No se pudo leer la config: {err}")))?;
            DashboardConfig::from(cfg)
        }
        _ => DashboardConfig::default(),
    };

    let snapshot = labdash_api::summarize_bundle_value(&bundle_value, &cfg)
        .map_err(|err| JsValue::from_str(&format_dashboard_error(err)))?;

    to_js(&snapshot)
}

#[wasm_bindgen(js_name = percentToTimestamp)]
pub fn percent_to_timestamp(pct: f64, min_ts: Option<f64>, max_ts: Option<f64>) -> Option<f64> {
    date_scale::percent_to_timestamp(
        pct,
        min_ts.and_then(from_js_ts),
        max_ts.and_then(from_js_ts),
    )
    .map(|ts| ts as f64)
}

#[wasm_bindgen(js_name = timestampToPercent)]
pub fn timestamp_to_percent(ts: f64, min_ts: Option<f64>, max_ts: Option<f64>) -> f64 {
    let Some(ts) = from_js_ts(ts) else {
        return 0.0;
    };
    date_scale::timestamp_to_percent(ts, min_ts.and_then(from_js_ts), max_ts.and_then(from_js_ts))
}

#[wasm_bindgen(js_name = toIsoDate)]
pub fn to_iso_date(ts: f64) -> String {
    from_js_ts(ts)
        .map(date_scale::to_iso_date)
        .unwrap_or_default()
}

#[wasm_bindgen(js_name = parseIsoDate)]
pub fn parse_iso_date(value: &str) -> Option<f64> {
    date_scale::parse_iso_date(value).map(|ts| ts as f64)
}

/// Zoom the view to a date range. Returns the updated state; the state is
/// unchanged when a date or the extent is missing.
#[wasm_bindgen(js_name = applyDateRange)]
pub fn apply_date_range(state: JsValue, from: &str, to: &str) -> Result<JsValue, JsValue> {
    let mut state = view_state_from(state)?;
    state.apply_date_range(from, to);
    to_js(&state)
}

#[wasm_bindgen(js_name = resetZoom)]
pub fn reset_zoom(state: JsValue) -> Result<JsValue, JsValue> {
    let mut state = view_state_from(state)?;
    state.reset_zoom();
    to_js(&state)
}

#[wasm_bindgen(js_name = onZoom)]
pub fn on_zoom(
    state: JsValue,
    start_pct: Option<f64>,
    end_pct: Option<f64>,
) -> Result<JsValue, JsValue> {
    let mut state = view_state_from(state)?;
    state.on_zoom(start_pct, end_pct);
    to_js(&state)
}

#[wasm_bindgen(js_name = zoomHint)]
pub fn zoom_hint(state: JsValue) -> Result<Option<String>, JsValue> {
    Ok(view_state_from(state)?.zoom_hint())
}

/// Returns `{ state, restore }`.
#[wasm_bindgen(js_name = onLegendChange)]
pub fn on_legend_change(state: JsValue, selected: JsValue) -> Result<JsValue, JsValue> {
    let mut state = view_state_from(state)?;
    let selected: LegendSelection = from_value(selected)
        .map_err(|err| JsValue::from_str(&format!("No se pudo leer la leyenda: {err}")))?;
    let restore = state.on_legend_change(&selected);
    to_js(&LegendUpdate { state, restore })
}

fn view_state_from(state: JsValue) -> Result<ViewState, JsValue> {
    if state.is_undefined() || state.is_null() {
        return Ok(ViewState::default());
    }
    from_value(state)
        .map_err(|err| JsValue::from_str(&format!("No se pudo leer el estado de vista: {err}")))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|err| JsValue::from_str(&format!("No se pudo serializar: {err}")))
}

/// `None` for `NaN`, infinities and values outside the `i64` range.
fn from_js_ts(ts: f64) -> Option<Timestamp> {
    let ts = ts.round();
    (ts.is_finite() && ts.abs() < i64::MAX as f64).then_some(ts as Timestamp)
}

fn format_dashboard_error(err: DashboardError) -> String {
    format!("Dashboard error: {err}")
}
