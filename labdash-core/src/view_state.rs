//! Session-local chart state, owned by the caller and threaded through each
//! refresh instead of living in globals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::date_scale::{
    parse_iso_date, percent_to_timestamp, timestamp_to_percent, to_iso_date, TimeExtent,
};
use crate::Timestamp;

/// Series name -> visible.
pub type LegendSelection = BTreeMap<String, bool>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ZoomWindow {
    pub start_pct: f64,
    pub end_pct: f64,
}

impl Default for ZoomWindow {
    fn default() -> Self {
        Self {
            start_pct: 0.0,
            end_pct: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ViewState {
    pub zoom: ZoomWindow,
    pub extent: TimeExtent,
    pub last_multi_selection: Option<LegendSelection>,
}

impl ViewState {
    pub fn new(extent: TimeExtent) -> Self {
        Self {
            extent,
            ..Self::default()
        }
    }

    /// Zoom to the given calendar range. Reversed input is swapped; returns
    /// `false` and leaves the zoom untouched if a date or the extent is
    /// missing.
    pub fn apply_date_range(&mut self, from: &str, to: &str) -> bool {
        let Some((min, max)) = self.extent.bounds() else {
            return false;
        };
        let (Some(a), Some(b)) = (parse_iso_date(from), parse_iso_date(to)) else {
            return false;
        };
        let (lo, hi) = (a.min(b), a.max(b));
        self.zoom = ZoomWindow {
            start_pct: timestamp_to_percent(lo, Some(min), Some(max)),
            end_pct: timestamp_to_percent(hi, Some(min), Some(max)),
        };
        true
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = ZoomWindow::default();
    }

    /// Record a zoom reported by the chart; missing ends keep their value.
    pub fn on_zoom(&mut self, start_pct: Option<f64>, end_pct: Option<f64>) {
        if let Some(start) = start_pct.filter(|v| v.is_finite()) {
            self.zoom.start_pct = start.clamp(0.0, 100.0);
        }
        if let Some(end) = end_pct.filter(|v| v.is_finite()) {
            self.zoom.end_pct = end.clamp(0.0, 100.0);
        }
    }

    pub fn visible_range(&self) -> Option<(Timestamp, Timestamp)> {
        let (min, max) = (self.extent.min_ts, self.extent.max_ts);
        Some((
            percent_to_timestamp(self.zoom.start_pct, min, max)?,
            percent_to_timestamp(self.zoom.end_pct, min, max)?,
        ))
    }

    pub fn visible_dates(&self) -> Option<(String, String)> {
        let (from, to) = self.visible_range()?;
        Some((to_iso_date(from), to_iso_date(to)))
    }

    pub fn zoom_hint(&self) -> Option<String> {
        let (from, to) = self.visible_dates()?;
        Some(format!(
            "Mostrando: {from} → {to} (zoom {:.1}%–{:.1}%)",
            self.zoom.start_pct, self.zoom.end_pct
        ))
    }

    /// Track legend toggles. Selections with two or more visible series are
    /// remembered; when the user hides the last visible one, the remembered
    /// selection is returned so the caller can restore it.
    pub fn on_legend_change(&mut self, selected: &LegendSelection) -> Option<LegendSelection> {
        let visible = selected.values().filter(|on| **on).count();
        if visible >= 2 {
            self.last_multi_selection = Some(selected.clone());
            return None;
        }
        if visible == 0 {
            return self.last_multi_selection.clone();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DAY_MS;

    fn extent() -> TimeExtent {
        TimeExtent::new(
            parse_iso_date("2024-01-01").unwrap(),
            parse_iso_date("2024-01-11").unwrap(),
        )
    }

    #[test]
    fn date_range_maps_to_percentages() {
        let mut state = ViewState::new(extent());
        assert!(state.apply_date_range("2024-01-09", "2024-01-03"));
        assert!((state.zoom.start_pct - 20.0).abs() < 1e-9);
        assert!((state.zoom.end_pct - 80.0).abs() < 1e-9);
        assert_eq!(
            state.visible_dates(),
            Some(("2024-01-03".to_string(), "2024-01-09".to_string()))
        );
        assert_eq!(
            state.zoom_hint().as_deref(),
            Some("Mostrando: 2024-01-03 → 2024-01-09 (zoom 20.0%–80.0%)")
        );

        state.reset_zoom();
        assert_eq!(state.zoom, ZoomWindow::default());
    }

    #[test]
    fn invalid_input_keeps_zoom() {
        let mut state = ViewState::new(extent());
        state.on_zoom(Some(10.0), None);
        assert!(!state.apply_date_range("", "2024-01-03"));
        assert_eq!(state.zoom.start_pct, 10.0);
        assert_eq!(state.zoom.end_pct, 100.0);

        let mut open = ViewState::default();
        assert!(!open.apply_date_range("2024-01-01", "2024-01-03"));
        assert_eq!(open.visible_range(), None);
    }

    #[test]
    fn zoom_updates_are_clamped() {
        let mut state = ViewState::new(extent());
        state.on_zoom(Some(-5.0), Some(f64::NAN));
        assert_eq!(state.zoom.start_pct, 0.0);
        assert_eq!(state.zoom.end_pct, 100.0);
        let (from, to) = state.visible_range().unwrap();
        assert_eq!(to - from, 10 * DAY_MS);
    }

    #[test]
    fn emptied_legend_restores_last_multi_selection() {
        let mut state = ViewState::default();
        let pick = |entries: &[(&str, bool)]| -> LegendSelection {
            entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };

        assert_eq!(state.on_legend_change(&pick(&[("a", false), ("b", false)])), None);

        let multi = pick(&[("a", true), ("b", true), ("c", false)]);
        assert_eq!(state.on_legend_change(&multi), None);
        assert_eq!(state.on_legend_change(&pick(&[("a", true), ("b", false)])), None);
        assert_eq!(
            state.on_legend_change(&pick(&[("a", false), ("b", false)])),
            Some(multi)
        );
    }
}
