//! Core analysis layer for the lab-value dashboard: data model plus the pure
//! transforms the chart and KPI cards are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod annotation;
pub mod crossing;
pub mod date_scale;
pub mod kpi;
pub mod range;
pub mod summary;
pub mod timeline;
pub mod treatment;
pub mod view_state;

pub use annotation::{Annotation, AnnotationKind, LineStyle, LineType};
pub use crossing::{CrossingDirection, CrossingEvent};
pub use date_scale::TimeExtent;
pub use kpi::{KpiStatus, KpiSummary, RecentAlert};
pub use range::RangeFlag;
pub use summary::{TreatmentCrossing, TreatmentSummary};
pub use timeline::{TimelineArea, TimelineEvent, TimelineEventKind, TimelineMarker};
pub use treatment::{TreatmentDay, TreatmentInterval};
pub use view_state::{LegendSelection, ViewState, ZoomWindow};

/// Milliseconds since the Unix epoch, the unit of the chart time axis.
pub type Timestamp = i64;

/// One calendar day in milliseconds.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Tunables shared by the boundary crate, the WASM bridge and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    /// Treatment length used when a record has neither an end date nor a
    /// standard duration. The timeline payload's own setting wins.
    pub treatment_default_days: Option<u32>,
    /// Horizontal distance between staggered annotation labels.
    pub annotation_step_px: f64,
    /// Days of padding before the first sample of the chart extent.
    pub extent_pad_days: u32,
    /// Days reserved after the last sample for projected treatment ends.
    pub extent_horizon_days: u32,
    /// Maximum number of entries in a KPI card's recent-alert list.
    pub recent_alert_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            treatment_default_days: None,
            annotation_step_px: annotation::DEFAULT_STAGGER_STEP_PX,
            extent_pad_days: date_scale::DEFAULT_PAD_DAYS,
            extent_horizon_days: date_scale::DEFAULT_HORIZON_DAYS,
            recent_alert_limit: kpi::RECENT_ALERT_LIMIT,
        }
    }
}

/// A single lab sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

/// Normal clinical band for one parameter. Either bound may be absent.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RangeBand {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl RangeBand {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn classify(&self, value: f64) -> Option<RangeFlag> {
        range::classify(value, self.min, self.max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TreatmentRecord {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub standard_days: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HospitalStayRecord {
    pub admission_date: Option<String>,
    pub discharge_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Treatments and hospital stays of one patient, as served by `/timeline`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TimelineData {
    pub treatment_default_days: Option<i64>,
    pub treatments: Vec<TreatmentRecord>,
    pub hospital_stays: Vec<HospitalStayRecord>,
}

impl TimelineData {
    /// Default treatment length: the payload setting, else the config one.
    pub fn default_days(&self, config: &DashboardConfig) -> Option<i64> {
        self.treatment_default_days
            .or(config.treatment_default_days.map(i64::from))
    }
}

/// Single clinical threshold configured for a parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitDefinition {
    pub label: Option<String>,
    pub value: f64,
    pub enabled: bool,
}

impl LimitDefinition {
    pub fn new(label: Option<&str>, value: f64) -> Self {
        Self {
            label: label.map(str::to_string),
            value,
            enabled: true,
        }
    }

    /// Enabled and carrying a usable value.
    pub fn is_active(&self) -> bool {
        self.enabled && self.value.is_finite()
    }
}

/// Everything the chart needs for one parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterPanel {
    pub key: String,
    pub label: String,
    pub unit: Option<String>,
    pub kpi: KpiSummary,
    /// Threshold the crossings were computed against.
    pub crossing_limit: Option<f64>,
    pub crossings: Vec<CrossingEvent>,
    pub annotations: Vec<Annotation>,
    pub points: Vec<SeriesPoint>,
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub extent: TimeExtent,
    pub intervals: Vec<TreatmentInterval>,
    pub markers: Vec<TimelineMarker>,
    pub areas: Vec<TimelineArea>,
    pub panels: Vec<ParameterPanel>,
    pub treatment_summaries: Vec<TreatmentSummary>,
}

impl DashboardSnapshot {
    pub fn panel(&self, key: &str) -> Option<&ParameterPanel> {
        self.panels.iter().find(|panel| panel.key == key)
    }

    /// Total out-of-range samples across all panels.
    pub fn alert_total(&self) -> usize {
        self.panels.iter().map(|panel| panel.kpi.alert_count).sum()
    }

    pub fn crossing_total(&self) -> usize {
        self.panels.iter().map(|panel| panel.crossings.len()).sum()
    }
}

/// Errors raised while turning backend payloads into core inputs.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("payload is missing required data")]
    MissingData,
    #[error("could not read payload: {0}")]
    Parse(String),
    #[error("{0}")]
    Other(String),
}
