//! Per-parameter KPI card figures.

use serde::{Deserialize, Serialize};

use crate::range::{range_text, RangeFlag};
use crate::{RangeBand, SeriesPoint};

pub const RECENT_ALERT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum KpiStatus {
    InRange,
    Low,
    High,
    NoData,
}

impl KpiStatus {
    fn from_flag(flag: Option<RangeFlag>) -> Self {
        match flag {
            None => KpiStatus::InRange,
            Some(RangeFlag::Below) => KpiStatus::Low,
            Some(RangeFlag::Above) => KpiStatus::High,
        }
    }

    /// Text shown on the card.
    pub fn label(self) -> &'static str {
        match self {
            KpiStatus::InRange => "en rango",
            KpiStatus::Low => "bajo",
            KpiStatus::High => "alto",
            KpiStatus::NoData => "sin datos",
        }
    }

    pub fn is_alert(self) -> bool {
        matches!(self, KpiStatus::Low | KpiStatus::High)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentAlert {
    pub date: String,
    pub value: f64,
    pub flag: RangeFlag,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KpiSummary {
    pub last_value: Option<f64>,
    pub last_date: Option<String>,
    pub previous_value: Option<f64>,
    /// `None` unless both the last and the previous value exist.
    pub delta: Option<f64>,
    pub alert_count: usize,
    /// Most recent first.
    pub recent_alerts: Vec<RecentAlert>,
    pub status: KpiStatus,
    pub unit: Option<String>,
    pub range_text: String,
}

/// Reduce a series to its KPI card against the parameter's normal band.
pub fn aggregate(series: &[SeriesPoint], band: &RangeBand, recent_limit: usize) -> KpiSummary {
    let last = series.last();
    let previous = series.len().checked_sub(2).and_then(|idx| series.get(idx));

    let last_value = last.map(|point| point.value);
    let previous_value = previous.map(|point| point.value);
    let delta = match (last_value, previous_value) {
        (Some(last), Some(previous)) => Some(last - previous),
        _ => None,
    };

    let flagged: Vec<RecentAlert> = series
        .iter()
        .filter_map(|point| {
            band.classify(point.value).map(|flag| RecentAlert {
                date: point.date.clone(),
                value: point.value,
                flag,
            })
        })
        .collect();
    let alert_count = flagged.len();
    let recent_alerts = flagged.into_iter().rev().take(recent_limit).collect();

    let status = match last_value {
        Some(value) => KpiStatus::from_flag(band.classify(value)),
        None => KpiStatus::NoData,
    };

    KpiSummary {
        last_value,
        last_date: last.map(|point| point.date.clone()),
        previous_value,
        delta,
        alert_count,
        recent_alerts,
        status,
        unit: band.unit.clone().filter(|unit| !unit.is_empty()),
        range_text: range_text(band),
    }
}

/// Card formatting: fewer decimals for larger magnitudes, `—` when missing.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let magnitude = v.abs();
            if magnitude >= 100.0 {
                format!("{v:.0}")
            } else if magnitude >= 10.0 {
                format!("{v:.1}")
            } else {
                format!("{v:.2}")
            }
        }
        _ => "—".to_string(),
    }
}

pub fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(_) => format!("Δ {}", format_value(delta)),
        None => "Δ —".to_string(),
    }
}
