//! Normal-band flagging of lab values.

use serde::{Deserialize, Serialize};

use crate::RangeBand;

/// Side of the normal band a value falls on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RangeFlag {
    Below,
    Above,
}

impl RangeFlag {
    pub fn label(self) -> &'static str {
        match self {
            RangeFlag::Below => "bajo",
            RangeFlag::Above => "alto",
        }
    }
}

/// Flag `value` against whichever bounds are configured.
pub fn classify(value: f64, low: Option<f64>, high: Option<f64>) -> Option<RangeFlag> {
    if matches!(low, Some(low) if value < low) {
        return Some(RangeFlag::Below);
    }
    if matches!(high, Some(high) if value > high) {
        return Some(RangeFlag::Above);
    }
    None
}

/// `"low – high"` for the KPI tooltip, `—` standing in for a missing bound.
pub fn range_text(band: &RangeBand) -> String {
    if band.is_unbounded() {
        return "—".to_string();
    }
    let side = |bound: Option<f64>| bound.map_or_else(|| "—".to_string(), |v| v.to_string());
    format!("{} – {}", side(band.min), side(band.max))
}
