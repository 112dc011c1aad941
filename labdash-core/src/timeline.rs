//! Vertical timeline markers and shaded areas for hospital stays and
//! treatments.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::annotation::{LineStyle, LineType};
use crate::date_scale::{parse_optional_date, to_iso_date, TimeExtent};
use crate::treatment::resolve_end;
use crate::{TimelineData, Timestamp};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    HospitalAdmission,
    HospitalDischarge,
    TreatmentStart,
    TreatmentEnd,
}

impl TimelineEventKind {
    fn order(self) -> u8 {
        match self {
            TimelineEventKind::HospitalAdmission => 10,
            TimelineEventKind::HospitalDischarge => 20,
            TimelineEventKind::TreatmentStart => 30,
            TimelineEventKind::TreatmentEnd => 40,
        }
    }

    pub fn line_style(self) -> LineStyle {
        match self {
            TimelineEventKind::HospitalAdmission => LineStyle::new(LineType::Solid, 2.0, 0.85),
            TimelineEventKind::HospitalDischarge => LineStyle::new(LineType::Dashed, 2.0, 0.85),
            TimelineEventKind::TreatmentStart => LineStyle::new(LineType::Solid, 1.0, 0.7),
            TimelineEventKind::TreatmentEnd => LineStyle::new(LineType::Dashed, 1.0, 0.7),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEvent {
    pub ts: Timestamp,
    pub kind: TimelineEventKind,
    pub label: String,
    pub detail: String,
}

/// All events of one calendar day, drawn as a single line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineMarker {
    pub date_iso: String,
    pub ts: Timestamp,
    /// Kind of the first item, which decides the line style.
    pub kind: TimelineEventKind,
    pub label: String,
    pub style: LineStyle,
    pub items: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    Hospital,
    Treatment,
}

impl AreaKind {
    pub fn color(self) -> &'static str {
        match self {
            AreaKind::Hospital => "rgba(59,130,246,0.10)",
            AreaKind::Treatment => "rgba(16,185,129,0.12)",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineArea {
    pub kind: AreaKind,
    pub from: Timestamp,
    pub to: Timestamp,
    pub label: String,
}

fn treatment_label(prefix: &str, name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => format!("{prefix}: {name}"),
        _ => prefix.to_string(),
    }
}

/// Admissions, discharges and treatment starts/ends, oldest first.
/// Treatments without an explicit end date get no end marker.
pub fn timeline_events(timeline: &TimelineData) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    for stay in &timeline.hospital_stays {
        let detail = stay.notes.clone().unwrap_or_default();
        if let Some(ts) = parse_optional_date(stay.admission_date.as_deref()) {
            events.push(TimelineEvent {
                ts,
                kind: TimelineEventKind::HospitalAdmission,
                label: "Ingreso".to_string(),
                detail: detail.clone(),
            });
        }
        if let Some(ts) = parse_optional_date(stay.discharge_date.as_deref()) {
            events.push(TimelineEvent {
                ts,
                kind: TimelineEventKind::HospitalDischarge,
                label: "Alta".to_string(),
                detail,
            });
        }
    }

    for treatment in &timeline.treatments {
        let name = treatment.name.as_deref();
        let detail = treatment.notes.clone().unwrap_or_default();
        if let Some(ts) = parse_optional_date(treatment.start_date.as_deref()) {
            events.push(TimelineEvent {
                ts,
                kind: TimelineEventKind::TreatmentStart,
                label: treatment_label("Inicio tto", name),
                detail: detail.clone(),
            });
        }
        if let Some(ts) = parse_optional_date(treatment.end_date.as_deref()) {
            events.push(TimelineEvent {
                ts,
                kind: TimelineEventKind::TreatmentEnd,
                label: treatment_label("Fin tto", name),
                detail,
            });
        }
    }

    events.sort_by_key(|event| event.ts);

    let mut seen = HashSet::new();
    events.retain(|event| seen.insert((event.kind, event.ts, event.label.clone())));
    events
}

/// Collapse events sharing a calendar day into one marker.
pub fn group_by_day(events: &[TimelineEvent]) -> Vec<TimelineMarker> {
    let mut days: BTreeMap<String, Vec<TimelineEvent>> = BTreeMap::new();
    for event in events {
        days.entry(to_iso_date(event.ts))
            .or_default()
            .push(event.clone());
    }

    days.into_iter()
        .filter_map(|(date_iso, mut items)| {
            items.sort_by_key(|item| item.kind.order());
            let first = items.first()?;
            let kind = first.kind;
            let ts = first.ts;
            let label = items
                .iter()
                .map(|item| item.label.as_str())
                .collect::<Vec<_>>()
                .join(" · ");
            Some(TimelineMarker {
                date_iso,
                ts,
                kind,
                label,
                style: kind.line_style(),
                items,
            })
        })
        .collect()
}

/// Events inside the extent; all of them when the extent is open.
pub fn events_within(events: &[TimelineEvent], extent: &TimeExtent) -> Vec<TimelineEvent> {
    events
        .iter()
        .filter(|event| extent.contains(event.ts))
        .cloned()
        .collect()
}

/// Shaded hospital-stay and treatment windows.
pub fn timeline_areas(timeline: &TimelineData, default_days: Option<i64>) -> Vec<TimelineArea> {
    let mut areas = Vec::new();

    for stay in &timeline.hospital_stays {
        let admission = parse_optional_date(stay.admission_date.as_deref());
        let discharge = parse_optional_date(stay.discharge_date.as_deref());
        if let (Some(from), Some(to)) = (admission, discharge) {
            if to >= from {
                areas.push(TimelineArea {
                    kind: AreaKind::Hospital,
                    from,
                    to,
                    label: "Ingreso hospitalario".to_string(),
                });
            }
        }
    }

    for treatment in &timeline.treatments {
        let Some(from) = parse_optional_date(treatment.start_date.as_deref()) else {
            continue;
        };
        let Some(to) = resolve_end(treatment, from, default_days) else {
            continue;
        };
        if to >= from {
            areas.push(TimelineArea {
                kind: AreaKind::Treatment,
                from,
                to,
                label: treatment_label("Tratamiento", treatment.name.as_deref()),
            });
        }
    }

    areas
}
