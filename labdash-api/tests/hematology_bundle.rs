use std::fs;

use labdash_api::{parse_bundle, summarize_bundle_str, summarize_dashboard};
use labdash_core::date_scale::{parse_iso_date, to_iso_date};
use labdash_core::{
    CrossingDirection, DashboardConfig, DashboardSnapshot, KpiStatus, RangeFlag,
    TimelineEventKind, DAY_MS,
};
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn load_snapshot() -> DashboardSnapshot {
    let bundle =
        fs::read_to_string(fixture_path("hematology_bundle.json")).expect("missing sample bundle");
    summarize_bundle_str(&bundle, &DashboardConfig::default()).expect("snapshot failed")
}

#[test]
fn treatment_summaries_match_golden() {
    let snapshot = load_snapshot();

    let actual = serde_json::to_value(&snapshot.treatment_summaries).expect("serialize failed");
    let expected = fs::read_to_string(fixture_path("hematology_treatments.json"))
        .expect("missing golden summaries");
    let expected: Value = serde_json::from_str(&expected).expect("invalid golden");

    assert_eq!(actual, expected);
}

#[test]
fn leukocyte_panel() {
    let snapshot = load_snapshot();
    let panel = snapshot.panel("leucocitos").expect("leucocitos panel");

    assert_eq!(panel.label, "Leucocitos");
    assert_eq!(panel.unit.as_deref(), Some("10^3/µL"));
    assert_eq!(panel.crossing_limit, Some(3.0));

    let kpi = &panel.kpi;
    assert_eq!(kpi.last_value, Some(7.9));
    assert_eq!(kpi.previous_value, Some(4.8));
    assert!((kpi.delta.unwrap() - 3.1).abs() < 1e-9);
    assert_eq!(kpi.status, KpiStatus::InRange);
    assert_eq!(kpi.alert_count, 2);
    let alerts: Vec<(&str, RangeFlag)> = kpi
        .recent_alerts
        .iter()
        .map(|a| (a.date.as_str(), a.flag))
        .collect();
    assert_eq!(
        alerts,
        vec![("2024-03-09", RangeFlag::Below), ("2024-03-05", RangeFlag::Below)]
    );
    assert_eq!(kpi.range_text, "4 – 11");

    let crossings: Vec<(CrossingDirection, &str, usize)> = panel
        .crossings
        .iter()
        .map(|c| (c.direction, c.date_iso.as_str(), c.treatments.len()))
        .collect();
    assert_eq!(
        crossings,
        vec![
            (CrossingDirection::Down, "2024-03-06", 1),
            (CrossingDirection::Up, "2024-03-10", 2)
        ]
    );

    let labels: Vec<(&str, f64)> = panel
        .annotations
        .iter()
        .map(|a| (a.name.as_str(), a.label_offset[0]))
        .collect();
    assert_eq!(
        labels,
        vec![("Leucopenia", -26.0), ("Max", 26.0), ("Min", -52.0)]
    );
}

#[test]
fn platelet_panel_drops_bad_points() {
    let snapshot = load_snapshot();
    let panel = snapshot.panel("plaquetas").expect("plaquetas panel");

    assert_eq!(panel.label, "Plaquetas");
    assert_eq!(panel.points.len(), 3);
    assert_eq!(panel.crossing_limit, None);
    assert!(panel.crossings.is_empty());
    assert_eq!(panel.kpi.status, KpiStatus::Low);
    assert_eq!(panel.kpi.delta, Some(-60.0));
    assert_eq!(panel.kpi.alert_count, 1);
}

#[test]
fn extent_markers_and_areas() {
    let snapshot = load_snapshot();

    let (min, max) = snapshot.extent.bounds().expect("extent");
    assert_eq!(to_iso_date(min), "2024-02-23");
    assert_eq!(max, parse_iso_date("2024-03-17").unwrap() + 60 * DAY_MS);

    let markers: Vec<(&str, TimelineEventKind)> = snapshot
        .markers
        .iter()
        .map(|m| (m.date_iso.as_str(), m.kind))
        .collect();
    assert_eq!(
        markers,
        vec![
            ("2024-03-03", TimelineEventKind::HospitalAdmission),
            ("2024-03-04", TimelineEventKind::TreatmentStart),
            ("2024-03-08", TimelineEventKind::HospitalDischarge),
            ("2024-03-10", TimelineEventKind::TreatmentStart),
            ("2024-03-14", TimelineEventKind::TreatmentEnd),
        ]
    );
    assert_eq!(snapshot.areas.len(), 3);
    assert_eq!(snapshot.intervals.len(), 2);
    assert_eq!(snapshot.alert_total(), 3);
    assert_eq!(snapshot.crossing_total(), 2);
}

#[test]
fn config_default_days_apply_when_payload_has_none() {
    let bundle =
        fs::read_to_string(fixture_path("hematology_bundle.json")).expect("missing sample bundle");
    let value: Value = serde_json::from_str(&bundle).expect("invalid bundle");
    let mut input = parse_bundle(&value).expect("bundle rejected");
    input.timeline.treatment_default_days = None;

    let without = summarize_dashboard(&input, &DashboardConfig::default());
    assert_eq!(without.intervals.len(), 1);

    let config = DashboardConfig {
        treatment_default_days: Some(7),
        ..DashboardConfig::default()
    };
    let with = summarize_dashboard(&input, &config);
    assert_eq!(with.intervals.len(), 2);
    assert_eq!(to_iso_date(with.intervals[0].end), "2024-03-11");
}
