use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::error::Error;
use std::path::PathBuf;

#[test]
fn prints_text_summary() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("labdash");
    cmd.args([
        "--input",
        &fixture_path("hematology_bundle.json"),
        "--from",
        "2024-03-01",
        "--to",
        "2024-03-17",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output)?;

    assert!(text.contains("Parameters: 2"));
    assert!(text.contains("Crossings: 2"));
    assert!(text.contains("Leucocitos [leucocitos]: 7.90 10^3/µL · Δ 3.10 · en rango"));
    assert!(text.contains("Plaquetas [plaquetas]: 120 10^3/µL · Δ -60.0 · bajo"));
    assert!(text.contains("Quimioterapia: Inicio D+1: 2024-03-04 · Fin: 2024-03-18 (D+15)"));
    assert!(text.contains("  leucocitos ↓ 2024-03-06 (D+3)"));
    assert!(text.contains("Mostrando: 2024-03-01 → 2024-03-17"));
    Ok(())
}

#[test]
fn json_output_is_the_snapshot() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("labdash");
    cmd.args([
        "--input",
        &fixture_path("hematology_bundle.json"),
        "--json",
        "--horizon-days",
        "0",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let snapshot: Value = serde_json::from_slice(&output)?;

    let panels = snapshot["panels"].as_array().expect("panels");
    assert_eq!(panels.len(), 2);
    assert_eq!(panels[0]["key"].as_str(), Some("leucocitos"));
    assert_eq!(snapshot["extent"]["max_ts"].as_i64(), Some(1_710_633_600_000));
    assert_eq!(snapshot["treatment_summaries"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn missing_file_fails() {
    let mut cmd = cargo_bin_cmd!("labdash");
    cmd.args(["--input", "does-not-exist.json"]);
    cmd.assert().failure();
}

fn fixture_path(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("workspace root")
        .join("labdash-api/tests/data")
        .join(name)
        .to_string_lossy()
        .into_owned()
}
