//! Integration tests for CLI output
//!
//! These run the binary on commands that need no network and verify that
//! JSON output is a single valid document with the expected fields.

use std::io::Write;
use std::process::{Command, Output};

fn geoflow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_geoflow"))
        .args(args)
        .env_remove("GEOFLOW_PRINT_CRS")
        .env_remove("GEOFLOW_DEFAULT_PRINT_SCALE")
        .env_remove("GEOFLOW_PRINT_DPI")
        .env_remove("GEOFLOW_PRINT_MAX_ATTEMPTS")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute command")
}

fn json_data(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["status"], "success");
    parsed["data"].clone()
}

#[test]
fn test_scale_from_resolution() {
    let data = json_data(&geoflow(&["scale", "--resolution", "2", "--crs", "EPSG:25833", "--json"]));
    assert_eq!(data["raw_scale"].as_f64().unwrap().round(), 7143.0);
    assert_eq!(data["nearest_scale"], 10000.0);
    assert_eq!(data["family"], "Regional");

    let web = json_data(&geoflow(&["scale", "--resolution", "2", "--crs", "3857", "--json"]));
    assert_eq!(web["nearest_scale"], 5000.0);
}

#[test]
fn test_transform_identity() {
    let data = json_data(&geoflow(&[
        "transform", "--from", "25833", "--to", "epsg:25833", "262000", "6650000", "--json",
    ]));
    assert_eq!(data["output"][0], 262000.0);
    assert_eq!(data["output"][1], 6650000.0);
}

#[test]
fn test_transform_unknown_code_fails() {
    let output = geoflow(&["transform", "--from", "EPSG:1", "--to", "EPSG:25833", "0", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown reference system"));
}

#[test]
fn test_crs_listing() {
    let data = json_data(&geoflow(&["crs", "--json"]));
    let codes: Vec<&str> = data
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|row| row["code"].as_str())
        .collect();
    assert!(codes.contains(&"EPSG:25833"));
    assert!(codes.contains(&"EPSG:27393"));
    assert!(codes.contains(&"EPSG:4230"));
}

#[test]
fn test_print_dry_run_payload() {
    let data = json_data(&geoflow(&[
        "print", "--center", "262000,6650000", "--crs", "EPSG:25833", "--resolution", "2",
        "--layout", "a4l", "--background", "sjokartraster", "--dry-run", "--json",
    ]));
    assert_eq!(data["scale"], 10000.0);
    assert_eq!(data["scale_source"], "computed");
    assert_eq!(data["payload"]["layout"], "A4 landscape");
    assert_eq!(data["payload"]["attributes"]["map"]["layers"][0]["layer"], "sjokartraster");
}

#[test]
fn test_print_dry_run_default_scale() {
    let data = json_data(&geoflow(&["print", "--center", "262000,6650000", "--dry-run", "--json"]));
    assert_eq!(data["scale"], 25000.0);
    assert_eq!(data["scale_source"], "default");
}

#[test]
fn test_config_file_layer() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "print_crs = \"EPSG:25832\"\nprint_max_attempts = 5").unwrap();
    let path = file.path().to_str().unwrap();

    let data = json_data(&geoflow(&["config", "--config", path, "--json"]));
    let rows = data.as_array().unwrap();
    let row = |key: &str| rows.iter().find(|r| r["key"] == key).cloned().unwrap();

    assert_eq!(row("print_crs")["value"], "EPSG:25832");
    assert_eq!(row("print_crs")["source"], "File");
    assert_eq!(row("print_max_attempts")["value"], "5");
    assert_eq!(row("print_dpi")["source"], "Default");
}
