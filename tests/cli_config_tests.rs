//! End-to-end tests for `lazylayout config`.

mod fixtures;

use fixtures::*;
use tempfile::TempDir;

fn show_json(current_dir: &std::path::Path, extra: &[&str]) -> serde_json::Value {
    let mut args = vec!["config", "show", "--json"];
    args.extend_from_slice(extra);
    let output = run_isolated(&args, current_dir);
    assert_exit_code(&output, 0);
    serde_json::from_slice(&output.stdout).expect("Should parse JSON output")
}

#[test]
fn test_show_defaults_without_file() {
    let temp_dir = TempDir::new().unwrap();

    let result = show_json(temp_dir.path(), &[]);
    assert_eq!(result["exists"], false);
    assert!(result["path"].as_str().unwrap().ends_with("config.toml"));
    assert_eq!(result["config"]["editor"]["unit_pitch_mm"], 19.05);
    assert_eq!(result["config"]["export"]["layout_node_name"], "imported_layout");
}

#[test]
fn test_set_then_show() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_isolated(
        &[
            "config",
            "set",
            "--unit-pitch",
            "18",
            "--snap-threshold",
            "0",
            "--node-name",
            "corne_layout",
        ],
        temp_dir.path(),
    );
    assert_exit_code(&output, 0);
    assert!(temp_dir.path().join("config").join("config.toml").exists());

    let result = show_json(temp_dir.path(), &[]);
    assert_eq!(result["exists"], true);
    assert_eq!(result["config"]["editor"]["unit_pitch_mm"], 18.0);
    assert_eq!(result["config"]["editor"]["snap_threshold_px"], 0.0);
    assert_eq!(result["config"]["export"]["layout_node_name"], "corne_layout");
    assert_eq!(result["config"]["export"]["layout_display_name"], "Imported Layout");
}

#[test]
fn test_set_creates_explicit_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("custom.toml");
    let file_arg = file.to_str().unwrap();

    let output = run_isolated(
        &["config", "set", "--history-limit", "5", "--config", file_arg],
        temp_dir.path(),
    );
    assert_exit_code(&output, 0);
    assert!(file.exists());
    assert!(!temp_dir.path().join("config").join("config.toml").exists());

    let result = show_json(temp_dir.path(), &["--config", file_arg]);
    assert_eq!(result["config"]["editor"]["history_limit"], 5);
}

#[test]
fn test_set_without_options_fails() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_isolated(&["config", "set"], temp_dir.path());
    assert_exit_code(&output, 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("At least one"));
}

#[test]
fn test_set_invalid_node_name_is_not_saved() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_isolated(&["config", "set", "--node-name", "Bad Name"], temp_dir.path());
    assert_exit_code(&output, 1);
    assert!(!temp_dir.path().join("config").join("config.toml").exists());
}

#[test]
fn test_saved_pitch_reaches_inspect() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_isolated(&["config", "set", "--unit-pitch", "38.1"], temp_dir.path());
    assert_exit_code(&output, 0);

    let input = temp_dir.path().join("layout.json");
    std::fs::write(&input, KLE_SIMPLE).unwrap();
    let output = run_isolated(&["inspect", input.to_str().unwrap(), "--json"], temp_dir.path());
    assert_exit_code(&output, 0);

    let result: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Should parse JSON output");
    assert_eq!(result["unit_pitch_mm"], 38.1);
}
