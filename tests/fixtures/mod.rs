//! Shared test fixtures for E2E CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the lazylayout binary
pub fn lazylayout_bin() -> &'static str {
    env!("CARGO_BIN_EXE_lazylayout")
}

/// Two rows: `A B` and `C`.
pub const KLE_SIMPLE: &str = r#"[["A","B"],["C"]]"#;

/// Metadata row, a 1.5u key, an offset key and a rotated cluster.
pub const KLE_MIXED: &str = r#"[
    {"name": "mixed"},
    [{"w": 1.5}, "Tab", {"x": 0.25}, "Q"],
    [{"r": 15, "rx": 4, "ry": 0.5}, "Enter"]
]"#;

/// Hand-written ZMK keymap with two keys, one rotated about a negative center.
pub const ZMK_TWO_KEYS: &str = r#"
#include <physical_layouts.dtsi>

/ {
    hand_layout: hand_layout {
        compatible = "zmk,physical-layout";
        display-name = "Hand";
        keys
            = <&key_physical_attrs 100 100   0   0    0     0     0>
            , <&key_physical_attrs 150 100 100   0 1500 (-50) (-25)>
            ;
    };

    keymap {
        compatible = "zmk,keymap";

        default_layer {
            bindings = <
                &kp ESC &mt LSHIFT A
            >;
        };
    };
};
"#;

/// Writes `content` to `name` inside a fresh temp dir.
///
/// The temp dir must be kept alive for the file to exist.
pub fn write_temp_file(name: &str, content: &str) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    (path, temp_dir)
}

/// Runs the binary with an isolated, empty config directory.
pub fn run_isolated(args: &[&str], current_dir: &Path) -> Output {
    let config_dir = current_dir.join("config");
    Command::new(lazylayout_bin())
        .env("LAZYLAYOUT_CONFIG_DIR", &config_dir)
        .env_remove("RUST_LOG")
        .current_dir(current_dir)
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Asserts the process exited with `expected`, showing stderr otherwise.
pub fn assert_exit_code(output: &Output, expected: i32) {
    assert_eq!(
        output.status.code(),
        Some(expected),
        "Unexpected exit code. stdout: {} stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Lines of the `keys` property holding `&key_physical_attrs` tuples.
pub fn attrs_lines(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| line.contains("<&key_physical_attrs"))
        .collect()
}
