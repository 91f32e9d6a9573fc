//! Convert command: import a layout and export it in another format.

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use crate::services::{ExportFormat, LayoutFormat, LayoutService};
use clap::Args;
use std::path::PathBuf;

/// Convert a layout file between formats
#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Layout file to read (KLE JSON or ZMK devicetree)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output format: zmk, qmk or qmk-info
    #[arg(long, value_name = "FORMAT")]
    pub to: ExportFormat,

    /// Input format: kle or zmk (detected from the file extension if omitted)
    #[arg(long, value_name = "FORMAT")]
    pub from: Option<LayoutFormat>,

    /// Output path (defaults to the configured file name in the current directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Unit pitch in millimeters (defaults to the configured pitch)
    #[arg(long, value_name = "MM")]
    pub pitch: Option<f64>,

    /// Write the result to stdout instead of a file
    #[arg(long, conflicts_with = "output")]
    pub print: bool,
}

impl ConvertArgs {
    /// Execute the convert command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let format = LayoutService::detect_format(&self.input, self.from)
            .map_err(|e| CliError::validation(format!("{e:#}")))?;

        let mut document = LayoutService::load_document(&self.input, format, config)
            .map_err(CliError::from_layout_error)?;

        if let Some(pitch) = self.pitch {
            if !(pitch.is_finite() && pitch > 0.0) {
                return Err(CliError::validation(format!(
                    "--pitch must be a positive number of millimeters, got {pitch}"
                )));
            }
            document.set_unit_pitch(pitch);
        }

        let content = LayoutService::render(&document, self.to, &config.export)
            .map_err(|e| CliError::io(format!("Failed to render layout: {e:#}")))?;

        if self.print {
            print!("{content}");
            return Ok(());
        }

        let output_path = self.output_path(config);
        LayoutService::save(&content, &output_path).map_err(|e| CliError::io(format!("{e:#}")))?;

        println!(
            "✓ Converted {} keys ({} → {}): {}",
            document.len(),
            format,
            self.to,
            output_path.display()
        );

        Ok(())
    }

    /// Get the output file path (either user-specified or the configured default)
    fn output_path(&self, config: &Config) -> PathBuf {
        if let Some(ref path) = self.output {
            return path.clone();
        }

        PathBuf::from(self.to.default_file_name(&config.export))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(to: ExportFormat, output: Option<PathBuf>) -> ConvertArgs {
        ConvertArgs {
            input: PathBuf::from("layout.json"),
            to,
            from: None,
            output,
            pitch: None,
            print: false,
        }
    }

    #[test]
    fn test_output_path_default() {
        let config = Config::new();
        assert_eq!(
            args(ExportFormat::Zmk, None).output_path(&config),
            PathBuf::from("layout.keymap")
        );
        assert_eq!(
            args(ExportFormat::Qmk, None).output_path(&config),
            PathBuf::from("layout_qmk.json")
        );
    }

    #[test]
    fn test_output_path_follows_config() {
        let mut config = Config::new();
        config.export.qmk_info_file_name = "corne_info.json".to_string();
        assert_eq!(
            args(ExportFormat::QmkInfo, None).output_path(&config),
            PathBuf::from("corne_info.json")
        );
    }

    #[test]
    fn test_output_path_custom() {
        let custom_path = PathBuf::from("/tmp/my_layout.keymap");
        let config = Config::new();
        assert_eq!(
            args(ExportFormat::Zmk, Some(custom_path.clone())).output_path(&config),
            custom_path
        );
    }

    #[test]
    fn test_invalid_pitch_is_validation_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let input = temp_dir.path().join("layout.json");
        std::fs::write(&input, r#"[["A"]]"#).unwrap();

        let mut convert = args(ExportFormat::Zmk, Some(temp_dir.path().join("out.keymap")));
        convert.input = input;
        convert.pitch = Some(0.0);

        let err = convert.execute(&Config::new()).unwrap_err();
        assert_eq!(err.exit_code().code(), 1);
    }
}
