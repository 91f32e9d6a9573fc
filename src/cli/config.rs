//! Configuration management CLI commands.

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Set configuration values
    Set(ConfigSetArgs),
}

/// Display current configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug, Default)]
pub struct ConfigSetArgs {
    /// Physical size of one unit in millimeters
    #[arg(long, value_name = "MM")]
    unit_pitch: Option<f64>,

    /// Corner distance in pixels within which dragged keys snap (0 disables)
    #[arg(long, value_name = "PX")]
    snap_threshold: Option<f64>,

    /// Pixels per unit at the default pitch
    #[arg(long, value_name = "PX")]
    base_unit_px: Option<f64>,

    /// Maximum number of undo steps
    #[arg(long, value_name = "N")]
    history_limit: Option<usize>,

    /// Devicetree node name of exported physical layouts
    #[arg(long, value_name = "NAME")]
    node_name: Option<String>,

    /// `display-name` of exported physical layouts
    #[arg(long, value_name = "NAME")]
    display_name: Option<String>,
}

/// JSON-serializable configuration for output
#[derive(Serialize, Debug)]
struct ConfigOutput<'a> {
    path: String,
    exists: bool,
    config: &'a Config,
}

impl ConfigArgs {
    /// Execute config subcommand.
    ///
    /// `path` is the explicit `--config` file; the platform file is used otherwise.
    pub fn execute(&self, config: &Config, path: Option<&Path>) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(config, path),
            ConfigCommand::Set(args) => args.execute(config, path),
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self, config: &Config, path: Option<&Path>) -> CliResult<()> {
        let (file, exists) = config_location(path)?;

        if self.json {
            let output = ConfigOutput {
                path: file.display().to_string(),
                exists,
                config,
            };
            let json = serde_json::to_string_pretty(&output).map_err(|e| {
                CliError::io(format!("Failed to serialize configuration to JSON: {e}"))
            })?;
            println!("{json}");
        } else {
            output_human_readable(config, &file, exists);
        }

        Ok(())
    }
}

impl ConfigSetArgs {
    fn is_empty(&self) -> bool {
        self.unit_pitch.is_none()
            && self.snap_threshold.is_none()
            && self.base_unit_px.is_none()
            && self.history_limit.is_none()
            && self.node_name.is_none()
            && self.display_name.is_none()
    }

    /// Returns `config` with every given option applied and validated.
    fn apply(&self, config: &Config) -> CliResult<Config> {
        if self.is_empty() {
            return Err(CliError::validation(
                "At least one configuration option must be specified: --unit-pitch, \
                 --snap-threshold, --base-unit-px, --history-limit, --node-name or --display-name",
            ));
        }

        let mut updated = config.clone();
        if let Some(pitch) = self.unit_pitch {
            updated.editor.unit_pitch_mm = pitch;
        }
        if let Some(threshold) = self.snap_threshold {
            updated.editor.snap_threshold_px = threshold;
        }
        if let Some(base) = self.base_unit_px {
            updated.editor.base_unit_px = base;
        }
        if let Some(limit) = self.history_limit {
            updated.editor.history_limit = Some(limit);
        }
        if let Some(name) = &self.node_name {
            updated.export.layout_node_name.clone_from(name);
        }
        if let Some(name) = &self.display_name {
            updated.export.layout_display_name.clone_from(name);
        }

        updated
            .validate()
            .map_err(|e| CliError::validation(format!("Invalid configuration: {e}")))?;
        Ok(updated)
    }

    /// Execute set command
    pub fn execute(&self, config: &Config, path: Option<&Path>) -> CliResult<()> {
        let updated = self.apply(config)?;

        let saved = match path {
            Some(path) => updated.save_to(path),
            None => updated.save(),
        };
        saved.map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        let (file, _) = config_location(path)?;
        info!(path = %file.display(), "Configuration saved");
        println!("✓ Configuration updated: {}", file.display());

        Ok(())
    }
}

/// Config file in use and whether it is on disk.
fn config_location(path: Option<&Path>) -> CliResult<(PathBuf, bool)> {
    match path {
        Some(path) => Ok((path.to_path_buf(), path.exists())),
        None => {
            let file = Config::config_file_path().map_err(|e| CliError::io(format!("{e:#}")))?;
            Ok((file, Config::exists()))
        }
    }
}

/// Output configuration in human-readable format
fn output_human_readable(config: &Config, file: &Path, exists: bool) {
    println!("LazyLayout Configuration");
    println!("========================");
    if exists {
        println!("File: {}", file.display());
    } else {
        println!("File: {} (not created, showing defaults)", file.display());
    }
    println!();

    let editor = &config.editor;
    println!("Editor:");
    println!("  Unit Pitch: {} mm", editor.unit_pitch_mm);
    println!("  Snap Threshold: {} px", config.snap_threshold());
    println!("  Base Unit: {} px", editor.base_unit_px);
    match editor.history_limit {
        Some(limit) => println!("  History Limit: {limit}"),
        None => println!("  History Limit: (unbounded)"),
    }
    println!();

    let export = &config.export;
    println!("Export:");
    println!("  ZMK File: {}", export.zmk_file_name);
    println!("  QMK File: {}", export.qmk_file_name);
    println!("  QMK info.json File: {}", export.qmk_info_file_name);
    println!("  Layout Node: {}", export.layout_node_name);
    println!("  Display Name: {}", export.layout_display_name);
    println!("  QMK Layout Name: {}", export.qmk_layout_name);
}
