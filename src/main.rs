//! LazyLayout - keyboard layout geometry and interchange tool
//!
//! Imports KLE and ZMK layouts and exports them as ZMK devicetree,
//! QMK keymap JSON or QMK info.json fragments.

use clap::{Parser, Subcommand};
use lazylayout::cli::{CliError, CliResult, ConfigArgs, ConvertArgs, ExitCode, InspectArgs};
use lazylayout::config::Config;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// LazyLayout - keyboard layout geometry and interchange tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the platform default
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a layout file between formats
    Convert(ConvertArgs),
    /// Show key count, extents and legends of a layout file
    Inspect(InspectArgs),
    /// Show or change the configuration
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let code = match run(&cli) {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            eprintln!("Error: {err}");
            err.exit_code()
        }
    };

    std::process::exit(code.code());
}

fn run(cli: &Cli) -> CliResult<()> {
    // `config set` may create the explicit file
    let may_create = matches!(cli.command, Command::Config(_));
    let config = load_config(cli.config.as_deref(), may_create)?;
    debug!(
        unit_pitch_mm = config.editor.unit_pitch_mm,
        "Configuration loaded"
    );

    match &cli.command {
        Command::Convert(args) => args.execute(&config),
        Command::Inspect(args) => args.execute(&config),
        Command::Config(args) => args.execute(&config, cli.config.as_deref()),
    }
}

/// Loads the explicit config file, or the platform one if present.
///
/// A missing explicit file is an error unless `may_create` is set, in which
/// case the defaults are used.
fn load_config(path: Option<&Path>, may_create: bool) -> CliResult<Config> {
    let loaded = match path {
        Some(path) if may_create && !path.exists() => Ok(Config::new()),
        Some(path) => {
            if !path.exists() {
                return Err(CliError::io(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Config::load_from(path)
        }
        None => Config::load(),
    };

    loaded.map_err(|err| {
        let message = format!("{err:#}");
        if err.chain().any(|cause| cause.is::<std::io::Error>()) {
            CliError::io(message)
        } else {
            CliError::validation(message)
        }
    })
}
