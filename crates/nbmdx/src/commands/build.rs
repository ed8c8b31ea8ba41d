//! `nbmdx build` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use nbmdx_build::{BuildOptions, build_all};
use nbmdx_config::{CliSettings, Config};

use super::converter_from_config;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Directory of notebooks to convert, or a single notebook (overrides config).
    srcdir: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover nbmdx.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rebuild even notebooks that have not changed.
    #[arg(long)]
    force_all: bool,

    /// Number of worker threads (0 converts sequentially).
    #[arg(short, long, env = "NBMDX_WORKERS")]
    workers: Option<usize>,

    /// Pause in seconds before each notebook (default: 0.5, or `build.pause_ms`).
    #[arg(long)]
    pause: Option<f64>,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, discovery fails, or any
    /// notebook fails to convert.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let pause = self
            .pause
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .map_err(|e| CliError::Validation(format!("Invalid --pause {secs}: {e}")))
            })
            .transpose()?;

        let cli_settings = CliSettings {
            source_dir: self.srcdir,
            force_all: self.force_all.then_some(true),
            workers: self.workers,
            pause,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let build = &config.build_resolved;

        output.building(&build.source_dir);

        let converter = converter_from_config(&config)?;
        let options = BuildOptions {
            recursive: build.recursive,
            force_all: build.force_all,
            workers: build.workers,
            pause: build.pause,
        };
        let report = build_all(&build.source_dir, &converter, &options)?;

        if report.is_up_to_date() {
            output.warning("No notebooks were modified.");
            return Ok(());
        }

        if !report.converted.is_empty() {
            output.success(&format!("Converted {} notebook(s)", report.converted.len()));
        }
        if !report.skipped.is_empty() {
            output.info(&format!("Skipped {} unchanged notebook(s)", report.skipped.len()));
        }
        if report.is_success() {
            return Ok(());
        }

        output.failures(&report.failed);
        Err(CliError::ConversionFailed(report.failed.len()))
    }
}
