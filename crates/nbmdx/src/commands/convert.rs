//! `nbmdx convert` command implementation.

use std::path::PathBuf;

use clap::Args;
use console::Term;
use nbmdx_config::Config;

use super::converter_from_config;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Notebook to convert.
    notebook: PathBuf,

    /// Path to configuration file (default: auto-discover nbmdx.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the MDX to stdout instead of writing it next to the notebook.
    #[arg(long)]
    stdout: bool,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the notebook cannot be converted.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        let converter = converter_from_config(&config)?;

        if self.stdout {
            let mdx = converter.render(&self.notebook)?;
            Term::stdout().write_str(&mdx)?;
            return Ok(());
        }

        let written = converter.convert(&self.notebook)?;
        Output::new().success(&format!("Wrote {}", written.display()));
        Ok(())
    }
}
