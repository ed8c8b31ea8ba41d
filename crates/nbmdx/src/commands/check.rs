//! `nbmdx check` command implementation.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use nbmdx_config::Config;
use nbmdx_frontmatter::{Check, run_check};

use crate::error::CliError;
use crate::output::Output;

/// Check to run over the generated docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum CheckKind {
    /// Front matter has a `description` field.
    Description,
    /// Front matter has an `image` field.
    Image,
    /// Page has at least 50 words.
    Length,
    /// Description is between 55 and 300 characters.
    DescriptionLength,
}

impl From<CheckKind> for Check {
    fn from(kind: CheckKind) -> Self {
        match kind {
            CheckKind::Description => Self::Description,
            CheckKind::Image => Self::Image,
            CheckKind::Length => Self::Length,
            CheckKind::DescriptionLength => Self::DescriptionLength,
        }
    }
}

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Check to run.
    #[arg(value_enum)]
    kind: CheckKind,

    /// Directory of markdown files to check (default: `check.doc_dir` from config).
    srcdir: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover nbmdx.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error listing the failing files, or if configuration fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let srcdir = match self.srcdir {
            Some(dir) => dir,
            None => {
                let config = Config::load(self.config.as_deref(), None)?;
                config.check_resolved.doc_dir
            }
        };

        run_check(self.kind.into(), &srcdir)?;
        Output::new().success(&format!("All files in {} passed", srcdir.display()));
        Ok(())
    }
}
