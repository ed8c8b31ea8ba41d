//! CLI error types.

use nbmdx_build::BuildError;
use nbmdx_config::ConfigError;
use nbmdx_frontmatter::CheckError;
use nbmdx_pipeline::PipelineError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Check(#[from] CheckError),

    #[error("{0} notebook(s) failed to convert")]
    ConversionFailed(usize),

    #[error("{0}")]
    Validation(String),
}
