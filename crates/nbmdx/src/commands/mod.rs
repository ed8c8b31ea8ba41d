//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod check;
pub(crate) mod convert;

pub(crate) use build::BuildArgs;
pub(crate) use check::CheckArgs;
pub(crate) use convert::ConvertArgs;

use nbmdx_build::NotebookConverter;
use nbmdx_config::{Config, PipelineConfig};
use nbmdx_pipeline::{Pipeline, PipelineSettings};
use nbmdx_render::MdxExporter;

use crate::error::CliError;

/// Pipeline settings with the configured values over the defaults.
fn pipeline_settings(config: &PipelineConfig) -> PipelineSettings {
    let mut settings = PipelineSettings::default();
    let overrides = [
        (&config.tst_flags, &mut settings.tst_flags),
        (&config.formatter, &mut settings.formatter),
        (&config.remove_cell_tags, &mut settings.remove_cell_tags),
        (
            &config.remove_all_outputs_tags,
            &mut settings.remove_all_outputs_tags,
        ),
        (&config.remove_input_tags, &mut settings.remove_input_tags),
        (
            &config.remove_single_output_tags,
            &mut settings.remove_single_output_tags,
        ),
    ];
    for (configured, setting) in overrides {
        if let Some(values) = configured {
            setting.clone_from(values);
        }
    }
    if let Some(warning) = &config.warning {
        settings.warning.clone_from(warning);
    }
    settings
}

/// Build the notebook converter described by `config`.
fn converter_from_config(config: &Config) -> Result<NotebookConverter, CliError> {
    let pipeline = Pipeline::mdx(&pipeline_settings(&config.pipeline))?;
    tracing::debug!(stages = ?pipeline.stage_names(), "Built pipeline");
    Ok(NotebookConverter::new(pipeline, MdxExporter::new())
        .with_output_extension(config.build_resolved.output_extension.clone()))
}
