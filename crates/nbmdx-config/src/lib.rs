//! Configuration management for nbmdx.
//!
//! Parses `nbmdx.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! A bare `$` (as in `$VAR`) is kept literally.
//!
//! Expanded fields:
//! - `build.source_dir`
//! - `check.doc_dir`
//! - `pipeline.formatter` (every entry)

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override notebook source directory.
    pub source_dir: Option<PathBuf>,
    /// Override force-all rebuild flag.
    pub force_all: Option<bool>,
    /// Override number of worker threads.
    pub workers: Option<usize>,
    /// Override pause before each notebook.
    pub pause: Option<Duration>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "nbmdx.toml";

/// Default extension of generated files.
const DEFAULT_OUTPUT_EXTENSION: &str = "md";

/// Default pause before converting each notebook.
const DEFAULT_PAUSE: Duration = Duration::from_millis(500);

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build configuration (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Pipeline configuration. Unset fields keep the pipeline defaults.
    pub pipeline: PipelineConfig,
    /// Front matter check configuration (paths are relative strings from TOML).
    check: CheckConfigRaw,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Resolved check configuration (set after loading).
    #[serde(skip)]
    pub check_resolved: CheckConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw build configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_extension: Option<String>,
    workers: Option<usize>,
    pause_ms: Option<u64>,
    recursive: Option<bool>,
    force_all: Option<bool>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Directory (or single notebook) to convert.
    pub source_dir: PathBuf,
    /// Extension of the generated files, without the dot.
    pub output_extension: String,
    /// Worker threads; `None` uses one per CPU.
    pub workers: Option<usize>,
    /// Pause before converting each notebook.
    pub pause: Duration,
    /// Whether to descend into subdirectories.
    pub recursive: bool,
    /// Convert every notebook, even unchanged ones.
    pub force_all: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_owned(),
            workers: None,
            pause: DEFAULT_PAUSE,
            recursive: true,
            force_all: false,
        }
    }
}

/// Pipeline configuration.
///
/// Every field is optional; `None` means the pipeline default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Test flags stripped from code cells.
    pub tst_flags: Option<Vec<String>>,
    /// Formatter command for cells tagged `black`.
    pub formatter: Option<Vec<String>>,
    /// Tags that remove the whole cell.
    pub remove_cell_tags: Option<Vec<String>>,
    /// Tags that remove all outputs of a cell.
    pub remove_all_outputs_tags: Option<Vec<String>>,
    /// Tags that hide the input of a cell.
    pub remove_input_tags: Option<Vec<String>>,
    /// Output tags that remove a single output.
    pub remove_single_output_tags: Option<Vec<String>>,
    /// Banner inserted after the first cell.
    pub warning: Option<String>,
}

/// Raw check configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CheckConfigRaw {
    doc_dir: Option<String>,
}

/// Resolved front matter check configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Directory of generated markdown files to check.
    pub doc_dir: PathBuf,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            doc_dir: PathBuf::from("."),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`build.source_dir`").
        field: String,
        /// Error message (e.g., "${`NBS_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require every entry of an optional list to be non-empty.
fn require_non_empty_entries(values: Option<&[String]>, field: &str) -> Result<(), ConfigError> {
    for value in values.unwrap_or_default() {
        require_non_empty(value, &format!("{field} entry"))?;
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `nbmdx.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(force_all) = settings.force_all {
            self.build_resolved.force_all = force_all;
        }
        if let Some(workers) = settings.workers {
            self.build_resolved.workers = Some(workers);
        }
        if let Some(pause) = settings.pause {
            self.build_resolved.pause = pause;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::discover_config_from(&cwd)
    }

    /// Search for config file in `start` and its parents.
    fn discover_config_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            build_resolved: BuildConfig {
                source_dir: base.to_path_buf(),
                ..BuildConfig::default()
            },
            check_resolved: CheckConfig {
                doc_dir: base.to_path_buf(),
            },
            ..Self::default()
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_build()?;
        self.validate_pipeline()?;
        Ok(())
    }

    /// Validate build configuration.
    fn validate_build(&self) -> Result<(), ConfigError> {
        let ext = &self.build_resolved.output_extension;
        require_non_empty(ext, "build.output_extension")?;
        if ext.starts_with('.') {
            return Err(ConfigError::Validation(format!(
                "build.output_extension must not start with a dot (use \"{}\")",
                ext.trim_start_matches('.')
            )));
        }
        Ok(())
    }

    /// Validate pipeline configuration.
    fn validate_pipeline(&self) -> Result<(), ConfigError> {
        let pipeline = &self.pipeline;
        if let Some(formatter) = &pipeline.formatter {
            let program = formatter.first().map_or("", String::as_str);
            require_non_empty(program, "pipeline.formatter")?;
        }
        require_non_empty_entries(pipeline.tst_flags.as_deref(), "pipeline.tst_flags")?;
        require_non_empty_entries(
            pipeline.remove_cell_tags.as_deref(),
            "pipeline.remove_cell_tags",
        )?;
        require_non_empty_entries(
            pipeline.remove_all_outputs_tags.as_deref(),
            "pipeline.remove_all_outputs_tags",
        )?;
        require_non_empty_entries(
            pipeline.remove_input_tags.as_deref(),
            "pipeline.remove_input_tags",
        )?;
        require_non_empty_entries(
            pipeline.remove_single_output_tags.as_deref(),
            "pipeline.remove_single_output_tags",
        )?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.build.source_dir {
            self.build.source_dir = Some(expand::expand_env(dir, "build.source_dir")?);
        }
        if let Some(ref dir) = self.check.doc_dir {
            self.check.doc_dir = Some(expand::expand_env(dir, "check.doc_dir")?);
        }
        if let Some(ref formatter) = self.pipeline.formatter {
            self.pipeline.formatter = Some(expand::expand_env_list(formatter, "pipeline.formatter")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve =
            |path: Option<&str>| path.map_or_else(|| config_dir.to_path_buf(), |p| config_dir.join(p));
        let defaults = BuildConfig::default();

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref()),
            output_extension: self
                .build
                .output_extension
                .clone()
                .unwrap_or(defaults.output_extension),
            workers: self.build.workers,
            pause: self
                .build
                .pause_ms
                .map_or(defaults.pause, Duration::from_millis),
            recursive: self.build.recursive.unwrap_or(defaults.recursive),
            force_all: self.build.force_all.unwrap_or(defaults.force_all),
        };

        self.check_resolved = CheckConfig {
            doc_dir: resolve(self.check.doc_dir.as_deref()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/test"));
        assert_eq!(config.build_resolved.output_extension, "md");
        assert_eq!(config.build_resolved.workers, None);
        assert_eq!(config.build_resolved.pause, Duration::from_millis(500));
        assert!(config.build_resolved.recursive);
        assert!(!config.build_resolved.force_all);
        assert_eq!(config.check_resolved.doc_dir, PathBuf::from("/test"));
        assert!(config.pipeline.formatter.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.build.source_dir.is_none());
        assert!(config.pipeline.tst_flags.is_none());
    }

    #[test]
    fn test_parse_pipeline_config() {
        let toml = r#"
[pipeline]
tst_flags = ["notest", "slow"]
formatter = ["ruff", "format", "-"]
remove_single_output_tags = ["private"]
warning = "{/* generated */}"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let pipeline = config.pipeline;
        assert_eq!(
            pipeline.tst_flags,
            Some(vec!["notest".to_owned(), "slow".to_owned()])
        );
        assert_eq!(
            pipeline.formatter,
            Some(vec!["ruff".to_owned(), "format".to_owned(), "-".to_owned()])
        );
        assert_eq!(
            pipeline.remove_single_output_tags,
            Some(vec!["private".to_owned()])
        );
        assert!(pipeline.remove_cell_tags.is_none());
        assert_eq!(pipeline.warning.as_deref(), Some("{/* generated */}"));
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[build]
source_dir = "nbs"
output_extension = "mdx"
workers = 2
pause_ms = 250
recursive = false

[check]
doc_dir = "site/docs"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.build_resolved,
            BuildConfig {
                source_dir: PathBuf::from("/project/nbs"),
                output_extension: "mdx".to_owned(),
                workers: Some(2),
                pause: Duration::from_millis(250),
                recursive: false,
                force_all: false,
            }
        );
        assert_eq!(
            config.check_resolved.doc_dir,
            PathBuf::from("/project/site/docs")
        );
    }

    #[test]
    fn test_resolve_paths_defaults_to_config_dir() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/project"));
        assert_eq!(config.build_resolved.output_extension, "md");
        assert_eq!(config.check_resolved.doc_dir, PathBuf::from("/project"));
    }

    #[test]
    fn test_apply_cli_settings_source_dir() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            source_dir: Some(PathBuf::from("/custom/nbs")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(
            config.build_resolved.source_dir,
            PathBuf::from("/custom/nbs")
        );
        assert!(!config.build_resolved.force_all); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_multiple() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            force_all: Some(true),
            workers: Some(8),
            pause: Some(Duration::from_secs(1)),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert!(config.build_resolved.force_all);
        assert_eq!(config.build_resolved.workers, Some(8));
        assert_eq!(config.build_resolved.pause, Duration::from_secs(1));
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/test"));
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(
            config.build_resolved,
            Config::default_with_base(Path::new("/test")).build_resolved
        );
    }

    #[test]
    fn test_expand_env_vars_source_dir() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("NBMDX_TEST_NBS", "notebooks");
        }

        let toml = r#"
[build]
source_dir = "${NBMDX_TEST_NBS}"

[check]
doc_dir = "${NBMDX_TEST_DOCS:-docs}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.build.source_dir.as_deref(), Some("notebooks"));
        assert_eq!(config.check.doc_dir.as_deref(), Some("docs"));

        unsafe {
            std::env::remove_var("NBMDX_TEST_NBS");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MISSING_VAR_NBMDX_TEST");
        }

        let toml = r#"
[pipeline]
formatter = ["${MISSING_VAR_NBMDX_TEST}", "-q", "-"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MISSING_VAR_NBMDX_TEST"));
        assert!(err.to_string().contains("pipeline.formatter[0]"));
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_output_extension_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.build_resolved.output_extension = String::new();
        assert_validation_error(&config, &["build.output_extension", "empty"]);
    }

    #[test]
    fn test_validate_output_extension_leading_dot() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.build_resolved.output_extension = ".mdx".to_owned();
        assert_validation_error(&config, &["build.output_extension", "\"mdx\""]);
    }

    #[test]
    fn test_validate_formatter_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.pipeline.formatter = Some(Vec::new());
        assert_validation_error(&config, &["pipeline.formatter"]);
    }

    #[test]
    fn test_validate_empty_tag() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.pipeline.remove_cell_tags = Some(vec!["hide".to_owned(), String::new()]);
        assert_validation_error(&config, &["pipeline.remove_cell_tags"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[build]\nsource_dir = \"nbs\"\nforce_all = true\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.build_resolved.source_dir, dir.path().join("nbs"));
        assert!(config.build_resolved.force_all);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_applies_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[build]\nworkers = 2\n").unwrap();

        let settings = CliSettings {
            workers: Some(0),
            ..Default::default()
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.build_resolved.workers, Some(0));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[build]\noutput_extension = \".md\"\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[build\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/nbmdx.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nbs/guide");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_config_from(&nested),
            Some(dir.path().join(CONFIG_FILENAME))
        );
    }
}
