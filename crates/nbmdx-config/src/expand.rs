//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use std::sync::LazyLock;

use regex::Regex;

use crate::ConfigError;

/// A braced variable reference. Bare `$` is left alone.
static VAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}]*\}").expect("valid variable regex"));

/// Expand `${VAR}` references in `value`.
///
/// `field` names the config key in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(value.len());
    let mut last = 0;
    for m in VAR_REF.find_iter(value) {
        expanded.push_str(&value[last..m.start()]);
        let var = shellexpand::env(m.as_str()).map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set ({})", e.var_name, e.cause),
        })?;
        expanded.push_str(&var);
        last = m.end();
    }
    expanded.push_str(&value[last..]);
    Ok(expanded)
}

/// Expand every entry of `values`, naming each as `field[index]`.
pub(crate) fn expand_env_list(values: &[String], field: &str) -> Result<Vec<String>, ConfigError> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| expand_env(value, &format!("{field}[{i}]")))
        .collect()
}
