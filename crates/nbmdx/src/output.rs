//! Status lines printed by the nbmdx commands on stderr.

use std::path::{Path, PathBuf};

use console::{Style, Term};
use nbmdx_build::BuildError;

/// Colored status output. Stdout stays free for `convert --stdout`.
pub(crate) struct Output {
    term: Term,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn line(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }

    /// Announce the directory or notebook a build starts from.
    pub(crate) fn building(&self, source: &Path) {
        self.line(
            &Style::new().cyan().bold(),
            &format!("Building {}", source.display()),
        );
    }

    /// Plain status line.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Green line for a completed conversion or passing check.
    pub(crate) fn success(&self, msg: &str) {
        self.line(&Style::new().green(), msg);
    }

    /// Yellow line for a build that had nothing to do.
    pub(crate) fn warning(&self, msg: &str) {
        self.line(&Style::new().yellow(), msg);
    }

    /// Red line for a command error.
    pub(crate) fn error(&self, msg: &str) {
        self.line(&Style::new().red(), msg);
    }

    /// List the notebooks that failed to convert with their errors.
    pub(crate) fn failures(&self, failed: &[(PathBuf, BuildError)]) {
        let red = Style::new().red();
        self.line(&red, "Conversion failed on the following:");
        for (path, err) in failed {
            self.line(&red, &format!("  {}: {err}", path.display()));
        }
    }
}
