//! Code formatting of cells tagged `black`.

use std::io::Write;
use std::process::{Command, Stdio};

use nbmdx_notebook::Cell;

use crate::{PipelineError, Preprocessor, Resources};

const FORMAT_TAG: &str = "black";

/// Formats a code cell source.
///
/// Errors carry the formatter's diagnostics. Closures of type
/// `Fn(&str) -> Result<String, String>` implement this trait.
pub trait CodeFormatter: Send + Sync {
    /// Return the formatted `source`.
    fn format(&self, source: &str) -> Result<String, String>;
}

impl<F> CodeFormatter for F
where
    F: Fn(&str) -> Result<String, String> + Send + Sync,
{
    fn format(&self, source: &str) -> Result<String, String> {
        self(source)
    }
}

/// Formatter reading source on stdin and writing the result to stdout,
/// such as `black -q -`.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    /// Split `command` into program and arguments.
    pub fn from_command(command: &[String]) -> Self {
        let (program, args) = command.split_first().map_or_else(
            || (String::new(), Vec::new()),
            |(program, args)| (program.clone(), args.to_vec()),
        );
        Self { program, args }
    }
}

impl CodeFormatter for CommandFormatter {
    fn format(&self, source: &str) -> Result<String, String> {
        if self.program.is_empty() {
            return Err("no formatter command configured".to_owned());
        }
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to start {}: {e}", self.program))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| format!("{} has no stdin", self.program))?;

        // Feed stdin from a second thread so a full stdout pipe cannot block us.
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(source.as_bytes()));
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.map_err(|e| format!("failed to wait for {}: {e}", self.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} exited with {}: {}", self.program, output.status, stderr.trim()));
        }
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(format!("failed to write to {}: {e}", self.program)),
            Err(_) => return Err(format!("writer for {} panicked", self.program)),
        }
        String::from_utf8(output.stdout).map_err(|e| format!("{} wrote invalid UTF-8: {e}", self.program))
    }
}

/// Reformat code cells tagged `black`.
pub struct Black {
    formatter: Box<dyn CodeFormatter>,
}

impl Black {
    /// Format with `formatter`.
    pub fn new<F: CodeFormatter + 'static>(formatter: F) -> Self {
        Self {
            formatter: Box::new(formatter),
        }
    }
}

impl Preprocessor for Black {
    fn name(&self) -> &'static str {
        "Black"
    }

    fn preprocess_cell(
        &self,
        cell: &mut Cell,
        _resources: &mut Resources,
        index: usize,
    ) -> Result<(), PipelineError> {
        if !cell.is_code() || !cell.has_any_tag(&[FORMAT_TAG]) {
            return Ok(());
        }
        let formatted = self
            .formatter
            .format(&cell.source)
            .map_err(|message| PipelineError::Format { index, message })?;
        cell.source = formatted.trim().to_owned();
        Ok(())
    }
}
