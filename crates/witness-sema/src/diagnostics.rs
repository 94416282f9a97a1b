//! Collected analysis diagnostics and verbosity policy.

use tracing::{debug, error};

use crate::errors::SemaError;

/// How much of the diagnostic stream the host should surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Buffer of errors and warnings accumulated over one analysis.
///
/// Errors never abort analysis; the driver decides what to do with the
/// buffer once the full program has been walked.
#[derive(Debug, Default)]
pub struct Diagnostics {
    verbosity: Verbosity,
    errors: Vec<SemaError>,
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, err: SemaError) {
        error!(%err, "semantic error");
        self.errors.push(err);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message, "semantic warning");
        self.warnings.push(message);
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[SemaError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Render the end-of-analysis summary. Errors are always included;
    /// warnings are suppressed in quiet mode.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Semantic Analysis Errors:\n");
            for err in &self.errors {
                out.push_str(&format!("  Error: {err}\n"));
            }
        }
        if self.verbosity != Verbosity::Quiet && !self.warnings.is_empty() {
            out.push_str("Semantic Analysis Warnings:\n");
            for warning in &self.warnings {
                out.push_str(&format!("  Warning: {warning}\n"));
            }
        }
        if self.errors.is_empty() {
            out.push_str("Semantic analysis completed successfully\n");
        } else {
            out.push_str(&format!(
                "Semantic analysis completed with {} error(s)\n",
                self.errors.len()
            ));
        }
        out
    }
}
