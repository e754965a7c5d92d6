//! The seam between a session and the code that actually reformats text.

mod plain;

pub use plain::PlainTextRenderer;

use crate::config::Config;
use crate::error::RenderError;
use crate::input::FileName;
use crate::report::Diagnostic;

/// Reformats the full text of one input.
///
/// Implementations must be pure with respect to their arguments so a session
/// can call them from several threads at once.
pub trait Renderer: Send + Sync {
    /// Returns the formatted text with `\n` line endings and any diagnostics.
    ///
    /// Diagnostic line numbers refer to lines of `source`.
    fn render(
        &self,
        name: &FileName,
        source: &str,
        config: &Config,
    ) -> Result<RenderOutput, RenderError>;
}

/// Result of rendering one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
