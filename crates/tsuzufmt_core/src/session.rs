//! A formatting session: one resolved config, many inputs, one report.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigSources, EmitMode};
use crate::diff::{ModifiedChunk, ModifiedLines, make_diff};
use crate::error::{DiffError, RenderError, SessionError};
use crate::file_lines::{EligibleLines, FileLines};
use crate::input::{FileName, FsLoader, Input, SourceLoader};
use crate::renderer::Renderer;
use crate::report::{Diagnostic, DiagnosticKind, FormatReport, Span};

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No input formatted yet; config not resolved.
    Created,
    /// Config resolved; inputs may still be added.
    Running,
    /// `finish` was called.
    Finished,
}

/// What a session produced for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutput {
    /// Full formatted text.
    Text(String),
    /// Changed chunks, for diff-type emit modes.
    Diff(ModifiedLines),
}

/// The original text of an input and its formatted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedInput {
    pub source: String,
    pub output: FormatOutput,
}

impl FormattedInput {
    /// Returns true if formatting would change the input.
    pub fn changed(&self) -> bool {
        match &self.output {
            FormatOutput::Text(text) => *text != self.source,
            FormatOutput::Diff(diff) => !diff.is_empty(),
        }
    }
}

/// Overall outcome, mapped to process exit codes by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// A diff-type emit mode found changes.
    DiffFound,
    /// At least one error diagnostic was recorded.
    Failure,
}

/// Everything a finished session produced.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub report: FormatReport,
    pub outputs: BTreeMap<FileName, FormattedInput>,
    pub status: ExitStatus,
    pub emit_mode: EmitMode,
}

/// Runs one formatting pass over many inputs.
///
/// The config is resolved on the first `format` call and shared by every
/// input after that.
pub struct Session {
    sources: ConfigSources,
    renderer: Box<dyn Renderer>,
    loader: Box<dyn SourceLoader>,
    file_lines: FileLines,
    config: Option<Arc<Config>>,
    state: SessionState,
    report: FormatReport,
    outputs: BTreeMap<FileName, FormattedInput>,
}

impl Session {
    /// Creates a session that formats every line of every input.
    pub fn new(sources: ConfigSources, renderer: Box<dyn Renderer>) -> Self {
        Self {
            sources,
            renderer,
            loader: Box::new(FsLoader),
            file_lines: FileLines::all(),
            config: None,
            state: SessionState::Created,
            report: FormatReport::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Restricts formatting to the given lines.
    pub fn with_file_lines(mut self, file_lines: FileLines) -> Self {
        self.file_lines = file_lines;
        self
    }

    /// Replaces the loader used for `Input::File`.
    pub fn with_loader(mut self, loader: Box<dyn SourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The resolved config, once the first input was formatted.
    pub fn config(&self) -> Option<&Config> {
        self.config.as_deref()
    }

    /// Diagnostics recorded so far.
    pub fn report(&self) -> &FormatReport {
        &self.report
    }

    /// Output for `name`, if it was formatted.
    pub fn output(&self, name: &FileName) -> Option<&FormattedInput> {
        self.outputs.get(name)
    }

    /// Formats one input.
    pub fn format(&mut self, input: &Input) -> Result<(), SessionError> {
        self.format_all(std::slice::from_ref(input))
    }

    /// Formats many inputs in parallel. Outputs are stored in input order, so
    /// a repeated name keeps its last result.
    pub fn format_all(&mut self, inputs: &[Input]) -> Result<(), SessionError> {
        let config = self.ensure_config()?;
        let pass = Pass {
            config: &config,
            renderer: self.renderer.as_ref(),
            loader: self.loader.as_ref(),
            file_lines: &self.file_lines,
            report: &self.report,
        };

        let results: Vec<_> = inputs
            .par_iter()
            .map(|input| pass.run(input))
            .collect();

        for result in results {
            let (name, formatted) = result?;
            self.outputs.insert(name, formatted);
        }
        Ok(())
    }

    /// Ends the session and hands over its results.
    pub fn finish(&mut self) -> Result<SessionResult, SessionError> {
        if self.state == SessionState::Finished {
            return Err(SessionError::Finished);
        }
        let config = self.ensure_config()?;
        self.state = SessionState::Finished;

        let emit_mode = config.emit_mode();
        let report = std::mem::take(&mut self.report);
        let outputs = std::mem::take(&mut self.outputs);

        let status = if report.has_errors() {
            ExitStatus::Failure
        } else if emit_mode.wants_diff() && outputs.values().any(FormattedInput::changed) {
            ExitStatus::DiffFound
        } else {
            ExitStatus::Success
        };

        info!(
            "Formatted {} inputs ({} errors, {} warnings)",
            outputs.len(),
            report.error_count(),
            report.warning_count()
        );

        Ok(SessionResult {
            report,
            outputs,
            status,
            emit_mode,
        })
    }

    fn ensure_config(&mut self) -> Result<Arc<Config>, SessionError> {
        match self.state {
            SessionState::Finished => return Err(SessionError::Finished),
            SessionState::Running => {
                if let Some(config) = &self.config {
                    return Ok(Arc::clone(config));
                }
            }
            SessionState::Created => {}
        }

        let config = Arc::new(self.sources.resolve()?);
        if let Some(path) = self.sources.config_path() {
            debug!("Using config file {}", path.display());
        }
        self.config = Some(Arc::clone(&config));
        self.state = SessionState::Running;
        Ok(config)
    }
}

/// Borrowed state shared by the parallel workers of one `format_all` call.
struct Pass<'a> {
    config: &'a Config,
    renderer: &'a dyn Renderer,
    loader: &'a dyn SourceLoader,
    file_lines: &'a FileLines,
    report: &'a FormatReport,
}

impl Pass<'_> {
    fn run(&self, input: &Input) -> Result<(FileName, FormattedInput), DiffError> {
        let name = input.file_name();

        let source = match input {
            Input::File(path) => match self.loader.load(path) {
                Ok(source) => source,
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    self.report.record(
                        &name,
                        Diagnostic::error(
                            name.clone(),
                            DiagnosticKind::Io,
                            Span::point(1, 1),
                            format!("failed to read file: {}", e),
                        ),
                    );
                    return Ok((name, self.unchanged(String::new())));
                }
            },
            Input::Text { content, .. } => content.clone(),
        };

        let eligible = self.file_lines.lines_for(&name);
        if eligible.is_empty() {
            debug!("{}: no eligible lines, output is kept as is", name);
        }

        let rendered = match self.renderer.render(&name, &source, self.config) {
            Ok(rendered) => rendered,
            Err(e) => {
                debug!("Failed to render {}: {}", name, e);
                self.record(&name, &source, render_failure(&name, e));
                return Ok((name, self.unchanged(source)));
            }
        };

        for diag in rendered.diagnostics {
            if diag.kind.is_range_sensitive() && !eligible.contains(diag.span.start.line) {
                continue;
            }
            self.record(&name, &source, diag);
        }

        let original: Vec<&str> = source.lines().collect();
        let rendered_lines: Vec<&str> = rendered.text.lines().collect();
        let wants_diff = self.config.emit_mode().wants_diff();
        let ending = self.config.newline_style().line_ending(&source);

        let output = if eligible.is_all() {
            if wants_diff {
                FormatOutput::Diff(make_diff(&original, &rendered_lines))
            } else {
                FormatOutput::Text(join_lines(&rendered_lines, ending))
            }
        } else {
            let kept = self.restrict(&name, eligible, &original, &rendered_lines);
            let formatted = kept.apply(&original)?;
            if wants_diff {
                FormatOutput::Diff(make_diff(&original, &formatted))
            } else {
                FormatOutput::Text(splice(&source, &kept, ending))
            }
        };
        Ok((name, FormattedInput { source, output }))
    }

    fn unchanged(&self, source: String) -> FormattedInput {
        let output = if self.config.emit_mode().wants_diff() {
            FormatOutput::Diff(ModifiedLines::default())
        } else {
            FormatOutput::Text(source.clone())
        };
        FormattedInput { source, output }
    }

    /// Records `diag`, filling in the offending source line.
    fn record(&self, name: &FileName, source: &str, mut diag: Diagnostic) {
        if diag.snippet.is_none() {
            let line = diag.span.start.line as usize;
            diag.snippet = line
                .checked_sub(1)
                .and_then(|idx| source.lines().nth(idx))
                .map(str::to_string);
        }
        self.report.record(name, diag);
    }

    /// Keeps only the renderer's changes that touch eligible lines.
    fn restrict(
        &self,
        name: &FileName,
        lines: EligibleLines<'_>,
        original: &[&str],
        rendered: &[&str],
    ) -> ModifiedLines {
        let eligible = |line: u32| lines.contains(line);
        let mut kept = Vec::new();

        for chunk in make_diff(original, rendered).chunks {
            let first = chunk.line_number_orig;
            let last = first + chunk.lines_removed;

            if chunk.lines_removed == 0 {
                let before = first > 1 && eligible(first - 1);
                let after = (first as usize) <= original.len() && eligible(first);
                if before || after {
                    kept.push(chunk);
                } else {
                    debug!("{}: dropping insertion at line {}", name, first);
                }
            } else if (first..last).all(eligible) {
                kept.push(chunk);
            } else if chunk.lines_removed as usize == chunk.lines.len() {
                for (line_number_orig, line) in (first..last).zip(chunk.lines) {
                    if eligible(line_number_orig) {
                        kept.push(ModifiedChunk {
                            line_number_orig,
                            lines_removed: 1,
                            lines: vec![line],
                        });
                    }
                }
            } else {
                debug!(
                    "{}: dropping change to lines {}-{} outside the eligible ranges",
                    name,
                    first,
                    last - 1
                );
            }
        }

        ModifiedLines { chunks: kept }
    }
}

fn render_failure(name: &FileName, error: RenderError) -> Diagnostic {
    match error {
        RenderError::Parse { position, message } => Diagnostic::error(
            name.clone(),
            DiagnosticKind::Parse,
            Span::new(position, position),
            message,
        ),
        RenderError::Failed(message) => Diagnostic::error(
            name.clone(),
            DiagnosticKind::Render,
            Span::point(1, 1),
            message,
        ),
    }
}

fn join_lines(lines: &[&str], ending: &str) -> String {
    let mut text = lines.join(ending);
    if !text.is_empty() {
        text.push_str(ending);
    }
    text
}

/// Rebuilds `source` with `diff` applied.
///
/// Untouched lines are copied with their own terminators, so they stay
/// byte-identical. Lines taken from the renderer end with `ending`.
fn splice(source: &str, diff: &ModifiedLines, ending: &str) -> String {
    let segments: Vec<&str> = source.split_inclusive('\n').collect();
    let mut text = String::with_capacity(source.len());
    let mut next = 0usize;

    for chunk in &diff.chunks {
        let start = (chunk.line_number_orig as usize).saturating_sub(1);
        for segment in segments.get(next..start).unwrap_or_default() {
            push_segment(&mut text, segment, ending);
        }
        for line in &chunk.lines {
            push_segment(&mut text, line, ending);
            text.push_str(ending);
        }
        next = start + chunk.lines_removed as usize;
    }
    for segment in segments.get(next..).unwrap_or_default() {
        push_segment(&mut text, segment, ending);
    }
    text
}

/// Appends `segment`, first terminating an unterminated last line.
fn push_segment(text: &mut String, segment: &str, ending: &str) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push_str(ending);
    }
    text.push_str(segment);
}
