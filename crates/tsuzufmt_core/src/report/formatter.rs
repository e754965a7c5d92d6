//! Text and JSON rendering of a [`FormatReport`].

use std::fmt::{self, Write};

use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource};
use serde::Serialize;
use thiserror::Error;

use super::{Diagnostic, FormatReport, Severity};
use crate::input::FileName;

/// Renders a report into text.
pub trait ReportFormatter: Send + Sync {
    fn render(&self, report: &FormatReport) -> String;
}

/// Output style of a built formatter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReportStyle {
    #[default]
    Human,
    Json,
}

impl fmt::Display for ReportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportStyle::Human => "human",
            ReportStyle::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatterError {
    #[error("{option} is not supported by the {style} report style")]
    Unsupported {
        option: &'static str,
        style: ReportStyle,
    },
}

/// Builds a [`ReportFormatter`].
#[derive(Debug, Clone, Default)]
pub struct FormatReportFormatterBuilder {
    colors: bool,
    show_context: bool,
    style: ReportStyle,
}

impl FormatReportFormatterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits ANSI colors in human output.
    pub fn enable_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    /// Shows the offending source line under each diagnostic.
    pub fn show_context(mut self, show: bool) -> Self {
        self.show_context = show;
        self
    }

    pub fn style(mut self, style: ReportStyle) -> Self {
        self.style = style;
        self
    }

    pub fn build(self) -> Result<Box<dyn ReportFormatter>, FormatterError> {
        match self.style {
            ReportStyle::Human => {
                let theme = if self.colors {
                    GraphicalTheme::unicode()
                } else {
                    GraphicalTheme::unicode_nocolor()
                };
                Ok(Box::new(HumanFormatter {
                    handler: GraphicalReportHandler::new_themed(theme)
                        .with_width(120)
                        .with_context_lines(0),
                    colors: self.colors,
                    show_context: self.show_context,
                }))
            }
            ReportStyle::Json if self.colors => Err(FormatterError::Unsupported {
                option: "colors",
                style: ReportStyle::Json,
            }),
            ReportStyle::Json if self.show_context => Err(FormatterError::Unsupported {
                option: "context",
                style: ReportStyle::Json,
            }),
            ReportStyle::Json => Ok(Box::new(JsonFormatter)),
        }
    }
}

struct HumanFormatter {
    handler: GraphicalReportHandler,
    colors: bool,
    show_context: bool,
}

impl HumanFormatter {
    fn severity_label(&self, severity: Severity) -> String {
        let (label, color) = match severity {
            Severity::Error => ("error", "31"),
            Severity::Warning => ("warning", "33"),
        };
        if self.colors {
            format!("\x1b[{}m{}\x1b[0m", color, label)
        } else {
            label.to_string()
        }
    }

    fn write_diagnostic(&self, out: &mut String, diag: &Diagnostic) -> fmt::Result {
        writeln!(
            out,
            "  {} {} [{}]: {}",
            diag.span.start,
            self.severity_label(diag.severity),
            diag.kind.code(),
            diag.message
        )?;

        if !self.show_context {
            return Ok(());
        }
        if let Some(view) = SnippetView::new(diag) {
            let mut rendered = String::new();
            self.handler.render_report(&mut rendered, &view)?;
            for line in rendered.lines().filter(|l| !l.trim().is_empty()) {
                writeln!(out, "    {}", line)?;
            }
        }
        Ok(())
    }
}

impl ReportFormatter for HumanFormatter {
    fn render(&self, report: &FormatReport) -> String {
        let mut out = String::new();

        for (name, diagnostics) in report.diagnostics() {
            if diagnostics.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}:", name);
            for diag in &diagnostics {
                let _ = self.write_diagnostic(&mut out, diag);
            }
            out.push('\n');
        }

        let _ = writeln!(
            out,
            "Found {} {}, {} {}",
            report.error_count(),
            plural(report.error_count(), "error"),
            report.warning_count(),
            plural(report.warning_count(), "warning"),
        );
        out
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// A diagnostic's source line, shaped for miette's graphical handler.
#[derive(Debug, Error)]
#[error("{code}")]
struct SnippetView {
    code: &'static str,
    severity: Severity,
    snippet: NamedSource<String>,
    label: LabeledSpan,
}

impl SnippetView {
    fn new(diag: &Diagnostic) -> Option<Self> {
        let line = diag.snippet.as_deref()?;
        let start = byte_offset(line, diag.span.start.column);
        let end = if diag.span.end.line == diag.span.start.line {
            byte_offset(line, diag.span.end.column.saturating_add(1))
        } else {
            line.len()
        };
        let label = LabeledSpan::new(
            Some(diag.message.clone()),
            start,
            end.saturating_sub(start).max(usize::from(start < line.len())),
        );
        let name = format!("{}:{}", diag.input, diag.span.start.line);

        Some(Self {
            code: diag.kind.code(),
            severity: diag.severity,
            snippet: NamedSource::new(name, line.to_string()),
            label,
        })
    }
}

/// Byte offset of 1-based character `column` in `line`, clamped to its length.
fn byte_offset(line: &str, column: u32) -> usize {
    let index = column.saturating_sub(1) as usize;
    line.char_indices()
        .nth(index)
        .map_or(line.len(), |(offset, _)| offset)
}

impl miette::Diagnostic for SnippetView {
    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.snippet)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(self.label.clone())))
    }
}

struct JsonFormatter;

#[derive(Serialize)]
struct JsonReport {
    errors: usize,
    warnings: usize,
    files: Vec<JsonFile>,
}

#[derive(Serialize)]
struct JsonFile {
    name: FileName,
    diagnostics: Vec<Diagnostic>,
}

impl ReportFormatter for JsonFormatter {
    fn render(&self, report: &FormatReport) -> String {
        let output = JsonReport {
            errors: report.error_count(),
            warnings: report.warning_count(),
            files: report
                .diagnostics()
                .into_iter()
                .map(|(name, diagnostics)| JsonFile { name, diagnostics })
                .collect(),
        };
        serde_json::to_string_pretty(&output)
            .unwrap_or_else(|e| format!("{{\"error\": {:?}}}", e.to_string()))
    }
}
