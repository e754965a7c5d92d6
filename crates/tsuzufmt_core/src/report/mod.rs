//! Diagnostics collected during a session.

pub mod formatter;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::input::FileName;
use formatter::ReportFormatter;

/// Severity level for diagnostics.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - the input could not be formatted as requested.
    #[default]
    Error,
    /// Warning - formatted, but should be reviewed.
    Warning,
}

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A line is longer than `max_width`.
    LineOverflow,
    /// Trailing whitespace the renderer could not remove.
    TrailingWhitespace,
    /// Syntax that needs a feature gate.
    FeatureGate,
    /// The source could not be parsed.
    Parse,
    /// The source could not be read.
    Io,
    /// Any other renderer failure.
    Render,
}

impl DiagnosticKind {
    /// Short identifier used in rendered output.
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::LineOverflow => "line-overflow",
            DiagnosticKind::TrailingWhitespace => "trailing-whitespace",
            DiagnosticKind::FeatureGate => "feature-gate",
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::Io => "io",
            DiagnosticKind::Render => "render",
        }
    }

    /// Kinds that are only reported for lines eligible for formatting.
    pub fn is_range_sensitive(self) -> bool {
        matches!(
            self,
            DiagnosticKind::LineOverflow | DiagnosticKind::TrailingWhitespace
        )
    }
}

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start and end positions of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width span at one position.
    #[inline]
    pub const fn point(line: u32, column: u32) -> Self {
        let pos = Position::new(line, column);
        Self::new(pos, pos)
    }

    /// Columns `start..=end` of a single line.
    #[inline]
    pub const fn columns(line: u32, start: u32, end: u32) -> Self {
        Self::new(Position::new(line, start), Position::new(line, end))
    }
}

/// An issue found while formatting one input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub input: FileName,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    /// Source line the span points into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(
        input: FileName,
        kind: DiagnosticKind,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            input,
            kind,
            severity: Severity::Error,
            span,
            message: message.into(),
            snippet: None,
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(
        input: FileName,
        kind: DiagnosticKind,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(input, kind, span, message)
        }
    }

    /// Sets the severity level.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attaches the source line the span points into.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

type Slot = Arc<Mutex<Vec<Diagnostic>>>;

/// Diagnostics of a session run, keyed by input.
///
/// `record` may be called concurrently. The map lock is only held to find or
/// create an input's slot; appends lock that slot alone.
#[derive(Debug, Default)]
pub struct FormatReport {
    files: RwLock<BTreeMap<FileName, Slot>>,
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

impl FormatReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `diagnostic` under `input`. Never reorders earlier entries.
    pub fn record(&self, input: &FileName, diagnostic: Diagnostic) {
        let slot = self.slot(input);
        let counter = match diagnostic.severity {
            Severity::Error => &self.errors,
            Severity::Warning => &self.warnings,
        };
        slot.lock().push(diagnostic);
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn slot(&self, input: &FileName) -> Slot {
        if let Some(slot) = self.files.read().get(input) {
            return Arc::clone(slot);
        }
        let mut files = self.files.write();
        Arc::clone(files.entry(input.clone()).or_default())
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.error_count() == 0 && self.warning_count() == 0
    }

    /// Diagnostics of one input, in recording order.
    pub fn for_input(&self, input: &FileName) -> Vec<Diagnostic> {
        self.files
            .read()
            .get(input)
            .map(|slot| slot.lock().clone())
            .unwrap_or_default()
    }

    /// Inputs with at least one diagnostic, in name order.
    pub fn inputs(&self) -> Vec<FileName> {
        self.files.read().keys().cloned().collect()
    }

    /// All diagnostics grouped by input, in name order.
    pub fn diagnostics(&self) -> Vec<(FileName, Vec<Diagnostic>)> {
        self.files
            .read()
            .iter()
            .map(|(name, slot)| (name.clone(), slot.lock().clone()))
            .collect()
    }

    /// Deep copy detached from this report's locks.
    pub fn snapshot(&self) -> FormatReport {
        let files = self
            .diagnostics()
            .into_iter()
            .map(|(name, diags)| (name, Arc::new(Mutex::new(diags))))
            .collect();
        FormatReport {
            files: RwLock::new(files),
            errors: AtomicUsize::new(self.error_count()),
            warnings: AtomicUsize::new(self.warning_count()),
        }
    }

    /// Renders the report with `formatter`.
    pub fn render(&self, formatter: &dyn ReportFormatter) -> String {
        formatter.render(self)
    }
}

impl Clone for FormatReport {
    fn clone(&self) -> Self {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    fn diag(input: &str, line: u32, severity: Severity) -> Diagnostic {
        Diagnostic::error(
            FileName::from(input),
            DiagnosticKind::LineOverflow,
            Span::point(line, 1),
            format!("issue at {}", line),
        )
        .with_severity(severity)
    }

    #[test]
    fn test_new_report_is_empty() {
        let report = FormatReport::new();
        assert!(report.is_empty());
        assert_eq!(report.error_count(), 0);
        assert!(report.for_input(&FileName::Stdin).is_empty());
    }

    #[test]
    fn test_record_counts_and_order() {
        let report = FormatReport::new();
        report.record(&FileName::from("a.src"), diag("a.src", 3, Severity::Error));
        report.record(&FileName::from("a.src"), diag("a.src", 1, Severity::Warning));
        report.record(&FileName::from("b.src"), diag("b.src", 2, Severity::Warning));

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 2);

        let lines: Vec<u32> = report
            .for_input(&FileName::from("a.src"))
            .iter()
            .map(|d| d.span.start.line)
            .collect();
        assert_eq!(lines, vec![3, 1]);
        assert_eq!(
            report.inputs(),
            vec![FileName::from("a.src"), FileName::from("b.src")]
        );
    }

    #[test]
    fn test_snapshot_is_detached() {
        let report = FormatReport::new();
        report.record(&FileName::from("a.src"), diag("a.src", 1, Severity::Error));

        let snapshot = report.snapshot();
        report.record(&FileName::from("a.src"), diag("a.src", 2, Severity::Error));

        assert_eq!(snapshot.error_count(), 1);
        assert_eq!(snapshot.for_input(&FileName::from("a.src")).len(), 1);
        assert_eq!(report.for_input(&FileName::from("a.src")).len(), 2);
    }

    #[test]
    fn test_concurrent_record() {
        let report = Arc::new(FormatReport::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let report = Arc::clone(&report);
                thread::spawn(move || {
                    let input = format!("file{}.src", t % 2);
                    for line in 1..=50 {
                        let d = diag(&input, line, Severity::Warning);
                        report.record(&d.input.clone(), d);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(report.warning_count(), 400);
        assert_eq!(report.for_input(&FileName::from("file0.src")).len(), 200);
        assert_eq!(report.for_input(&FileName::from("file1.src")).len(), 200);
    }

    #[test]
    fn test_diagnostic_serialization() {
        let d = Diagnostic::warning(
            FileName::from("a.src"),
            DiagnosticKind::LineOverflow,
            Span::columns(4, 101, 120),
            "line exceeds maximum width",
        );
        let json = serde_json::to_value(&d).unwrap();

        assert_eq!(json["input"], "a.src");
        assert_eq!(json["kind"], "line-overflow");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["span"]["start"]["column"], 101);
        assert!(json.get("snippet").is_none());
    }

    #[test]
    fn test_range_sensitive_kinds() {
        assert!(DiagnosticKind::LineOverflow.is_range_sensitive());
        assert!(!DiagnosticKind::Parse.is_range_sensitive());
        assert!(!DiagnosticKind::FeatureGate.is_range_sensitive());
    }
}
