//! # tsuzufmt_core
//!
//! Core formatting engine for tsuzufmt.
//!
//! This crate provides:
//! - The `Session` orchestrator running one formatting pass over many inputs
//! - Configuration resolution (defaults, discovered file, overrides)
//! - Line-range restriction (`FileLines`)
//! - A line-level diff engine (`ModifiedLines`)
//! - Diagnostic aggregation and report formatters
//!
//! ## Example
//!
//! ```rust,ignore
//! use tsuzufmt_core::{ConfigSources, Input, PlainTextRenderer, Session};
//!
//! let mut session = Session::new(ConfigSources::default(), Box::new(PlainTextRenderer::new()));
//! session.format_all(&[Input::File("src/lib.rs".into())])?;
//! let result = session.finish()?;
//! println!("{} errors", result.report.error_count());
//! ```

pub mod config;
pub mod diff;
mod error;
pub mod file_lines;
mod input;
pub mod renderer;
pub mod report;
mod session;

pub use config::{
    CliOptions, Color, Config, ConfigDiscovery, ConfigSources, ConfigValue, DiscoveredConfig,
    Edition, EmitMode, FsDiscovery, NewlineStyle, Origin, RawOptions, Verbosity,
};
pub use diff::{ModifiedChunk, ModifiedLines, make_diff};
pub use error::{ConfigError, DiffError, RenderError, SessionError, ValidationError};
pub use file_lines::{EligibleLines, FileLines, LineRange, UnlistedFiles};
pub use input::{FileName, FsLoader, Input, SourceLoader};
pub use renderer::{PlainTextRenderer, RenderOutput, Renderer};
pub use report::formatter::{
    FormatReportFormatterBuilder, FormatterError, ReportFormatter, ReportStyle,
};
pub use report::{Diagnostic, DiagnosticKind, FormatReport, Position, Severity, Span};
pub use session::{ExitStatus, FormatOutput, FormattedInput, Session, SessionResult, SessionState};
