//! Emitting session outputs

mod diff;

use std::fs;
use std::io::{self, Write};

use miette::{IntoDiagnostic, Result};
use tracing::{debug, info};
use tsuzufmt_core::{EmitMode, FileName, FormatOutput, FormattedInput, SessionResult};

pub use diff::render_diff;

/// Writes every output the way `result.emit_mode` asks.
///
/// `stdin_name` is the identity of the standard-input text, if any. Its
/// output always goes to stdout, never to the file it is named after.
pub fn emit_outputs(
    result: &SessionResult,
    stdin_name: Option<&FileName>,
    colors: bool,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (name, formatted) in &result.outputs {
        let from_stdin = stdin_name == Some(name);
        match (result.emit_mode, &formatted.output) {
            (EmitMode::Files, FormatOutput::Text(text)) => {
                match name.as_path() {
                    Some(path) if !from_stdin => {
                        if formatted.changed() {
                            fs::write(path, text).into_diagnostic()?;
                            info!("Formatted {}", path.display());
                        } else {
                            debug!("Unchanged {}", path.display());
                        }
                    }
                    _ => write!(out, "{}", text).into_diagnostic()?,
                }
            }
            (EmitMode::Stdout, FormatOutput::Text(text)) => {
                if result.outputs.len() > 1 {
                    writeln!(out, "{}:", name).into_diagnostic()?;
                }
                write!(out, "{}", text).into_diagnostic()?;
            }
            (EmitMode::Diff, FormatOutput::Diff(diff)) => {
                write!(out, "{}", render_diff(name, &formatted.source, diff, colors))
                    .into_diagnostic()?;
            }
            (EmitMode::Check, FormatOutput::Diff(_)) => {
                if formatted.changed() {
                    writeln!(out, "{}", name).into_diagnostic()?;
                }
            }
            (EmitMode::ModifiedLines, FormatOutput::Diff(diff)) => {
                write!(out, "{}", diff).into_diagnostic()?;
            }
            (mode, _) => debug!("No {} output for {}", mode, name),
        }
    }

    out.flush().into_diagnostic()
}

/// Number of inputs that would change.
pub fn changed_count(result: &SessionResult) -> usize {
    result
        .outputs
        .values()
        .filter(|f| FormattedInput::changed(f))
        .count()
}
