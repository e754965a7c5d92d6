//! Format command implementation

use std::io::{self, IsTerminal, Read};

use miette::{IntoDiagnostic, Result};
use tracing::{debug, info};
use tsuzufmt_core::{
    ConfigSources, ExitStatus, FileLines, FormatReportFormatterBuilder, FsDiscovery,
    Input, PlainTextRenderer, ReportStyle, Session, Verbosity,
};

use crate::cli::{Cli, FormatArgs, Overrides};
use crate::output::{changed_count, emit_outputs};

pub fn run_format(cli: &Cli, args: &FormatArgs) -> Result<ExitStatus> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let options = Overrides::new(cli, Some(args));
    let sources = ConfigSources::load(&cwd, &options, &FsDiscovery::new()).into_diagnostic()?;

    let file_lines = match &args.file_lines {
        Some(json) => FileLines::from_json(json, args.unlisted.into()).into_diagnostic()?,
        None => FileLines::all(),
    };

    let (inputs, stdin_name) = if args.files.is_empty() {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .into_diagnostic()?;
        let input = Input::Text {
            content,
            label: args.stdin_name.clone(),
        };
        let name = input.file_name();
        (vec![input], Some(name))
    } else {
        let inputs = args.files.iter().cloned().map(Input::File).collect();
        (inputs, None)
    };
    debug!("Formatting {} inputs", inputs.len());

    let mut session =
        Session::new(sources, Box::new(PlainTextRenderer::new())).with_file_lines(file_lines);
    session.format_all(&inputs).into_diagnostic()?;
    let config = session.config().cloned().unwrap_or_default();
    let result = session.finish().into_diagnostic()?;

    let style = ReportStyle::from(args.report);
    let human = style == ReportStyle::Human;
    let stdout_colors = config.color().use_colors(io::stdout().is_terminal());
    let stderr_colors = config.color().use_colors(io::stderr().is_terminal());

    emit_outputs(&result, stdin_name.as_ref(), stdout_colors)?;

    let formatter = FormatReportFormatterBuilder::new()
        .style(style)
        .enable_colors(human && stderr_colors)
        .show_context(human && !args.no_context)
        .build()
        .into_diagnostic()?;

    let show_report = !human
        || match config.verbosity() {
            Verbosity::Quiet => result.report.has_errors(),
            Verbosity::Normal => !result.report.is_empty(),
            Verbosity::Verbose => true,
        };
    if show_report {
        eprint!("{}", result.report.render(formatter.as_ref()));
    }

    info!(
        "{} of {} inputs {}",
        changed_count(&result),
        result.outputs.len(),
        if result.emit_mode.wants_diff() {
            "would change"
        } else {
            "changed"
        }
    );

    Ok(result.status)
}
