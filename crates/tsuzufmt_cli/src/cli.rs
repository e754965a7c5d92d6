//! CLI argument definitions

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tsuzufmt_core::{CliOptions, Color, Edition, EmitMode, RawOptions, ReportStyle, UnlistedFiles};

/// TsuzuFmt - Line-range aware source formatter
#[derive(Parser)]
#[command(name = "tzfmt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override a configuration option
    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        global = true,
        value_parser = parse_key_value
    )]
    pub overrides: Vec<(String, String)>,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Format files, or standard input when no file is given
    Format(FormatArgs),

    /// Print the resolved configuration
    Config {
        /// Print built-in defaults instead
        #[arg(long)]
        default: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct FormatArgs {
    /// Files to format
    pub files: Vec<PathBuf>,

    /// What to emit (files, stdout, diff, check, modified-lines)
    #[arg(long, value_name = "MODE")]
    pub emit: Option<EmitMode>,

    /// Exit with status 1 if any input would change
    #[arg(long, conflicts_with = "emit")]
    pub check: bool,

    /// Only format these line ranges, e.g. '[{"file":"src/a.rs","range":[3,5]}]'
    #[arg(long, value_name = "JSON")]
    pub file_lines: Option<String>,

    /// Treatment of files not named in --file-lines
    #[arg(long, value_enum, default_value_t = Unlisted::Skip, requires = "file_lines")]
    pub unlisted: Unlisted,

    /// Path to report for standard input
    #[arg(long, value_name = "PATH")]
    pub stdin_name: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Human)]
    pub report: ReportFormat,

    /// Do not show source lines in the report
    #[arg(long)]
    pub no_context: bool,

    /// Language edition (2015, 2018, 2021, 2024)
    #[arg(long)]
    pub edition: Option<Edition>,

    /// When to use colors (auto, always, never)
    #[arg(long, value_name = "WHEN")]
    pub color: Option<Color>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Unlisted {
    /// Leave unlisted files untouched
    Skip,
    /// Format unlisted files in full
    Format,
}

impl From<Unlisted> for UnlistedFiles {
    fn from(value: Unlisted) -> Self {
        match value {
            Unlisted::Skip => UnlistedFiles::Ineligible,
            Unlisted::Format => UnlistedFiles::Eligible,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Human,
    Json,
}

impl From<ReportFormat> for ReportStyle {
    fn from(value: ReportFormat) -> Self {
        match value {
            ReportFormat::Human => ReportStyle::Human,
            ReportFormat::Json => ReportStyle::Json,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{}`", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Command-line options as configuration overrides.
///
/// `--set` pairs are applied first, so dedicated flags win over them.
pub struct Overrides<'a> {
    cli: &'a Cli,
    format: Option<&'a FormatArgs>,
}

impl<'a> Overrides<'a> {
    pub fn new(cli: &'a Cli, format: Option<&'a FormatArgs>) -> Self {
        Self { cli, format }
    }
}

impl CliOptions for Overrides<'_> {
    fn apply_to(&self, overrides: &mut RawOptions) {
        for (key, value) in &self.cli.overrides {
            overrides.insert(key.clone(), value.as_str().into());
        }

        if self.cli.verbose {
            overrides.insert("verbosity".into(), "verbose".into());
        } else if self.cli.quiet {
            overrides.insert("verbosity".into(), "quiet".into());
        }

        let Some(format) = self.format else {
            return;
        };
        let emit = if format.check {
            Some(EmitMode::Check)
        } else {
            format.emit
        };
        if let Some(emit) = emit {
            overrides.insert("emit_mode".into(), emit.as_str().into());
        }
        if let Some(edition) = format.edition {
            overrides.insert("edition".into(), edition.as_str().into());
        }
        if let Some(color) = format.color {
            overrides.insert("color".into(), color.as_str().into());
        }
    }

    fn config_path(&self) -> Option<&Path> {
        self.cli.config.as_deref()
    }
}
