//! A line-oriented renderer for brace-delimited source text.
//!
//! It does not parse a grammar. It checks that delimiters balance, then
//! normalizes indentation, trailing whitespace and blank lines.

use std::iter;

use unicode_segmentation::UnicodeSegmentation;

use super::{RenderOutput, Renderer};
use crate::config::Config;
use crate::error::RenderError;
use crate::input::FileName;
use crate::report::{Diagnostic, DiagnosticKind, Position, Severity, Span};

const FEATURE_ATTR: &str = "#![feature";

/// Whitespace-normalizing renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl PlainTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for PlainTextRenderer {
    fn render(
        &self,
        name: &FileName,
        source: &str,
        config: &Config,
    ) -> Result<RenderOutput, RenderError> {
        check_delimiters(source)?;

        let mut diagnostics = Vec::new();
        // (original line number, formatted line)
        let mut kept: Vec<(u32, String)> = Vec::new();
        let mut blank_run = 0usize;

        for (idx, line) in source.lines().enumerate() {
            let line_no = idx as u32 + 1;

            if !config.unstable_features()
                && let Some(diag) = feature_gate(name, line_no, line)
            {
                diagnostics.push(diag);
            }

            let formatted = reindent(line, config);
            if formatted.is_empty() {
                blank_run += 1;
                if kept.is_empty() || blank_run > config.blank_lines_upper_bound() {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            kept.push((line_no, formatted));
        }

        while kept.last().is_some_and(|(_, line)| line.is_empty()) {
            kept.pop();
        }

        for (line_no, line) in &kept {
            if let Some(diag) = overflow(name, *line_no, line, config) {
                diagnostics.push(diag);
            }
        }

        let mut text = kept
            .iter()
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            text.push('\n');
        }

        Ok(RenderOutput::new(text).with_diagnostics(diagnostics))
    }
}

/// Rewrites leading whitespace per `hard_tabs`/`tab_spaces` and trims the end.
fn reindent(line: &str, config: &Config) -> String {
    let tab_spaces = config.tab_spaces().max(1);
    let content = line.trim_start_matches([' ', '\t']).trim_end();
    if content.is_empty() {
        return String::new();
    }

    let indent = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
    let width: usize = indent
        .chars()
        .map(|c| if c == '\t' { tab_spaces } else { 1 })
        .sum();

    let mut out = String::with_capacity(width + content.len());
    if config.hard_tabs() {
        out.extend(iter::repeat_n('\t', width / tab_spaces));
        out.extend(iter::repeat_n(' ', width % tab_spaces));
    } else {
        out.extend(iter::repeat_n(' ', width));
    }
    out.push_str(content);
    out
}

fn feature_gate(name: &FileName, line_no: u32, line: &str) -> Option<Diagnostic> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with(FEATURE_ATTR) {
        return None;
    }

    let start = (line.chars().count() - trimmed.chars().count()) as u32 + 1;
    let end = start + trimmed.trim_end().chars().count() as u32 - 1;
    Some(Diagnostic::error(
        name.clone(),
        DiagnosticKind::FeatureGate,
        Span::columns(line_no, start, end),
        "`#![feature]` may not be used unless `unstable_features` is enabled",
    ))
}

/// Reports `line` (a formatted line) when it is wider than `max_width`.
///
/// The span is in characters of `line`, which is attached as the snippet.
fn overflow(name: &FileName, line_no: u32, line: &str, config: &Config) -> Option<Diagnostic> {
    let max_width = config.max_width();
    let tab_spaces = config.tab_spaces();

    let mut width = 0usize;
    let mut chars = 0usize;
    let mut first_over = None;
    for grapheme in line.graphemes(true) {
        width += if grapheme == "\t" { tab_spaces } else { 1 };
        if first_over.is_none() && width > max_width {
            first_over = Some(chars + 1);
        }
        chars += grapheme.chars().count();
    }
    let start = first_over?;

    let severity = if config.error_on_line_overflow() {
        Severity::Error
    } else {
        Severity::Warning
    };
    Some(
        Diagnostic::error(
            name.clone(),
            DiagnosticKind::LineOverflow,
            Span::columns(line_no, start as u32, chars as u32),
            format!("line exceeds maximum width ({} > {})", width, max_width),
        )
        .with_severity(severity)
        .with_snippet(line),
    )
}

/// Verifies `()`, `[]` and `{}` nest properly outside strings and line comments.
fn check_delimiters(source: &str) -> Result<(), RenderError> {
    let mut stack: Vec<(char, Position)> = Vec::new();
    let mut open_string: Option<Position> = None;

    for (idx, line) in source.lines().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            let pos = Position::new(idx as u32 + 1, i as u32 + 1);

            if open_string.is_some() {
                match ch {
                    '\\' => i += 1,
                    '"' => open_string = None,
                    _ => {}
                }
                i += 1;
                continue;
            }

            match ch {
                '"' => open_string = Some(pos),
                '/' if chars.get(i + 1) == Some(&'/') => break,
                '\'' => {
                    if let Some(len) = char_literal_len(&chars[i..]) {
                        i += len;
                        continue;
                    }
                }
                '(' | '[' | '{' => stack.push((ch, pos)),
                ')' | ']' | '}' => match stack.pop() {
                    Some((open, _)) if closer(open) == ch => {}
                    Some((open, _)) => {
                        return Err(RenderError::parse(
                            pos,
                            format!(
                                "mismatched closing delimiter `{}`, expected `{}`",
                                ch,
                                closer(open)
                            ),
                        ));
                    }
                    None => {
                        return Err(RenderError::parse(
                            pos,
                            format!("unexpected closing delimiter `{}`", ch),
                        ));
                    }
                },
                _ => {}
            }
            i += 1;
        }
    }

    if let Some(pos) = open_string {
        return Err(RenderError::parse(pos, "unterminated string literal"));
    }
    if let Some((open, pos)) = stack.pop() {
        return Err(RenderError::parse(pos, format!("unclosed delimiter `{}`", open)));
    }
    Ok(())
}

fn closer(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Length of a character literal such as `'x'` or `'\n'` at the start of `rest`.
fn char_literal_len(rest: &[char]) -> Option<usize> {
    match rest {
        ['\'', '\\', _, '\'', ..] => Some(4),
        ['\'', c, '\'', ..] if *c != '\\' => Some(3),
        _ => None,
    }
}
