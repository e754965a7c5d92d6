//! Human-readable diff output

use std::fmt::Write;

use tsuzufmt_core::{FileName, ModifiedLines};

/// Renders `Diff in NAME at line N:` blocks with `-`/`+` lines.
pub fn render_diff(name: &FileName, source: &str, diff: &ModifiedLines, colors: bool) -> String {
    let original: Vec<&str> = source.lines().collect();
    let mut out = String::new();

    for chunk in &diff.chunks {
        let _ = writeln!(out, "Diff in {} at line {}:", name, chunk.line_number_orig);

        let start = chunk.line_number_orig as usize - 1;
        let end = (start + chunk.lines_removed as usize).min(original.len());
        for line in original.get(start..end).unwrap_or_default() {
            push_line(&mut out, '-', line, colors.then_some("31"));
        }
        for line in &chunk.lines {
            push_line(&mut out, '+', line, colors.then_some("32"));
        }
    }
    out
}

fn push_line(out: &mut String, sign: char, line: &str, color: Option<&str>) {
    match color {
        Some(code) => {
            let _ = writeln!(out, "\x1b[{}m{}{}\x1b[0m", code, sign, line);
        }
        None => {
            let _ = writeln!(out, "{}{}", sign, line);
        }
    }
}
