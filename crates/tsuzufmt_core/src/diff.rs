//! Line-level diff between original and formatted text.
//!
//! Uses the `similar` crate (Myers diff algorithm) for a minimal edit script,
//! then coalesces adjacent edits into [`ModifiedChunk`]s.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag, capture_diff_slices};

use crate::error::DiffError;

/// A span of changed lines: `lines_removed` original lines starting at
/// `line_number_orig` (1-based) are replaced by `lines`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifiedChunk {
    pub line_number_orig: u32,
    pub lines_removed: u32,
    pub lines: Vec<String>,
}

impl ModifiedChunk {
    /// One past the last original line this chunk covers.
    fn orig_end(&self) -> u32 {
        self.line_number_orig + self.lines_removed
    }
}

/// Ordered, non-adjacent changed chunks of one input. Empty means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifiedLines {
    pub chunks: Vec<ModifiedChunk>,
}

impl ModifiedLines {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn lines_removed(&self) -> usize {
        self.chunks.iter().map(|c| c.lines_removed as usize).sum()
    }

    pub fn lines_added(&self) -> usize {
        self.chunks.iter().map(|c| c.lines.len()).sum()
    }

    /// Applies the chunks to `original`, producing the modified lines.
    pub fn apply<S: AsRef<str>>(&self, original: &[S]) -> Result<Vec<String>, DiffError> {
        let mut result = Vec::with_capacity(original.len() + self.lines_added());
        // 0-based index of the next original line to copy.
        let mut cursor = 0usize;

        for chunk in &self.chunks {
            let start = chunk.line_number_orig as usize;
            if start == 0 || start - 1 < cursor {
                return Err(DiffError::OutOfOrder {
                    line: chunk.line_number_orig,
                    previous_end: cursor as u32,
                });
            }
            let end = start - 1 + chunk.lines_removed as usize;
            if end > original.len() {
                return Err(DiffError::OutOfBounds {
                    line: chunk.line_number_orig,
                    removed: chunk.lines_removed,
                    len: original.len(),
                });
            }

            result.extend(original[cursor..start - 1].iter().map(|l| l.as_ref().to_string()));
            result.extend(chunk.lines.iter().cloned());
            cursor = end;
        }

        result.extend(original[cursor..].iter().map(|l| l.as_ref().to_string()));
        Ok(result)
    }
}

/// Computes the changed chunks turning `original` into `formatted`.
///
/// The output is deterministic for identical inputs.
pub fn make_diff<A, B>(original: &[A], formatted: &[B]) -> ModifiedLines
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let old: Vec<&str> = original.iter().map(AsRef::as_ref).collect();
    let new: Vec<&str> = formatted.iter().map(AsRef::as_ref).collect();

    if old == new {
        return ModifiedLines::default();
    }

    let mut chunks: Vec<ModifiedChunk> = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            continue;
        }

        let line_number_orig = old_range.start as u32 + 1;
        let inserted = new[new_range].iter().map(|l| l.to_string());

        match chunks.last_mut() {
            Some(last) if last.orig_end() == line_number_orig => {
                last.lines_removed += old_range.len() as u32;
                last.lines.extend(inserted);
            }
            _ => chunks.push(ModifiedChunk {
                line_number_orig,
                lines_removed: old_range.len() as u32,
                lines: inserted.collect(),
            }),
        }
    }

    ModifiedLines { chunks }
}

impl fmt::Display for ModifiedLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in &self.chunks {
            writeln!(
                f,
                "{} {} {}",
                chunk.line_number_orig,
                chunk.lines_removed,
                chunk.lines.len()
            )?;
            for line in &chunk.lines {
                writeln!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}

impl FromStr for ModifiedLines {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chunks = Vec::new();
        let mut lines = s.lines().enumerate();

        while let Some((idx, header)) = lines.next() {
            let malformed = |message: &str| DiffError::Malformed {
                line: idx + 1,
                message: message.to_string(),
            };

            let fields: Vec<u32> = header
                .split_whitespace()
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|_| malformed("expected three numbers"))?;
            let [line_number_orig, lines_removed, added] = fields[..] else {
                return Err(malformed("expected three numbers"));
            };

            let mut inserted = Vec::with_capacity(added as usize);
            for _ in 0..added {
                let (_, line) = lines
                    .next()
                    .ok_or_else(|| malformed("chunk ended early"))?;
                inserted.push(line.to_string());
            }

            chunks.push(ModifiedChunk {
                line_number_orig,
                lines_removed,
                lines: inserted,
            });
        }

        Ok(ModifiedLines { chunks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(line: u32, removed: u32, lines: &[&str]) -> ModifiedChunk {
        ModifiedChunk {
            line_number_orig: line,
            lines_removed: removed,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_identical_is_empty() {
        let lines = ["a", "b", "c"];
        assert!(make_diff(&lines, &lines).is_empty());
        let empty: [&str; 0] = [];
        assert!(make_diff(&empty, &empty).is_empty());
    }

    #[test]
    fn test_single_replacement() {
        let diff = make_diff(&["a", "b", "c"], &["a", "B", "c"]);
        assert_eq!(diff.chunks, vec![chunk(2, 1, &["B"])]);
    }

    #[test]
    fn test_adjacent_edits_coalesce() {
        let diff = make_diff(&["a", "b", "c", "d"], &["a", "x", "y", "z", "d"]);
        assert_eq!(diff.chunks, vec![chunk(2, 2, &["x", "y", "z"])]);
    }

    #[test]
    fn test_separate_chunks() {
        let diff = make_diff(&["a", "b", "c", "d", "e"], &["A", "b", "c", "d", "E"]);
        assert_eq!(diff.chunks, vec![chunk(1, 1, &["A"]), chunk(5, 1, &["E"])]);
    }

    #[test]
    fn test_insertion_and_deletion() {
        let insert = make_diff(&["a", "c"], &["a", "b", "c"]);
        assert_eq!(insert.chunks, vec![chunk(2, 0, &["b"])]);

        let append = make_diff(&["a"], &["a", "b"]);
        assert_eq!(append.chunks, vec![chunk(2, 0, &["b"])]);

        let delete = make_diff(&["a", "b", "c"], &["a", "c"]);
        assert_eq!(delete.chunks, vec![chunk(2, 1, &[])]);
    }

    #[test]
    fn test_no_chunks_adjacent() {
        let original = ["1", "2", "3", "4", "5", "6", "7"];
        let formatted = ["1", "x", "3", "y", "z", "6", "7", "8"];
        let diff = make_diff(&original, &formatted);
        for pair in diff.chunks.windows(2) {
            assert!(pair[0].orig_end() < pair[1].line_number_orig);
        }
        assert_eq!(diff.apply(&original).unwrap(), formatted);
    }

    #[test]
    fn test_apply_round_trip() {
        let original = ["fn main() {", "let x=1;", "", "", "}"];
        let formatted = ["fn main() {", "    let x = 1;", "}"];
        let diff = make_diff(&original, &formatted);
        assert_eq!(diff.apply(&original).unwrap(), formatted);
    }

    #[test]
    fn test_deterministic() {
        let original = ["a", "b", "a", "b", "c"];
        let formatted = ["b", "a", "c", "a", "b"];
        assert_eq!(make_diff(&original, &formatted), make_diff(&original, &formatted));
    }

    #[test]
    fn test_apply_rejects_out_of_order() {
        let diff = ModifiedLines {
            chunks: vec![chunk(3, 2, &["x"]), chunk(4, 0, &["y"])],
        };
        assert!(matches!(
            diff.apply(&["a", "b", "c", "d", "e"]),
            Err(DiffError::OutOfOrder { line: 4, .. })
        ));
    }

    #[test]
    fn test_apply_rejects_out_of_bounds() {
        let diff = ModifiedLines {
            chunks: vec![chunk(2, 5, &[])],
        };
        assert!(matches!(
            diff.apply(&["a", "b"]),
            Err(DiffError::OutOfBounds { line: 2, removed: 5, len: 2 })
        ));
    }

    #[test]
    fn test_display_format() {
        let diff = make_diff(&["a", "b", "c"], &["a", "B", "C", "D"]);
        insta::assert_snapshot!(diff.to_string().trim_end(), @r"
        2 2 3
        B
        C
        D
        ");
    }

    #[test]
    fn test_parse_display_output() {
        let diff = ModifiedLines {
            chunks: vec![chunk(1, 0, &["first", ""]), chunk(4, 2, &[])],
        };
        let parsed: ModifiedLines = diff.to_string().parse().unwrap();
        assert_eq!(parsed, diff);
    }

    #[test]
    fn test_parse_rejects_truncated() {
        let err = "3 1 2\nonly one\n".parse::<ModifiedLines>().unwrap_err();
        assert!(matches!(err, DiffError::Malformed { line: 1, .. }));

        let err = "3 x 2\n".parse::<ModifiedLines>().unwrap_err();
        assert!(matches!(err, DiffError::Malformed { .. }));
    }
}
