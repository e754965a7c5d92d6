//! Line-range restriction of formatting.
//!
//! A [`FileLines`] value says which lines of which files may be changed. Ranges
//! for a file are kept merged and sorted so membership is a binary search.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::input::FileName;

/// An inclusive range of 1-based line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineRange {
    start: u32,
    end: u32,
}

impl LineRange {
    /// Creates a range, rejecting zero lines and reversed bounds.
    pub fn new(start: u32, end: u32) -> Result<Self, ValidationError> {
        if start == 0 {
            return Err(ValidationError::NonPositiveLine { line: 0 });
        }
        if end == 0 {
            return Err(ValidationError::NonPositiveLine { line: 0 });
        }
        if start > end {
            return Err(ValidationError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    #[inline]
    pub const fn start(&self) -> u32 {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Returns true if `line` lies inside the range.
    #[inline]
    pub const fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }

    /// Whether `next` (which must not start before `self`) overlaps or touches this range.
    #[inline]
    fn adjoins(&self, next: &LineRange) -> bool {
        self.end.saturating_add(1) >= next.start
    }
}

/// What happens to files that have no entry in a restricted [`FileLines`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlistedFiles {
    /// Unlisted files are left untouched.
    #[default]
    Ineligible,
    /// Unlisted files are formatted in full.
    Eligible,
}

/// The set of lines, per file, that formatting may touch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileLines {
    /// `None` means no restriction is active.
    ranges: Option<BTreeMap<FileName, Vec<LineRange>>>,
    unlisted: UnlistedFiles,
}

#[derive(Deserialize)]
struct JsonSpan {
    file: String,
    range: [i64; 2],
}

impl FileLines {
    /// No restriction: every line of every file is eligible.
    pub fn all() -> Self {
        Self {
            ranges: None,
            unlisted: UnlistedFiles::Eligible,
        }
    }

    /// Builds a restriction from `(file, start, end)` triples.
    ///
    /// Every triple is validated before any merging happens.
    pub fn from_ranges<I>(triples: I, unlisted: UnlistedFiles) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (FileName, u32, u32)>,
    {
        let mut map: BTreeMap<FileName, Vec<LineRange>> = BTreeMap::new();
        for (file, start, end) in triples {
            let range = LineRange::new(start, end)?;
            map.entry(file).or_default().push(range);
        }
        Ok(Self::from_map(map, unlisted))
    }

    /// Builds a restriction from per-file range lists.
    ///
    /// A file mapped to an empty list has no eligible lines. Paths are keyed by
    /// [`FileName::normalized`], so `./a.src` and `a.src` share one entry.
    pub fn from_map(map: BTreeMap<FileName, Vec<LineRange>>, unlisted: UnlistedFiles) -> Self {
        let mut normalized: BTreeMap<FileName, Vec<LineRange>> = BTreeMap::new();
        for (file, ranges) in map {
            normalized
                .entry(file.normalized())
                .or_default()
                .extend(ranges);
        }
        let ranges = normalized
            .into_iter()
            .map(|(file, ranges)| (file, merge_ranges(ranges)))
            .collect();
        Self {
            ranges: Some(ranges),
            unlisted,
        }
    }

    /// Parses `[{"file": "lib.rs", "range": [7, 13]}, ...]`.
    ///
    /// The file name `stdin` refers to standard input.
    pub fn from_json(json: &str, unlisted: UnlistedFiles) -> Result<Self, ValidationError> {
        let spans: Vec<JsonSpan> =
            serde_json::from_str(json).map_err(|e| ValidationError::Json(e.to_string()))?;

        let mut triples = Vec::with_capacity(spans.len());
        for span in spans {
            let [start, end] = span.range;
            let start = positive_line(start)?;
            let end = positive_line(end)?;
            triples.push((FileName::from_label(&span.file), start, end));
        }
        Self::from_ranges(triples, unlisted)
    }

    /// Returns true if no restriction is active.
    pub fn is_all(&self) -> bool {
        self.ranges.is_none()
    }

    /// Policy for files without an entry.
    pub fn unlisted(&self) -> UnlistedFiles {
        self.unlisted
    }

    /// Merged ranges for `file`, if it has an entry.
    pub fn ranges_for(&self, file: &FileName) -> Option<&[LineRange]> {
        self.ranges
            .as_ref()?
            .get(&file.normalized())
            .map(Vec::as_slice)
    }

    /// Files with an explicit entry, as normalized paths.
    pub fn files(&self) -> impl Iterator<Item = &FileName> {
        self.ranges.iter().flat_map(|map| map.keys())
    }

    /// Resolves the eligible lines of `file` once, for repeated queries.
    pub fn lines_for(&self, file: &FileName) -> EligibleLines<'_> {
        let Some(map) = &self.ranges else {
            return EligibleLines::All;
        };
        match map.get(&file.normalized()) {
            Some(ranges) => EligibleLines::Ranges(ranges),
            None if self.unlisted == UnlistedFiles::Eligible => EligibleLines::All,
            None => EligibleLines::Ranges(&[]),
        }
    }

    /// Returns true if `line` of `file` may be changed.
    pub fn contains_line(&self, file: &FileName, line: u32) -> bool {
        self.lines_for(file).contains(line)
    }

    /// Returns true if `line` of `file` must be left byte-identical.
    pub fn restricts(&self, file: &FileName, line: u32) -> bool {
        !self.contains_line(file, line)
    }

    /// Returns true if every line of `file` is eligible.
    pub fn is_fully_eligible(&self, file: &FileName) -> bool {
        self.lines_for(file).is_all()
    }

    /// Returns true if at least one line of `file` may be eligible.
    pub fn has_eligible_lines(&self, file: &FileName) -> bool {
        !self.lines_for(file).is_empty()
    }
}

/// The eligible lines of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibleLines<'a> {
    /// Every line may change.
    All,
    /// Only lines inside these merged ranges may change.
    Ranges(&'a [LineRange]),
}

impl EligibleLines<'_> {
    /// Returns true if `line` may be changed.
    pub fn contains(&self, line: u32) -> bool {
        match self {
            EligibleLines::All => true,
            EligibleLines::Ranges(ranges) => ranges
                .binary_search_by(|range| {
                    if range.end < line {
                        Ordering::Less
                    } else if range.start > line {
                        Ordering::Greater
                    } else {
                        Ordering::Equal
                    }
                })
                .is_ok(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, EligibleLines::All)
    }

    /// Returns true if no line may be changed.
    pub fn is_empty(&self) -> bool {
        matches!(self, EligibleLines::Ranges(ranges) if ranges.is_empty())
    }
}

fn positive_line(line: i64) -> Result<u32, ValidationError> {
    if line <= 0 {
        return Err(ValidationError::NonPositiveLine { line });
    }
    u32::try_from(line).map_err(|_| ValidationError::Json(format!("line {} is too large", line)))
}

/// Sorts ranges and merges every pair where `end1 + 1 >= start2`.
pub fn merge_ranges(mut ranges: Vec<LineRange>) -> Vec<LineRange> {
    ranges.sort_unstable();

    let mut merged: Vec<LineRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.adjoins(&range) => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}
