//! Property tests for the diff engine and line-range merging.

use proptest::prelude::*;
use tsuzufmt_core::file_lines::merge_ranges;
use tsuzufmt_core::{LineRange, ModifiedLines, make_diff};

fn lines() -> impl Strategy<Value = Vec<String>> {
    // A small alphabet makes equal lines, and so interleaved edits, likely.
    prop::collection::vec("[abc]{0,3}", 0..20)
}

fn ranges() -> impl Strategy<Value = Vec<LineRange>> {
    prop::collection::vec((1u32..50, 0u32..10), 0..12).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(start, len)| LineRange::new(start, start + len).unwrap())
            .collect()
    })
}

proptest! {
    #[test]
    fn test_apply_reproduces_formatted(original in lines(), formatted in lines()) {
        let diff = make_diff(&original, &formatted);
        prop_assert_eq!(diff.apply(&original).unwrap(), formatted);
    }

    #[test]
    fn test_equal_input_gives_empty_diff(original in lines()) {
        prop_assert!(make_diff(&original, &original).is_empty());
    }

    #[test]
    fn test_chunks_are_ordered_and_separated(original in lines(), formatted in lines()) {
        let diff = make_diff(&original, &formatted);
        for pair in diff.chunks.windows(2) {
            let end = pair[0].line_number_orig + pair[0].lines_removed;
            prop_assert!(end < pair[1].line_number_orig);
        }
        for chunk in &diff.chunks {
            prop_assert!(chunk.lines_removed > 0 || !chunk.lines.is_empty());
        }
    }

    #[test]
    fn test_text_format_parses_back(original in lines(), formatted in lines()) {
        let diff = make_diff(&original, &formatted);
        let parsed: ModifiedLines = diff.to_string().parse().unwrap();
        prop_assert_eq!(parsed, diff);
    }

    #[test]
    fn test_merge_is_idempotent(input in ranges()) {
        let once = merge_ranges(input);
        prop_assert_eq!(merge_ranges(once.clone()), once.clone());
        for pair in once.windows(2) {
            prop_assert!(pair[0].end() + 1 < pair[1].start());
        }
    }
}
