//! Back-side ordering for duplex printing
//!
//! When the sheet is turned over for the second pass, the cell behind a
//! front cell depends on the edge it was flipped over. Reordering the back
//! sequence page by page makes each back land behind its front.

use crate::types::FlipMode;

/// Reorder a sequence for the back side of the sheet.
///
/// The sequence is processed in page blocks of `cols * rows` items. The last
/// block may be shorter; only the items actually present are reversed.
///
/// * `FlipMode::None` - unchanged
/// * `FlipMode::Short` - each row within a block is reversed
/// * `FlipMode::Long` - each block is reversed as a whole
pub fn duplex_order<T: Clone>(sequence: &[T], mode: FlipMode, cols: usize, rows: usize) -> Vec<T> {
    let cols = cols.max(1);
    let per_page = cols * rows.max(1);

    match mode {
        FlipMode::None => sequence.to_vec(),
        FlipMode::Short => sequence
            .chunks(per_page)
            .flat_map(|page| page.chunks(cols))
            .flat_map(|row| row.iter().rev().cloned())
            .collect(),
        FlipMode::Long => sequence
            .chunks(per_page)
            .flat_map(|page| page.iter().rev().cloned())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_none_is_identity() {
        let seq: Vec<u32> = (1..=12).collect();
        assert_eq!(duplex_order(&seq, FlipMode::None, 3, 3), seq);
    }

    #[test]
    fn test_short_reverses_each_row() {
        let seq: Vec<u32> = (1..=9).collect();
        assert_eq!(
            duplex_order(&seq, FlipMode::Short, 3, 3),
            vec![3, 2, 1, 6, 5, 4, 9, 8, 7]
        );
    }

    #[test]
    fn test_long_reverses_whole_page() {
        let seq: Vec<u32> = (1..=9).collect();
        assert_eq!(
            duplex_order(&seq, FlipMode::Long, 3, 3),
            vec![9, 8, 7, 6, 5, 4, 3, 2, 1]
        );
    }

    #[test]
    fn test_short_partial_last_row() {
        let seq: Vec<u32> = (1..=5).collect();
        assert_eq!(duplex_order(&seq, FlipMode::Short, 3, 3), vec![3, 2, 1, 5, 4]);
    }

    #[test]
    fn test_long_partial_page_stays_within_its_block() {
        let seq: Vec<u32> = (1..=11).collect();
        assert_eq!(
            duplex_order(&seq, FlipMode::Long, 3, 3),
            vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 11, 10]
        );
    }

    #[test]
    fn test_is_a_permutation() {
        let seq: Vec<u32> = (0..23).collect();
        for mode in [FlipMode::None, FlipMode::Short, FlipMode::Long] {
            let mut out = duplex_order(&seq, mode, 3, 3);
            assert_eq!(out.len(), seq.len());
            out.sort();
            assert_eq!(out, seq);
        }
    }

    #[test]
    fn test_other_grid_shapes() {
        // 4 columns, 2 rows per page
        let seq: Vec<u32> = (1..=10).collect();
        assert_eq!(
            duplex_order(&seq, FlipMode::Short, 4, 2),
            vec![4, 3, 2, 1, 8, 7, 6, 5, 10, 9]
        );
    }
}
