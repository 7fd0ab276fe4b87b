use imerge_grid::SubBlock;
use imerge_frontier::normalize;
use proptest::prelude::*;

fn arb_block() -> impl Strategy<Value = SubBlock> {
    (0usize..8, 0usize..8, 0usize..6, 0usize..6).prop_map(|(start1, start2, len1, len2)| SubBlock {
        start1,
        start2,
        len1,
        len2,
    })
}

proptest! {
    /// Whatever list of candidate rectangles comes in, `normalize` never
    /// leaves one block containing another: every survivor is maximal.
    #[test]
    fn normalize_result_has_no_containment(blocks in prop::collection::vec(arb_block(), 0..12)) {
        let normalized = normalize(blocks);
        for (i, a) in normalized.iter().enumerate() {
            for (j, b) in normalized.iter().enumerate() {
                if i != j {
                    prop_assert!(!a.contains(b) || a == b);
                }
            }
        }
    }

    /// Normalizing is idempotent: the output is already in normal form.
    #[test]
    fn normalize_is_idempotent(blocks in prop::collection::vec(arb_block(), 0..12)) {
        let once = normalize(blocks);
        let twice = normalize(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// No empty rectangle ever survives normalization.
    #[test]
    fn normalize_drops_all_empty_blocks(blocks in prop::collection::vec(arb_block(), 0..12)) {
        let normalized = normalize(blocks);
        prop_assert!(normalized.iter().all(|b| b.len1 > 0 && b.len2 > 0));
    }
}
