//! Property-based tests for pulse index assignment

use proptest::prelude::*;
use swimcube::prelude::*;

/// Retention times built from non-negative deltas, some of them large
/// enough to count as gaps
fn retention_times() -> impl Strategy<Value = Vec<f64>> {
    (
        0.0f64..100.0,
        prop::collection::vec(prop_oneof![0.0f64..1.4, 1.6f64..2.4], 0..200),
    )
        .prop_map(|(start, deltas)| {
            let mut rt = start;
            let mut times = vec![rt];
            for delta in deltas {
                rt += delta;
                times.push(rt);
            }
            times
        })
}

proptest! {
    /// Ids start at 1 and strictly increase
    #[test]
    fn test_ids_start_at_one_and_increase(times in retention_times()) {
        let ids = assign_swim_ids(&times, 1.0);
        prop_assert_eq!(ids.len(), times.len());
        prop_assert_eq!(ids[0], 1);
        for pair in ids.windows(2) {
            prop_assert!(pair[1] > pair[0]);
        }
    }

    /// Each step skips at most one pulse, and only after a gap
    #[test]
    fn test_steps_match_gaps(times in retention_times()) {
        let mut indexer = SwimIndexer::new(1.0);
        let assignments: Vec<_> = times.iter().map(|&rt| indexer.assign(rt)).collect();

        let mut skipped = 0;
        for (pair, rts) in assignments.windows(2).zip(times.windows(2)) {
            let step = pair[1].swim_id - pair[0].swim_id;
            prop_assert!(step == 1 || step == 2);
            prop_assert_eq!(step == 2, pair[1].gap_before);
            prop_assert_eq!(pair[1].gap_before, (rts[1] - rts[0]).round() > 1.0);
            if step == 2 {
                skipped += 1;
            }
        }

        prop_assert_eq!(skipped, indexer.gaps_detected());
        prop_assert_eq!(
            indexer.next_swim_id(),
            times.len() + indexer.gaps_detected() + 1
        );
    }

    /// Evenly spaced pulses never produce gaps
    #[test]
    fn test_regular_spacing_has_no_gaps(
        start in 0.0f64..1000.0,
        spacing in 0.0f64..1.4,
        n in 1usize..500,
    ) {
        let times: Vec<f64> = (0..n).map(|i| start + i as f64 * spacing).collect();
        let ids = assign_swim_ids(&times, 1.0);
        prop_assert_eq!(ids, (1..=n).collect::<Vec<_>>());
    }
}
