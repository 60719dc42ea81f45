// Nearest-past sample resolution over a monotonic timestamp sequence. The
// same step-hold rule is used for driver telemetry and weather: a query
// resolves to the latest sample not after it, clamped to the first sample
// before the sequence starts.

/// Binary-search variant. `ts` must be non-empty and non-decreasing.
pub(crate) fn nearest_past(ts: &[f64], t: f64) -> usize {
    debug_assert!(!ts.is_empty());
    ts.partition_point(|&s| s <= t).saturating_sub(1)
}

/// Cursor variant for queries arriving in increasing time order, advancing
/// in amortized constant time. Produces the same indices as [`nearest_past`].
pub(crate) struct TimeCursor<'a> {
    ts: &'a [f64],
    idx: usize,
}

impl<'a> TimeCursor<'a> {
    /// `ts` must be non-empty and non-decreasing.
    pub(crate) fn new(ts: &'a [f64]) -> Self {
        debug_assert!(!ts.is_empty());
        Self { ts, idx: 0 }
    }

    /// Index of the latest sample with timestamp <= `t`. Queries must be
    /// non-decreasing across calls.
    pub(crate) fn advance_to(&mut self, t: f64) -> usize {
        while self.idx + 1 < self.ts.len() && self.ts[self.idx + 1] <= t {
            self.idx += 1;
        }
        self.idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nearest_past_clamps_before_start() {
        let ts = [1.0, 2.0, 3.0];
        assert_eq!(nearest_past(&ts, 0.5), 0);
    }

    #[test]
    fn test_nearest_past_clamps_after_end() {
        let ts = [1.0, 2.0, 3.0];
        assert_eq!(nearest_past(&ts, 10.0), 2);
    }

    #[test]
    fn test_nearest_past_exact_and_between() {
        let ts = [0.0, 0.1, 0.2, 0.3];
        assert_eq!(nearest_past(&ts, 0.1), 1);
        assert_eq!(nearest_past(&ts, 0.15), 1);
        assert_eq!(nearest_past(&ts, 0.0), 0);
    }

    #[test]
    fn test_cursor_matches_binary_search_on_grid() {
        let ts = [0.0, 0.4, 0.5, 1.1, 2.0];
        let mut cursor = TimeCursor::new(&ts);
        let mut t = -0.2;
        while t < 2.5 {
            assert_eq!(cursor.advance_to(t), nearest_past(&ts, t), "at t={t}");
            t += 0.04;
        }
    }

    proptest! {
        // Invariant: ts[i] <= t < ts[i+1], except when t precedes the first
        // sample (clamped to 0).
        #[test]
        fn prop_nearest_past_brackets_query(
            mut ts in proptest::collection::vec(0.0f64..1000.0, 1..64),
            queries in proptest::collection::vec(-10.0f64..1010.0, 1..64),
        ) {
            ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mut sorted_queries = queries.clone();
            sorted_queries.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let mut cursor = TimeCursor::new(&ts);
            for &t in &sorted_queries {
                let i = nearest_past(&ts, t);
                prop_assert!(i < ts.len());
                if t >= ts[0] {
                    prop_assert!(ts[i] <= t);
                }
                if i + 1 < ts.len() {
                    prop_assert!(t < ts[i + 1]);
                }
                prop_assert_eq!(cursor.advance_to(t), i);
            }
        }
    }
}
