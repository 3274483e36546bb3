use core::cmp::Ordering;

/// Order of the pairs inside an encoded vector: weight descending, then id
/// descending. `total_cmp` makes it a total order even with equal weights.
#[inline(always)]
pub fn weight_desc(a: &(u32, f64), b: &(u32, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0))
}

/// Sort (id, weight) pairs by `(weight, id)` descending.
///
/// Small inputs (the common case for tweets) go through insertion sort,
/// larger ones through the std unstable sort. Both give the same result since
/// ids are unique within a vector.
#[inline(always)]
pub fn sort_by_weight_desc(pairs: &mut [(u32, f64)]) {
    if pairs.len() <= 1 {
        return;
    }
    if pairs.len() <= 32 {
        insertion_sort(pairs);
        return;
    }
    pairs.sort_unstable_by(weight_desc);
}

#[inline(always)]
fn insertion_sort(pairs: &mut [(u32, f64)]) {
    for i in 1..pairs.len() {
        let mut j = i;
        while j > 0 && weight_desc(&pairs[j], &pairs[j - 1]) == Ordering::Less {
            pairs.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// true when the pairs follow `sort_by_weight_desc` order without duplicate ids
pub fn is_weight_desc(pairs: &[(u32, f64)]) -> bool {
    pairs.windows(2).all(|w| weight_desc(&w[0], &w[1]) == Ordering::Less)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// baseline: sort by the tuple key with the std stable sort
    fn baseline(pairs: &[(u32, f64)]) -> Vec<(u32, f64)> {
        let mut out = pairs.to_vec();
        out.sort_by(|a, b| (b.1, b.0).partial_cmp(&(a.1, a.0)).unwrap());
        out
    }

    /// tiny deterministic PRNG (xorshift32)
    struct Rng(u32);
    impl Rng {
        fn new(seed: u32) -> Self { Self(seed) }
        fn next_u32(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }
    }

    #[test]
    fn handles_empty_and_single() {
        let mut empty: Vec<(u32, f64)> = vec![];
        sort_by_weight_desc(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![(42u32, 1.5f64)];
        sort_by_weight_desc(&mut single);
        assert_eq!(single, vec![(42, 1.5)]);
    }

    #[test]
    fn ties_break_on_id_descending() {
        let mut pairs = vec![(0u32, 1.2877), (2, 1.2877), (1, 3.0), (5, 1.2877)];
        sort_by_weight_desc(&mut pairs);
        assert_eq!(pairs, vec![(1, 3.0), (5, 1.2877), (2, 1.2877), (0, 1.2877)]);
        assert!(is_weight_desc(&pairs));
    }

    #[test]
    fn matches_baseline_many_sizes() {
        let mut rng = Rng::new(0x1234_5678);

        for &n in &[0usize, 1, 2, 3, 7, 16, 31, 32, 33, 64, 129, 1024] {
            // unique ids, few distinct weights so ties are frequent
            let mut pairs: Vec<(u32, f64)> = (0..n as u32)
                .map(|id| (id, 1.0 + (rng.next_u32() % 7) as f64 * 0.25))
                .collect();
            // shuffle ids
            for i in (1..pairs.len()).rev() {
                let j = (rng.next_u32() as usize) % (i + 1);
                pairs.swap(i, j);
            }

            let expected = baseline(&pairs);
            sort_by_weight_desc(&mut pairs);
            assert_eq!(pairs, expected, "mismatch at n={n}");
            assert!(is_weight_desc(&pairs));
        }
    }

    #[test]
    fn duplicate_ids_are_not_weight_desc() {
        assert!(!is_weight_desc(&[(3, 1.0), (3, 1.0)]));
        assert!(!is_weight_desc(&[(1, 1.0), (2, 2.0)]));
    }
}
