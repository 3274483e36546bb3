/// IDF weighting strategy.
///
/// Implementations must return a strictly positive weight that decreases as
/// the document frequency grows, for a fixed corpus size.
pub trait IDFEngine {
    /// # Arguments
    /// * `doc_num` - コーパスの文書数 (N)
    /// * `doc_freq` - トークンを含む文書数 (df)
    ///
    /// # Returns
    /// * `f64` - IDF weight
    fn idf(doc_num: u64, doc_freq: u64) -> f64;
}

/// デフォルトのIDFエンジン
/// Smoothed idf: `1 + ln((N + 1) / (df + 1))`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIDFEngine;

impl IDFEngine for DefaultIDFEngine {
    #[inline]
    fn idf(doc_num: u64, doc_freq: u64) -> f64 {
        1.0 + ((doc_num as f64 + 1.0) / (doc_freq as f64 + 1.0)).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_value() {
        let idf = DefaultIDFEngine::idf(3, 2);
        assert!((idf - (1.0 + (4.0f64 / 3.0).ln())).abs() < 1e-15);
        assert!((idf - 1.2877).abs() < 1e-4);
    }

    #[test]
    fn positive_and_strictly_decreasing_in_df() {
        let n = 1_000u64;
        let mut prev = f64::INFINITY;
        for df in 1..=n {
            let idf = DefaultIDFEngine::idf(n, df);
            assert!(idf > 0.0, "df={df}");
            assert!(idf < prev, "not decreasing at df={df}");
            prev = idf;
        }
        // df == N still weighs exactly 1
        assert_eq!(DefaultIDFEngine::idf(n, n), 1.0);
    }
}
