use num::Float;

/// 二乗ノルム
///
/// # Arguments
/// * `vals` - ベクトルの値
///
/// # Returns
/// * `N` - sum of squares
#[inline]
pub fn norm_sq<N: Float>(vals: &[N]) -> N {
    vals.iter().fold(N::zero(), |acc, &v| acc + v * v)
}

#[inline]
pub fn l2_norm<N: Float>(vals: &[N]) -> N {
    norm_sq(vals).sqrt()
}

/// Divide every value by the L2 norm, in place.
///
/// A zero norm leaves the values untouched and returns `false`.
#[inline]
pub fn l2_normalize<N: Float>(vals: &mut [N]) -> bool {
    let norm = l2_norm(vals);
    if norm == N::zero() {
        return false;
    }
    for v in vals.iter_mut() {
        *v = *v / norm;
    }
    true
}

/// Dot product of a dense lookup with a sparse vector given as (index, value)
#[inline]
pub fn sparse_dot<N, F>(lookup: F, other: impl IntoIterator<Item = (usize, N)>) -> N
where
    N: Float,
    F: Fn(usize) -> Option<N>,
{
    other
        .into_iter()
        .fold(N::zero(), |acc, (idx, w)| acc + lookup(idx).unwrap_or_else(N::zero) * w)
}
