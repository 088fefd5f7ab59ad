pub fn sum(v: &[f64]) -> f64 {
    let mut o = 0.;
    for e in v.iter() {
        o += *e;
    }
    o
}

pub fn mean(v: &[f64]) -> f64 {
    sum(&v) / (v.len() as f64)
}

/// Sum of the squared distances to the mean.
pub fn sum_squared_residuals(v: &[f64]) -> f64 {
    let m = mean(v);
    v.iter().map(|&x| (x - m).powi(2)).sum()
}

pub fn rmse(target: &[f64], yhat: &[f64]) -> f64 {
    let rmse: f64 = yhat
        .iter()
        .zip(target.iter())
        .map(|(&a, &b)| (a - b).powi(2))
        .sum();
    (rmse / target.len() as f64).sqrt()
}

pub(crate) fn sum_indices(v: &[f64], indices: &[usize]) -> f64 {
    // A sum over a null set is not possible there, and this catch bugs.
    // The speed difference is negligible
    assert_ne!(indices.len(), 0);
    let mut o = 0.;
    for &i in indices {
        o += v[i];
    }
    o
}

pub(crate) fn mean_indices(v: &[f64], indices: &[usize]) -> f64 {
    sum_indices(v, indices) / (indices.len() as f64)
}

/// Same as `sum_squared_residuals`, on the subset `indices` of `v`.
/// Infinite on an empty subset, so a split leaving a side empty is never chosen.
pub(crate) fn ssr_indices(v: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return std::f64::INFINITY;
    }
    let m = mean_indices(v, indices);
    let mut o = 0.;
    for &i in indices {
        o += (v[i] - m).powi(2);
    }
    o
}
