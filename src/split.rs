use crate::math::ssr_indices;
use crate::RowMajorMatrix;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};

/// Store the result of a successful split on a node
#[derive(Debug)]
pub(crate) struct SplitResult {
    pub(crate) feature_id: usize,
    pub(crate) threshold: f64,
    pub(crate) score: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// True iff every feature is constant over the rows `indices`, ie no threshold can separate two
/// of these rows.
pub(crate) fn all_features_constant(features: &RowMajorMatrix<f64>, indices: &[usize]) -> bool {
    let first = match indices.first() {
        Some(&first) => first,
        None => return true,
    };
    (0..features.n_cols()).all(|feature_id| {
        let val = features[(first, feature_id)];
        indices
            .iter()
            .all(|&row| features[(row, feature_id)] == val)
    })
}

/// Split `indices` between the rows strictly below the threshold and the others.
/// The original order is kept on both sides.
pub(crate) fn partition(
    features: &RowMajorMatrix<f64>,
    indices: &[usize],
    feature_id: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    indices
        .iter()
        .cloned()
        .partition(|&row| features[(row, feature_id)] < threshold)
}

/// Best threshold of a single feature, with its score.
///
/// The candidates are the distinct values of the feature, in order of first occurrence in
/// `indices`. On a tie the first candidate wins.
fn best_threshold(
    features: &RowMajorMatrix<f64>,
    target: &[f64],
    indices: &[usize],
    feature_id: usize,
) -> Option<(f64, f64)> {
    let mut left = Vec::with_capacity(indices.len());
    let mut right = Vec::with_capacity(indices.len());
    let mut best: Option<(f64, f64)> = None;

    let candidates = indices
        .iter()
        .map(|&row| OrderedFloat(features[(row, feature_id)]))
        .unique();
    for threshold in candidates {
        let threshold = threshold.into_inner();
        left.clear();
        right.clear();
        for &row in indices {
            if features[(row, feature_id)] < threshold {
                left.push(row);
            } else {
                right.push(row);
            }
        }

        // Infinite when one side is empty
        let score = ssr_indices(target, &left) + ssr_indices(target, &right);
        if !score.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, best_score)| score < best_score) {
            best = Some((threshold, score));
        }
    }
    best
}

/// Best (feature, threshold, score) over all the features.
fn best_feature(
    features: &RowMajorMatrix<f64>,
    target: &[f64],
    indices: &[usize],
) -> Option<(usize, f64, f64)> {
    let results: Vec<Option<(f64, f64)>> = (0..features.n_cols())
        .into_par_iter()
        .map(|feature_id| best_threshold(features, target, indices, feature_id))
        .collect();

    let mut best: Option<(usize, f64, f64)> = None;
    for (feature_id, result) in results.into_iter().enumerate() {
        if let Some((threshold, score)) = result {
            if best.map_or(true, |(_, _, best_score)| score < best_score) {
                best = Some((feature_id, threshold, score));
            }
        }
    }
    best
}

/// Exhaustive search of the split minimising the sum of squared residuals of both children.
///
/// Features are scored in parallel but reduced in feature order, so on a tie the lowest feature
/// wins, as a sequential scan would give. Returns `None` when no split leaves both sides
/// non-empty.
///
/// When the target is so large that every sum of squares overflows, the search is run again on
/// the target divided by its largest magnitude over `indices`. Scaling by a positive constant
/// keeps the ranking of the candidates, so the selected split is the same.
pub(crate) fn get_best_split(
    features: &RowMajorMatrix<f64>,
    target: &[f64],
    indices: &[usize],
) -> Option<SplitResult> {
    let best = best_feature(features, target, indices).or_else(|| {
        let scale = indices
            .iter()
            .map(|&row| target[row].abs())
            .fold(0., f64::max);
        if !scale.is_finite() || scale <= 0. {
            return None;
        }
        let scaled: Vec<f64> = target.iter().map(|&y| y / scale).collect();
        best_feature(features, &scaled, indices)
            .map(|(feature_id, threshold, score)| (feature_id, threshold, score * scale * scale))
    });

    let (feature_id, threshold, score) = best?;
    let (left_indices, right_indices) = partition(features, indices, feature_id, threshold);
    Some(SplitResult {
        feature_id,
        threshold,
        score,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> RowMajorMatrix<f64> {
        RowMajorMatrix::from_rows(values.iter().map(|&x| vec![x]).collect()).unwrap()
    }

    #[test]
    fn test_step_function() {
        let features = column(&[0., 1., 2., 3.]);
        let target = [0., 0., 10., 10.];
        let split = get_best_split(&features, &target, &[0, 1, 2, 3]).unwrap();
        assert_eq!(split.feature_id, 0);
        assert_eq!(split.threshold, 2.);
        assert_eq!(split.score, 0.);
        assert_eq!(split.left_indices, vec![0, 1]);
        assert_eq!(split.right_indices, vec![2, 3]);
    }

    #[test]
    fn test_tie_on_threshold_keeps_first_occurrence() {
        // Thresholds 3 and 1 both score 6, 3 is seen first
        let features = column(&[3., 2., 1., 0.]);
        let target = [3., 0., 0., 3.];
        let split = get_best_split(&features, &target, &[0, 1, 2, 3]).unwrap();
        assert_eq!(split.score, 6.);
        assert_eq!(split.threshold, 3.);
        assert_eq!(split.left_indices, vec![1, 2, 3]);
        assert_eq!(split.right_indices, vec![0]);
    }

    #[test]
    fn test_tie_on_feature_keeps_lowest_feature() {
        let features =
            RowMajorMatrix::from_rows(vec![vec![0., 0.], vec![1., 1.], vec![0., 2.], vec![1., 3.]])
                .unwrap();
        // Only feature 1 separates the two groups of the target
        let target = [0., 0., 10., 10.];
        let split = get_best_split(&features, &target, &[0, 1, 2, 3]).unwrap();
        assert_eq!(split.feature_id, 1);

        let features = RowMajorMatrix::from_rows(vec![
            vec![0., 0.],
            vec![1., 1.],
            vec![2., 2.],
            vec![3., 3.],
        ])
        .unwrap();
        let split = get_best_split(&features, &target, &[0, 1, 2, 3]).unwrap();
        assert_eq!(split.feature_id, 0);
    }

    #[test]
    fn test_duplicates_are_scored_once() {
        let features = column(&[1., 1., 2., 2., 1.]);
        let target = [0., 1., 5., 6., 2.];
        let split = get_best_split(&features, &target, &[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(split.threshold, 2.);
        assert_eq!(split.left_indices, vec![0, 1, 4]);
        assert_eq!(split.right_indices, vec![2, 3]);
    }

    #[test]
    fn test_subset_only() {
        let features = column(&[0., 1., 2., 3., 4.]);
        let target = [100., 0., 0., 10., 10.];
        let split = get_best_split(&features, &target, &[1, 2, 3, 4]).unwrap();
        assert_eq!(split.threshold, 3.);
        assert_eq!(split.left_indices, vec![1, 2]);
    }

    #[test]
    fn test_no_split_on_constant_features() {
        let features = column(&[4., 4., 4.]);
        assert!(all_features_constant(&features, &[0, 1, 2]));
        assert!(get_best_split(&features, &[1., 2., 3.], &[0, 1, 2]).is_none());

        let features = column(&[4., 4., 5.]);
        assert!(!all_features_constant(&features, &[0, 1, 2]));
        assert!(all_features_constant(&features, &[0, 1]));
        assert!(all_features_constant(&features, &[]));
    }

    #[test]
    fn test_huge_target_still_splits() {
        // Every candidate mixes 0 and 1e200 on one side, so every raw sum of squares overflows
        let features = column(&[0., 1., 2., 3.]);
        let target = [0., 1e200, 0., 1e200];
        let split = get_best_split(&features, &target, &[0, 1, 2, 3]).unwrap();
        // Thresholds 1 and 3 tie on the scaled target, 1 is seen first
        assert_eq!(split.threshold, 1.);
        assert_eq!(split.left_indices, vec![0]);
        assert_eq!(split.right_indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_partition_keeps_order() {
        let features = column(&[5., 1., 4., 2.]);
        let (left, right) = partition(&features, &[3, 2, 1, 0], 0, 4.);
        assert_eq!(left, vec![3, 1]);
        assert_eq!(right, vec![2, 0]);
    }
}
