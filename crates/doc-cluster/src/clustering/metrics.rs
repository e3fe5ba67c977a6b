//! Cluster quality measures

use ndarray::Array2;

use super::linalg::squared_distance;
use crate::error::{ClusterError, Result};

/// Sum of squared distances from each point to its assigned centroid.
pub fn inertia(data: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| squared_distance(data.row(i), centroids.row(label)))
        .sum()
}

/// Mean silhouette coefficient over all points, in `[-1, 1]`.
///
/// Points in singleton clusters score 0. Undefined (an error) unless the
/// labelling has between 2 and `n - 1` distinct clusters.
pub fn silhouette_score(data: &Array2<f64>, labels: &[usize]) -> Result<f64> {
    let n = data.nrows();
    if labels.len() != n {
        return Err(ClusterError::algorithm(
            "silhouette",
            format!("{} labels for {} points", labels.len(), n),
        ));
    }

    let n_labels = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut sizes = vec![0usize; n_labels];
    for &label in labels {
        sizes[label] += 1;
    }
    let distinct = sizes.iter().filter(|&&s| s > 0).count();
    if distinct < 2 || distinct > n.saturating_sub(1) {
        return Err(ClusterError::algorithm(
            "silhouette",
            format!("needs 2..={} clusters, got {}", n.saturating_sub(1), distinct),
        ));
    }

    let mut total = 0.0;
    let mut sums = vec![0.0f64; n_labels];
    for i in 0..n {
        sums.iter_mut().for_each(|s| *s = 0.0);
        for j in 0..n {
            if i != j {
                sums[labels[j]] += squared_distance(data.row(i), data.row(j)).sqrt();
            }
        }

        let own = labels[i];
        if sizes[own] <= 1 {
            continue;
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..n_labels)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    let score = total / n as f64;
    if !score.is_finite() {
        return Err(ClusterError::algorithm("silhouette", "score is not finite"));
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_inertia() {
        let data = array![[0.0, 0.0], [2.0, 0.0], [10.0, 10.0]];
        let centroids = array![[1.0, 0.0], [10.0, 10.0]];
        assert!((inertia(&data, &[0, 0, 1], &centroids) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_well_separated_silhouette_is_high() {
        let data = array![[0.0, 0.0], [0.1, 0.0], [10.0, 10.0], [10.1, 10.0]];
        let score = silhouette_score(&data, &[0, 0, 1, 1]).unwrap();
        assert!(score > 0.9);
    }

    #[test]
    fn test_bad_labelling_is_negative() {
        let data = array![[0.0, 0.0], [0.1, 0.0], [10.0, 10.0], [10.1, 10.0]];
        let score = silhouette_score(&data, &[0, 1, 0, 1]).unwrap();
        assert!(score < 0.0);
    }

    #[test]
    fn test_undefined_cases() {
        let data = array![[0.0], [1.0], [2.0]];
        assert!(silhouette_score(&data, &[0, 0, 0]).is_err());
        assert!(silhouette_score(&data, &[0, 1, 2]).is_err());
        assert!(silhouette_score(&data, &[0, 1]).is_err());
    }
}
