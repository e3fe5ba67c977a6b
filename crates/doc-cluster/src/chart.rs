//! Visualization data: feature ranking, 2-D projection and elbow curves.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::clustering::linalg::symmetric_eigen;
use crate::clustering::ClusterCountReport;
use crate::error::Result;
use crate::features::FeatureMatrix;
use crate::results::{ClusteringReport, TermWeight};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentPoint {
    pub filename: String,
    pub x: f64,
    pub y: f64,
    pub cluster: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartData {
    /// Terms with the largest summed weight over the corpus.
    pub top_features: Vec<TermWeight>,
    /// Documents projected on the first two principal components, colored by
    /// k-means cluster.
    pub projection: Vec<DocumentPoint>,
    pub cluster_terms: BTreeMap<usize, Vec<TermWeight>>,
    pub elbow: ClusterCountReport,
}

pub fn build_chart_data(
    features: &FeatureMatrix,
    report: &ClusteringReport,
    metrics: &ClusterCountReport,
    top_features: usize,
) -> Result<ChartData> {
    let coordinates = project_2d(features.matrix())?;
    let projection = report
        .documents
        .iter()
        .zip(&report.kmeans)
        .zip(coordinates.outer_iter())
        .map(|((filename, &cluster), point)| DocumentPoint {
            filename: filename.clone(),
            x: point[0],
            y: point[1],
            cluster,
        })
        .collect();

    let cluster_terms = report
        .profiles
        .iter()
        .map(|profile| (profile.cluster, profile.terms.clone()))
        .collect();

    Ok(ChartData {
        top_features: rank_features(features, top_features),
        projection,
        cluster_terms,
        elbow: metrics.clone(),
    })
}

pub fn rank_features(features: &FeatureMatrix, top: usize) -> Vec<TermWeight> {
    let sums = features.column_sums();
    let mut order: Vec<usize> = (0..sums.len()).collect();
    order.sort_by(|&a, &b| sums[b].total_cmp(&sums[a]).then(a.cmp(&b)));
    order
        .into_iter()
        .take(top)
        .map(|j| TermWeight {
            term: features.vocabulary()[j].clone(),
            weight: sums[j],
        })
        .collect()
}

/// PCA onto two components through the centered Gram matrix `Xc Xcᵀ`,
/// which stays small when the vocabulary is much wider than the corpus.
/// Components with no variance come out as zeros.
pub fn project_2d(data: &Array2<f64>) -> Result<Array2<f64>> {
    let n = data.nrows();
    let mut coordinates = Array2::<f64>::zeros((n, 2));
    if n < 2 {
        return Ok(coordinates);
    }

    let Some(mean) = data.mean_axis(Axis(0)) else {
        return Ok(coordinates);
    };
    let centered = data - &mean;
    let gram = centered.dot(&centered.t());
    let (values, vectors) = symmetric_eigen(&gram)?;

    for component in 0..2.min(n) {
        let value = values[component];
        if value <= 1e-12 {
            continue;
        }
        let scale = value.sqrt();
        coordinates
            .column_mut(component)
            .assign(&vectors.column(component).mapv(|v| v * scale));
    }

    debug!("Projected {} documents onto 2 components", n);
    Ok(coordinates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_projection_preserves_separation() {
        let data = array![[1.0, 0.0, 0.0], [0.9, 0.1, 0.0], [0.0, 0.0, 1.0], [0.0, 0.1, 0.9]];
        let coords = project_2d(&data).unwrap();
        assert_eq!(coords.dim(), (4, 2));
        let gap = (coords[[0, 0]] - coords[[2, 0]]).abs();
        let within = (coords[[0, 0]] - coords[[1, 0]]).abs();
        assert!(gap > within);
    }

    #[test]
    fn test_projection_distances_match_input() {
        let data = array![[0.0, 0.0], [3.0, 4.0]];
        let coords = project_2d(&data).unwrap();
        let dx = coords[[0, 0]] - coords[[1, 0]];
        let dy = coords[[0, 1]] - coords[[1, 1]];
        assert!(((dx * dx + dy * dy).sqrt() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_features_by_column_sum() {
        let features = FeatureMatrix::new(
            array![[0.2, 0.9, 0.1], [0.3, 0.5, 0.0]],
            vec!["alpha".into(), "beta".into(), "gamma".into()],
            vec![1.0; 3],
        )
        .unwrap();
        let ranked = rank_features(&features, 2);
        assert_eq!(ranked[0].term, "beta");
        assert_eq!(ranked[1].term, "alpha");
        assert!((ranked[0].weight - 1.4).abs() < 1e-12);
    }
}
