//! Spectral co-clustering of documents and terms.
//!
//! The matrix is scaled to `An = R^-1/2 A C^-1/2` (row and column sums on the
//! diagonals of `R` and `C`). Left singular vectors of `An` come from the
//! eigendecomposition of `An Anᵀ`; the matching right vectors are
//! `Anᵀ u / σ`. The leading pair is trivial and skipped. Rows and columns are
//! then embedded together as `[R^-1/2 U ; C^-1/2 V]` and split by k-means, so
//! every cluster is a block of documents plus the terms that characterize them.

use ndarray::{concatenate, Array1, Array2, Axis};
use tracing::debug;

use super::kmeans::{KMeans, KMeansConfig};
use super::linalg::symmetric_eigen;
use super::Clustering;
use crate::error::{ClusterError, Result};

/// Eigenvalues of `An Anᵀ` below this (relative to the leading one) count as zero.
const RANK_EPS: f64 = 1e-10;

/// Document and term labels produced by one co-clustering run.
#[derive(Debug, Clone)]
pub struct CoclusterModel {
    pub row_labels: Vec<usize>,
    pub column_labels: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct SpectralCoclustering {
    n_clusters: usize,
    kmeans: KMeansConfig,
}

impl SpectralCoclustering {
    pub fn new(n_clusters: usize, kmeans: KMeansConfig) -> Self {
        Self { n_clusters, kmeans }
    }

    /// Number of singular vectors computed, the trivial leading one included.
    fn n_singular_vectors(&self) -> usize {
        let k = self.n_clusters.max(1);
        1 + (usize::BITS - (k - 1).leading_zeros()) as usize
    }

    pub fn fit(&self, data: &Array2<f64>) -> Result<CoclusterModel> {
        let (n, m) = data.dim();
        if self.n_clusters == 0 {
            return Err(ClusterError::algorithm("biclustering", "n_clusters must be at least 1"));
        }
        if n < self.n_clusters {
            return Err(ClusterError::algorithm(
                "biclustering",
                format!("{} documents is fewer than {} clusters", n, self.n_clusters),
            ));
        }
        if data.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ClusterError::algorithm(
                "biclustering",
                "matrix must be finite and non-negative",
            ));
        }

        let n_sv = self.n_singular_vectors();
        if n_sv > n.min(m) {
            return Err(ClusterError::algorithm(
                "biclustering",
                format!("need {} singular vectors but the matrix is {}x{}", n_sv, n, m),
            ));
        }

        let row_scale = inverse_sqrt(data.sum_axis(Axis(1)));
        let col_scale = inverse_sqrt(data.sum_axis(Axis(0)));

        let mut normalized = data.to_owned();
        for ((i, j), value) in normalized.indexed_iter_mut() {
            *value *= row_scale[i] * col_scale[j];
        }

        let gram = normalized.dot(&normalized.t());
        let (values, vectors) = symmetric_eigen(&gram)?;

        let l = n_sv - 1;
        let mut u = Array2::<f64>::zeros((n, l));
        let mut v = Array2::<f64>::zeros((m, l));
        for idx in 0..l {
            let eigenvalue = values[idx + 1];
            if eigenvalue <= RANK_EPS * values[0].max(1.0) {
                return Err(ClusterError::algorithm(
                    "biclustering",
                    format!("matrix is rank deficient (singular value {} is zero)", idx + 2),
                ));
            }
            let sigma = eigenvalue.sqrt();
            let left = vectors.column(idx + 1);
            let right = normalized.t().dot(&left) / sigma;
            u.column_mut(idx).assign(&left);
            v.column_mut(idx).assign(&right);
        }

        for (i, mut row) in u.outer_iter_mut().enumerate() {
            row *= row_scale[i];
        }
        for (j, mut row) in v.outer_iter_mut().enumerate() {
            row *= col_scale[j];
        }

        let embedding = concatenate![Axis(0), u, v];
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(ClusterError::algorithm("biclustering", "embedding has non-finite values"));
        }

        let labels = KMeans::new(self.n_clusters, self.kmeans.clone())
            .fit(&embedding)?
            .labels;
        debug!(
            "Co-clustering embedded {} documents and {} terms in {} dimensions",
            n, m, l
        );

        Ok(CoclusterModel {
            row_labels: labels[..n].to_vec(),
            column_labels: labels[n..].to_vec(),
        })
    }
}

impl Clustering for SpectralCoclustering {
    fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<usize>> {
        self.fit(data).map(|model| model.row_labels)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    fn name(&self) -> &'static str {
        "biclustering"
    }
}

/// `1/sqrt(x)`, with empty rows or columns mapped to zero.
fn inverse_sqrt(sums: Array1<f64>) -> Array1<f64> {
    sums.mapv(|x| if x > 0.0 { 1.0 / x.sqrt() } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn block_matrix() -> Array2<f64> {
        array![
            [1.0, 0.9, 0.0, 0.0],
            [0.8, 1.0, 0.1, 0.0],
            [0.0, 0.0, 1.0, 0.9],
            [0.0, 0.1, 0.9, 1.0],
        ]
    }

    #[test]
    fn test_recovers_blocks() {
        let model = SpectralCoclustering::new(2, KMeansConfig::default())
            .fit(&block_matrix())
            .unwrap();
        let rows = &model.row_labels;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], rows[1]);
        assert_eq!(rows[2], rows[3]);
        assert_ne!(rows[0], rows[2]);

        let cols = &model.column_labels;
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[0], rows[0]);
        assert_eq!(cols[3], rows[2]);
    }

    #[test]
    fn test_singular_vector_count() {
        let cfg = KMeansConfig::default();
        assert_eq!(SpectralCoclustering::new(2, cfg.clone()).n_singular_vectors(), 2);
        assert_eq!(SpectralCoclustering::new(3, cfg.clone()).n_singular_vectors(), 3);
        assert_eq!(SpectralCoclustering::new(4, cfg.clone()).n_singular_vectors(), 3);
        assert_eq!(SpectralCoclustering::new(5, cfg).n_singular_vectors(), 4);
    }

    #[test]
    fn test_fewer_documents_than_clusters_is_an_error() {
        let data = array![[1.0, 0.0], [0.0, 1.0]];
        let err = SpectralCoclustering::new(3, KMeansConfig::default())
            .fit(&data)
            .unwrap_err();
        assert!(matches!(err, ClusterError::Algorithm { algorithm: "biclustering", .. }));
    }

    #[test]
    fn test_rank_deficient_matrix_is_an_error() {
        let data = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        assert!(SpectralCoclustering::new(2, KMeansConfig::default()).fit(&data).is_err());
    }
}
