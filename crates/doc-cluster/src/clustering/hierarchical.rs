//! Agglomerative clustering with Ward linkage

use ndarray::Array2;
use tracing::debug;

use super::linalg::squared_distance;
use super::Clustering;
use crate::error::{ClusterError, Result};

/// Bottom-up Ward clustering.
///
/// Starts from singletons and repeatedly merges the pair of clusters whose
/// union grows the within-cluster variance least, using the Lance–Williams
/// update on squared Euclidean distances. Labels are numbered by first
/// appearance in row order.
#[derive(Debug, Clone)]
pub struct WardClustering {
    n_clusters: usize,
}

impl WardClustering {
    pub fn new(n_clusters: usize) -> Self {
        Self { n_clusters }
    }
}

impl Clustering for WardClustering {
    fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<usize>> {
        let n = data.nrows();
        if self.n_clusters == 0 || n < self.n_clusters {
            return Err(ClusterError::algorithm(
                "hierarchical",
                format!("cannot form {} clusters from {} samples", self.n_clusters, n),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ClusterError::algorithm("hierarchical", "input has non-finite values"));
        }

        let mut distance = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = squared_distance(data.row(i), data.row(j));
                distance[[i, j]] = d;
                distance[[j, i]] = d;
            }
        }

        // cluster id -> member rows; `None` once merged away
        let mut members: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();
        let mut active = n;

        while active > self.n_clusters {
            let mut best: Option<(usize, usize, f64)> = None;
            for i in 0..n {
                if members[i].is_none() {
                    continue;
                }
                for j in (i + 1)..n {
                    if members[j].is_none() {
                        continue;
                    }
                    let d = distance[[i, j]];
                    if best.map_or(true, |(_, _, b)| d < b) {
                        best = Some((i, j, d));
                    }
                }
            }

            let (a, b, d_ab) =
                best.ok_or_else(|| ClusterError::algorithm("hierarchical", "no pair left to merge"))?;
            let size_a = members[a].as_ref().map_or(0, Vec::len) as f64;
            let size_b = members[b].as_ref().map_or(0, Vec::len) as f64;

            for k in 0..n {
                if k == a || k == b {
                    continue;
                }
                let Some(size_k) = members[k].as_ref().map(|m| m.len() as f64) else {
                    continue;
                };
                let updated = ((size_a + size_k) * distance[[k, a]]
                    + (size_b + size_k) * distance[[k, b]]
                    - size_k * d_ab)
                    / (size_a + size_b + size_k);
                distance[[k, a]] = updated;
                distance[[a, k]] = updated;
            }

            let absorbed = members[b].take().unwrap_or_default();
            if let Some(target) = members[a].as_mut() {
                target.extend(absorbed);
            }
            active -= 1;
        }

        let mut cluster_of = vec![0usize; n];
        for (id, group) in members.iter().enumerate() {
            if let Some(rows) = group {
                for &row in rows {
                    cluster_of[row] = id;
                }
            }
        }

        let mut renumber: Vec<Option<usize>> = vec![None; n];
        let mut next = 0;
        let labels: Vec<usize> = cluster_of
            .iter()
            .map(|&id| {
                *renumber[id].get_or_insert_with(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect();

        debug!("Ward clustering produced {} clusters", next);
        Ok(labels)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    fn name(&self) -> &'static str {
        "hierarchical"
    }
}
