//! Seeded k-means with k-means++ initialization and multiple restarts

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use super::linalg::squared_distance;
use super::metrics::inertia;
use super::Clustering;
use crate::error::{ClusterError, Result};

#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Base seed; restart `r` uses `seed + r`.
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold on the summed squared centroid shift, relative
    /// to the mean per-feature variance of the data.
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
        }
    }
}

/// Fitted k-means state from the best restart.
#[derive(Debug, Clone)]
pub struct KMeansModel {
    pub labels: Vec<usize>,
    pub centroids: Array2<f64>,
    pub inertia: f64,
    pub n_iter: usize,
}

#[derive(Debug, Clone)]
pub struct KMeans {
    n_clusters: usize,
    config: KMeansConfig,
}

impl KMeans {
    pub fn new(n_clusters: usize, config: KMeansConfig) -> Self {
        Self { n_clusters, config }
    }

    /// Run `n_init` seeded restarts and keep the one with the lowest inertia.
    ///
    /// Restarts run in parallel but are compared in restart order, so the
    /// result only depends on the seed.
    pub fn fit(&self, data: &Array2<f64>) -> Result<KMeansModel> {
        let n = data.nrows();
        if self.n_clusters == 0 {
            return Err(ClusterError::algorithm("kmeans", "n_clusters must be at least 1"));
        }
        if n < self.n_clusters {
            return Err(ClusterError::algorithm(
                "kmeans",
                format!("{} samples is fewer than {} clusters", n, self.n_clusters),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ClusterError::algorithm("kmeans", "input has non-finite values"));
        }

        let threshold = self.config.tolerance * mean_variance(data);
        let restarts: Vec<KMeansModel> = (0..self.config.n_init.max(1))
            .into_par_iter()
            .map(|restart| self.run_once(data, self.config.seed.wrapping_add(restart as u64), threshold))
            .collect();

        let mut best: Option<KMeansModel> = None;
        for model in restarts {
            match &best {
                Some(current) if current.inertia <= model.inertia => {}
                _ => best = Some(model),
            }
        }

        let best = best.ok_or_else(|| ClusterError::algorithm("kmeans", "no restart completed"))?;
        debug!(
            "k-means k={}: inertia {:.6} after {} iterations",
            self.n_clusters, best.inertia, best.n_iter
        );
        Ok(best)
    }

    fn run_once(&self, data: &Array2<f64>, seed: u64, threshold: f64) -> KMeansModel {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = plus_plus_init(data, self.n_clusters, &mut rng);
        let mut labels = assign(data, &centroids);
        let mut n_iter = 0;

        for iteration in 1..=self.config.max_iter {
            n_iter = iteration;
            let updated = update_centroids(data, &labels, &centroids);
            let shift: f64 = centroids
                .outer_iter()
                .zip(updated.outer_iter())
                .map(|(old, new)| squared_distance(old, new))
                .sum();
            centroids = updated;
            labels = assign(data, &centroids);
            if shift <= threshold {
                break;
            }
        }

        let inertia = inertia(data, &labels, &centroids);
        KMeansModel {
            labels,
            centroids,
            inertia,
            n_iter,
        }
    }
}

impl Clustering for KMeans {
    fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<usize>> {
        self.fit(data).map(|model| model.labels)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    fn name(&self) -> &'static str {
        "kmeans"
    }
}

fn mean_variance(data: &Array2<f64>) -> f64 {
    if data.nrows() == 0 || data.ncols() == 0 {
        return 0.0;
    }
    data.var_axis(Axis(0), 0.0).mean().unwrap_or(0.0)
}

/// k-means++: each next centroid is drawn with probability proportional to
/// its squared distance from the nearest centroid chosen so far.
fn plus_plus_init(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut closest: Vec<f64> = data
        .outer_iter()
        .map(|row| squared_distance(row, centroids.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut pick = n - 1;
            for (i, &d) in closest.iter().enumerate() {
                if target < d {
                    pick = i;
                    break;
                }
                target -= d;
            }
            pick
        } else {
            // all remaining points coincide with a centroid
            rng.gen_range(0..n)
        };

        centroids.row_mut(c).assign(&data.row(chosen));
        for (i, row) in data.outer_iter().enumerate() {
            let d = squared_distance(row, centroids.row(c));
            if d < closest[i] {
                closest[i] = d;
            }
        }
    }
    centroids
}

/// Nearest centroid per row; ties go to the lower centroid index.
fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.outer_iter()
        .map(|row| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (c, centroid) in centroids.outer_iter().enumerate() {
                let d = squared_distance(row, centroid);
                if d < best_distance {
                    best_distance = d;
                    best = c;
                }
            }
            best
        })
        .collect()
}

fn update_centroids(data: &Array2<f64>, labels: &[usize], previous: &Array2<f64>) -> Array2<f64> {
    let k = previous.nrows();
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; k];
    for (row, &label) in data.outer_iter().zip(labels) {
        let mut target = sums.row_mut(label);
        target += &row;
        counts[label] += 1;
    }

    // Points farthest from their centroid, used to re-seed empty clusters.
    let mut far: Vec<(usize, f64)> = data
        .outer_iter()
        .zip(labels)
        .enumerate()
        .map(|(i, (row, &label))| (i, squared_distance(row, previous.row(label))))
        .collect();
    far.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut donors = far.into_iter().map(|(i, _)| i);

    for c in 0..k {
        if counts[c] > 0 {
            let count = counts[c] as f64;
            sums.row_mut(c).mapv_inplace(|v| v / count);
        } else if let Some(i) = donors.next() {
            sums.row_mut(c).assign(&data.row(i));
        } else {
            sums.row_mut(c).assign(&previous.row(c));
        }
    }
    sums
}
