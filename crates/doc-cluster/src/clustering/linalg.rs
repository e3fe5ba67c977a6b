//! Small dense linear algebra helpers

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{ClusterError, Result};

const MAX_SWEEPS: usize = 100;

/// Squared Euclidean distance between two rows.
pub fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Eigendecomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues in descending order and the matching unit eigenvectors
/// as columns. Fails on non-square or non-finite input, or when the rotations
/// do not converge.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(ClusterError::algorithm("eigen", "matrix is not square"));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(ClusterError::algorithm("eigen", "matrix has non-finite entries"));
    }

    let mut a = matrix.to_owned();
    let mut v = Array2::<f64>::eye(n);
    let scale = a.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    let mut converged = n < 2;
    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off <= 1e-22 * scale {
            converged = true;
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    if !converged {
        return Err(ClusterError::algorithm(
            "eigen",
            format!("Jacobi rotations did not converge in {} sweeps", MAX_SWEEPS),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let values = Array1::from_iter(order.iter().map(|&i| a[[i, i]]));
    let mut vectors = Array2::<f64>::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        // Fix the sign so the largest-magnitude component is positive.
        let column = v.column(src);
        let pivot = column
            .iter()
            .copied()
            .fold(0.0f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
        vectors.column_mut(dst).assign(&column.mapv(|x| x * sign));
    }

    Ok((values, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_diagonal_matrix() {
        let m = array![[1.0, 0.0], [0.0, 3.0]];
        let (values, vectors) = symmetric_eigen(&m).unwrap();
        assert!((values[0] - 3.0).abs() < 1e-12);
        assert!((values[1] - 1.0).abs() < 1e-12);
        assert!((vectors[[1, 0]].abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reconstruction() {
        let m = array![[4.0, 1.0, 2.0], [1.0, 3.0, 0.5], [2.0, 0.5, 5.0]];
        let (values, vectors) = symmetric_eigen(&m).unwrap();
        for i in 0..3 {
            let v = vectors.column(i);
            let mv = m.dot(&v);
            for k in 0..3 {
                assert!((mv[k] - values[i] * v[k]).abs() < 1e-9);
            }
        }
        assert!(values[0] >= values[1] && values[1] >= values[2]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(symmetric_eigen(&Array2::zeros((2, 3))).is_err());
        assert!(symmetric_eigen(&array![[f64::NAN, 0.0], [0.0, 1.0]]).is_err());
    }

    #[test]
    fn test_squared_distance() {
        let a = array![0.0, 3.0];
        let b = array![4.0, 0.0];
        assert_eq!(squared_distance(a.view(), b.view()), 25.0);
    }
}
