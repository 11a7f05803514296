use nalgebra::{DMatrix, SymmetricEigen};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::SvdConfig;
use crate::error::{PipelineError, Result};
use crate::reduce::{ensure_finite, DimensionReducer, Embedding};
use crate::utils::datastruct::matrix::CscMatrix;

/// Randomized truncated SVD.
///
/// For `A` (tokens x documents) it returns `V_k * S_k`, the document
/// coordinates of the rank-`k` approximation. `A` is only touched through
/// sparse products, never densified.
///
/// 1. `Y = A * Omega` with a seeded random `Omega` (documents x (k + oversample))
/// 2. `Q = qr(Y)`, refined by `power_iterations` rounds of `Q = qr(A * A^T * Q)`
/// 3. `Z = A^T * Q`, eigen decomposition of `Z^T * Z = W L W^T`
/// 4. coordinates `Z * W_k`, singular values `sqrt(L_k)`
#[derive(Debug, Clone, PartialEq)]
pub struct TruncatedSvd {
    pub rank: usize,
    pub oversample: usize,
    pub power_iterations: usize,
    pub seed: u64,
}

impl Default for TruncatedSvd {
    fn default() -> Self {
        Self::from_config(&SvdConfig::default())
    }
}

impl TruncatedSvd {
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            ..Self::default()
        }
    }

    pub fn from_config(config: &SvdConfig) -> Self {
        Self {
            rank: config.rank,
            oversample: config.oversample,
            power_iterations: config.power_iterations,
            seed: config.seed,
        }
    }

    fn orthonormal(y: DMatrix<f64>) -> DMatrix<f64> {
        y.qr().q()
    }
}

impl DimensionReducer for TruncatedSvd {
    fn reduce(&self, weights: &CscMatrix<f64>) -> Result<Embedding> {
        let (n_rows, n_cols) = weights.shape();
        if self.rank == 0 {
            return Err(PipelineError::Numeric("SVD rank must be positive".into()));
        }
        let max_rank = n_rows.min(n_cols);
        if max_rank == 0 {
            return Err(PipelineError::EmptyInput(format!(
                "cannot decompose a {n_rows} x {n_cols} matrix"
            )));
        }
        let rank = if self.rank > max_rank {
            warn!(requested = self.rank, rank = max_rank, "SVD rank clamped to matrix size");
            max_rank
        } else {
            self.rank
        };
        let width = (rank + self.oversample).min(max_rank);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let omega = DMatrix::from_fn(n_cols, width, |_, _| rng.gen_range(-1.0..1.0));
        let mut q = Self::orthonormal(weights.mul_dense(&omega));
        for _ in 0..self.power_iterations {
            let z = Self::orthonormal(weights.tr_mul_dense(&q));
            q = Self::orthonormal(weights.mul_dense(&z));
        }

        let z = weights.tr_mul_dense(&q);
        let gram = z.transpose() * &z;
        let eigen = SymmetricEigen::new(gram);

        let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
        order.truncate(rank);

        let basis = DMatrix::from_fn(z.ncols(), order.len(), |i, j| eigen.eigenvectors[(i, order[j])]);
        let mut vectors = &z * basis;
        let singular_values: Vec<f64> = order
            .iter()
            .map(|&i| eigen.eigenvalues[i].max(0.0).sqrt())
            .collect();

        // sign convention: largest magnitude entry of each column is positive
        for mut column in vectors.column_iter_mut() {
            let pivot = column
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            if pivot < 0.0 {
                column.neg_mut();
            }
        }

        ensure_finite("truncated SVD", &vectors)?;
        debug!(rank, width, top = singular_values.first().copied().unwrap_or(0.0), "SVD done");
        Ok(Embedding {
            vectors,
            singular_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse_from_dense(dense: &DMatrix<f64>) -> CscMatrix<f64> {
        let mut m = CscMatrix::new(dense.nrows());
        for j in 0..dense.ncols() {
            let (rows, vals): (Vec<u32>, Vec<f64>) = (0..dense.nrows())
                .filter(|&i| dense[(i, j)] != 0.0)
                .map(|i| (i as u32, dense[(i, j)]))
                .unzip();
            m.push_column(&rows, &vals);
        }
        m
    }

    #[test]
    fn matches_dense_svd_on_small_matrix() {
        #[rustfmt::skip]
        let dense = DMatrix::from_row_slice(5, 4, &[
            1.0, 0.0, 2.0, 0.0,
            0.0, 3.0, 0.0, 1.0,
            4.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 5.0, 2.0,
            1.0, 1.0, 0.0, 0.0,
        ]);
        let sparse = sparse_from_dense(&dense);
        let svd = TruncatedSvd { rank: 2, oversample: 2, power_iterations: 2, seed: 7 };
        let emb = svd.reduce(&sparse).unwrap();

        let mut expected: Vec<f64> = dense.clone().svd(false, false).singular_values.iter().copied().collect();
        expected.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(emb.rank(), 2);
        assert_eq!(emb.vectors.shape(), (4, 2));
        for k in 0..2 {
            assert!((emb.singular_values[k] - expected[k]).abs() < 1e-8, "{k}");
            // column norm of V * S is the singular value
            assert!((emb.vectors.column(k).norm() - expected[k]).abs() < 1e-8);
        }
    }

    #[test]
    fn recovers_rank_two_structure() {
        // two groups of documents using disjoint token sets
        let mut m = CscMatrix::new(6);
        for d in 0..10 {
            if d % 2 == 0 {
                m.push_column(&[0, 1, 2], &[1.0, 2.0, 1.0]);
            } else {
                m.push_column(&[3, 4, 5], &[2.0, 1.0, 1.0]);
            }
        }
        let emb = TruncatedSvd::new(4).reduce(&m).unwrap();
        assert_eq!(emb.rank(), 4);
        assert!(emb.singular_values[1] > 1.0);
        assert!(emb.singular_values[2] < 1e-5);
        assert!(emb.singular_values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn rank_is_clamped_and_empty_columns_are_zero_rows() {
        let mut m = CscMatrix::new(2);
        m.push_column(&[0], &[1.0]);
        m.push_column(&[], &[]);
        m.push_column(&[1], &[2.0]);
        let emb = TruncatedSvd::new(50).reduce(&m).unwrap();
        assert_eq!(emb.rank(), 2);
        assert!(emb.vectors.row(1).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn zero_rank_is_an_error() {
        let mut m = CscMatrix::new(1);
        m.push_column(&[0], &[1.0]);
        assert!(TruncatedSvd::new(0).reduce(&m).is_err());
    }
}
