use nalgebra::DMatrix;
use num::Num;

use crate::utils::datastruct::matrix::CscMatrix;

/// Sparse x dense products used by the truncated SVD.
/// Only stored entries are touched.
impl<N> CscMatrix<N>
where
    N: Num + Copy + Into<f64>,
{
    /// `A * X`
    ///
    /// # Arguments
    /// * `x` - dense `n_cols x l`
    ///
    /// # Returns
    /// * dense `n_rows x l`
    pub fn mul_dense(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(x.nrows(), self.n_cols(), "A * X dimension mismatch");
        let l = x.ncols();
        let mut out = DMatrix::zeros(self.n_rows(), l);
        for (col, rows, vals) in self.columns() {
            for (&r, &v) in rows.iter().zip(vals) {
                let v: f64 = v.into();
                for j in 0..l {
                    out[(r as usize, j)] += v * x[(col, j)];
                }
            }
        }
        out
    }

    /// `A^T * Y`
    ///
    /// # Arguments
    /// * `y` - dense `n_rows x l`
    ///
    /// # Returns
    /// * dense `n_cols x l`
    pub fn tr_mul_dense(&self, y: &DMatrix<f64>) -> DMatrix<f64> {
        assert_eq!(y.nrows(), self.n_rows(), "A^T * Y dimension mismatch");
        let l = y.ncols();
        let mut out = DMatrix::zeros(self.n_cols(), l);
        for (col, rows, vals) in self.columns() {
            for (&r, &v) in rows.iter().zip(vals) {
                let v: f64 = v.into();
                for j in 0..l {
                    out[(col, j)] += v * y[(r as usize, j)];
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_match_dense() {
        // A = [[1,0],[2,3],[0,4]]  (3 x 2)
        let mut a = CscMatrix::<f64>::new(3);
        a.push_column(&[0, 1], &[1.0, 2.0]);
        a.push_column(&[1, 2], &[3.0, 4.0]);
        let dense = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 2.0, 3.0, 0.0, 4.0]);

        let x = DMatrix::from_row_slice(2, 2, &[1.0, -1.0, 0.5, 2.0]);
        assert_eq!(a.mul_dense(&x), &dense * &x);

        let y = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        assert_eq!(a.tr_mul_dense(&y), dense.transpose() * &y);
    }
}
