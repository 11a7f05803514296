pub mod serde;

use std::fmt::Debug;

use num::Num;

/// CscMatrix is a compressed sparse column matrix.
/// Only non-zero entries are stored.
///
/// Columns are documents and rows are vocabulary indices, so building the matrix
/// is a single append per document and never needs the dense form.
///
/// Invariants:
/// - `col_ptr.len() == n_cols + 1`, `col_ptr[0] == 0`, non-decreasing
/// - `row_ind.len() == values.len() == col_ptr[n_cols]`
/// - row indices inside one column are strictly increasing and `< n_rows`
#[derive(Clone, PartialEq)]
pub struct CscMatrix<N>
where
    N: Num + Copy,
{
    n_rows: usize,
    col_ptr: Vec<usize>,
    row_ind: Vec<u32>,
    values: Vec<N>,
}

impl<N> CscMatrix<N>
where
    N: Num + Copy,
{
    /// Empty matrix with `n_rows` rows and no columns
    #[inline]
    pub fn new(n_rows: usize) -> Self {
        Self {
            n_rows,
            col_ptr: vec![0],
            row_ind: Vec::new(),
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(n_rows: usize, n_cols: usize, nnz: usize) -> Self {
        let mut col_ptr = Vec::with_capacity(n_cols + 1);
        col_ptr.push(0);
        Self {
            n_rows,
            col_ptr,
            row_ind: Vec::with_capacity(nnz),
            values: Vec::with_capacity(nnz),
        }
    }

    /// Build from raw parts, checking every invariant.
    pub fn from_parts(
        n_rows: usize,
        col_ptr: Vec<usize>,
        row_ind: Vec<u32>,
        values: Vec<N>,
    ) -> Result<Self, String> {
        if col_ptr.first() != Some(&0) {
            return Err("col_ptr must start with 0".to_string());
        }
        if row_ind.len() != values.len() {
            return Err(format!(
                "row_ind/values length mismatch: {} != {}",
                row_ind.len(),
                values.len()
            ));
        }
        if col_ptr.last() != Some(&row_ind.len()) {
            return Err("col_ptr does not end at nnz".to_string());
        }
        for w in col_ptr.windows(2) {
            if w[0] > w[1] {
                return Err("col_ptr is not non-decreasing".to_string());
            }
            let rows = &row_ind[w[0]..w[1]];
            if rows.windows(2).any(|r| r[0] >= r[1]) {
                return Err("row indices not strictly increasing inside a column".to_string());
            }
            if rows.last().is_some_and(|&r| r as usize >= n_rows) {
                return Err(format!("row index out of range (n_rows = {n_rows})"));
            }
        }
        Ok(Self {
            n_rows,
            col_ptr,
            row_ind,
            values,
        })
    }

    /// Append one column.
    ///
    /// # Arguments
    /// * `rows` - strictly increasing row indices
    /// * `values` - value for each row index
    #[inline]
    pub fn push_column(&mut self, rows: &[u32], values: &[N]) {
        debug_assert_eq!(rows.len(), values.len());
        debug_assert!(rows.windows(2).all(|w| w[0] < w[1]), "column rows must be sorted");
        debug_assert!(rows.last().map_or(true, |&r| (r as usize) < self.n_rows));
        self.row_ind.extend_from_slice(rows);
        self.values.extend_from_slice(values);
        self.col_ptr.push(self.row_ind.len());
    }

    /// Append one column where every stored entry has the same value.
    #[inline]
    pub fn push_pattern_column(&mut self, rows: &[u32], value: N) {
        debug_assert!(rows.windows(2).all(|w| w[0] < w[1]), "column rows must be sorted");
        self.row_ind.extend_from_slice(rows);
        self.values.extend(std::iter::repeat(value).take(rows.len()));
        self.col_ptr.push(self.row_ind.len());
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.col_ptr.len() - 1
    }

    /// (rows, cols)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols())
    }

    /// number of stored entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.row_ind.len()
    }

    /// Stored entries of one column
    #[inline]
    pub fn column(&self, col: usize) -> (&[u32], &[N]) {
        let (start, end) = (self.col_ptr[col], self.col_ptr[col + 1]);
        (&self.row_ind[start..end], &self.values[start..end])
    }

    #[inline]
    pub fn column_nnz(&self, col: usize) -> usize {
        self.col_ptr[col + 1] - self.col_ptr[col]
    }

    /// Iterate `(col, rows, values)` over every column
    pub fn columns(&self) -> impl Iterator<Item = (usize, &[u32], &[N])> + '_ {
        (0..self.n_cols()).map(move |col| {
            let (rows, vals) = self.column(col);
            (col, rows, vals)
        })
    }

    /// Value at (row, col); zero when not stored
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> N {
        if col >= self.n_cols() || row >= self.n_rows {
            return N::zero();
        }
        let (rows, vals) = self.column(col);
        match rows.binary_search(&(row as u32)) {
            Ok(i) => vals[i],
            Err(_) => N::zero(),
        }
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        if col >= self.n_cols() {
            return false;
        }
        self.column(col).0.binary_search(&(row as u32)).is_ok()
    }

    /// Number of stored entries per row
    pub fn row_nnz(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.n_rows];
        for &r in &self.row_ind {
            counts[r as usize] += 1;
        }
        counts
    }

    /// Sum of each row
    pub fn row_sums(&self) -> Vec<f64>
    where
        N: Into<f64>,
    {
        let mut sums = vec![0.0; self.n_rows];
        for (&r, &v) in self.row_ind.iter().zip(&self.values) {
            sums[r as usize] += v.into();
        }
        sums
    }

    /// Sum of each column
    pub fn column_sums(&self) -> Vec<f64>
    where
        N: Into<f64>,
    {
        self.columns()
            .map(|(_, _, vals)| vals.iter().map(|&v| Into::<f64>::into(v)).sum())
            .collect()
    }

    /// Keep only the given rows, re-indexed to `0..keep.len()` in the given order.
    /// `keep` must be strictly increasing so each column stays sorted.
    /// The column count never changes.
    pub fn select_rows(&self, keep: &[u32]) -> Self {
        debug_assert!(keep.windows(2).all(|w| w[0] < w[1]));
        let mut remap = vec![u32::MAX; self.n_rows];
        for (new, &old) in keep.iter().enumerate() {
            remap[old as usize] = new as u32;
        }

        let mut out = Self::with_capacity(keep.len(), self.n_cols(), self.nnz());
        for (_, rows, vals) in self.columns() {
            for (&r, &v) in rows.iter().zip(vals) {
                let new = remap[r as usize];
                if new != u32::MAX {
                    out.row_ind.push(new);
                    out.values.push(v);
                }
            }
            out.col_ptr.push(out.row_ind.len());
        }
        out
    }

    /// Keep only the given columns, in the given order.
    pub fn select_columns(&self, cols: &[usize]) -> Self {
        let nnz = cols.iter().map(|&c| self.column_nnz(c)).sum();
        let mut out = Self::with_capacity(self.n_rows, cols.len(), nnz);
        for &c in cols {
            let (rows, vals) = self.column(c);
            out.push_column(rows, vals);
        }
        out
    }

    /// Map every stored value, keeping the sparsity pattern as is.
    ///
    /// # Arguments
    /// * `f` - `(row, col, value) -> new value`
    pub fn map_values<M, F>(&self, mut f: F) -> CscMatrix<M>
    where
        M: Num + Copy,
        F: FnMut(usize, usize, N) -> M,
    {
        let mut values = Vec::with_capacity(self.nnz());
        for (col, rows, vals) in self.columns() {
            for (&r, &v) in rows.iter().zip(vals) {
                values.push(f(r as usize, col, v));
            }
        }
        CscMatrix {
            n_rows: self.n_rows,
            col_ptr: self.col_ptr.clone(),
            row_ind: self.row_ind.clone(),
            values,
        }
    }

    /// Same stored positions as `other`
    #[inline]
    pub fn same_pattern<M>(&self, other: &CscMatrix<M>) -> bool
    where
        M: Num + Copy,
    {
        self.n_rows == other.n_rows && self.col_ptr == other.col_ptr && self.row_ind == other.row_ind
    }

    #[inline]
    pub fn values(&self) -> &[N] {
        &self.values
    }

    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.col_ptr.shrink_to_fit();
        self.row_ind.shrink_to_fit();
        self.values.shrink_to_fit();
    }
}

impl<N: Num + Copy + Debug> Debug for CscMatrix<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            f.debug_struct("CscMatrix")
                .field("n_rows", &self.n_rows)
                .field("col_ptr", &self.col_ptr)
                .field("row_ind", &self.row_ind)
                .field("values", &self.values)
                .finish()
        } else {
            write!(f, "CscMatrix({}x{}, nnz={})", self.n_rows, self.n_cols(), self.nnz())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CscMatrix<u8> {
        // 4 rows x 3 cols
        let mut m = CscMatrix::new(4);
        m.push_pattern_column(&[0, 2], 1);
        m.push_pattern_column(&[], 1);
        m.push_pattern_column(&[1, 2, 3], 1);
        m
    }

    #[test]
    fn shape_and_lookup() {
        let m = sample();
        assert_eq!(m.shape(), (4, 3));
        assert_eq!(m.nnz(), 5);
        assert_eq!(m.get(2, 0), 1);
        assert_eq!(m.get(1, 0), 0);
        assert_eq!(m.get(3, 2), 1);
        assert_eq!(m.get(9, 9), 0);
        assert!(!m.contains(0, 1));
    }

    #[test]
    fn row_and_column_sums() {
        let m = sample();
        assert_eq!(m.row_nnz(), vec![1, 1, 2, 1]);
        assert_eq!(m.row_sums(), vec![1.0, 1.0, 2.0, 1.0]);
        assert_eq!(m.column_sums(), vec![2.0, 0.0, 3.0]);
    }

    #[test]
    fn select_rows_reindexes_and_keeps_columns() {
        let m = sample();
        let s = m.select_rows(&[1, 2]);
        assert_eq!(s.shape(), (2, 3));
        assert_eq!(s.column(0).0, &[1]);
        assert_eq!(s.column(1).0, &[] as &[u32]);
        assert_eq!(s.column(2).0, &[0, 1]);
    }

    #[test]
    fn select_columns_reorders() {
        let m = sample();
        let s = m.select_columns(&[2, 0]);
        assert_eq!(s.shape(), (4, 2));
        assert_eq!(s.column(0).0, &[1, 2, 3]);
        assert_eq!(s.column(1).0, &[0, 2]);
    }

    #[test]
    fn map_values_keeps_pattern() {
        let m = sample();
        let w: CscMatrix<f64> = m.map_values(|r, c, v| (r + c) as f64 * v as f64);
        assert!(m.same_pattern(&w));
        assert_eq!(w.get(3, 2), 5.0);
    }

    #[test]
    fn from_parts_rejects_broken_invariants() {
        assert!(CscMatrix::<u8>::from_parts(3, vec![0, 2], vec![1, 0], vec![1, 1]).is_err());
        assert!(CscMatrix::<u8>::from_parts(3, vec![0, 1], vec![3], vec![1]).is_err());
        assert!(CscMatrix::<u8>::from_parts(3, vec![0, 2], vec![0], vec![1]).is_err());
        assert!(CscMatrix::<u8>::from_parts(3, vec![0, 1, 2], vec![0, 2], vec![1, 1]).is_ok());
    }
}
