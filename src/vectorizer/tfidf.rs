use num::Num;

use crate::utils::datastruct::matrix::CscMatrix;

/// TF-IDF calculation engine.
///
/// Implementations decide the term frequency, inverse document frequency and final
/// weight of one cell. `transform` walks only the stored entries, so the result has
/// exactly the sparsity pattern of its input.
pub trait TFIDFEngine {
    /// term frequency of a cell
    /// # Arguments
    /// * `count` - cell value
    /// * `doc_total` - sum of the document's column
    fn tf(&self, count: f64, doc_total: f64) -> f64;

    /// inverse document frequency of a token
    /// # Arguments
    /// * `doc_freq` - row sum of the token (documents containing it)
    /// * `doc_num` - total number of documents
    fn idf(&self, doc_freq: f64, doc_num: f64) -> f64;

    /// final stored weight from tf and idf
    fn weight(&self, tf: f64, idf: f64) -> f64;

    /// IDF of every row
    fn idf_vec(&self, doc_freqs: &[f64], doc_num: usize) -> Vec<f64> {
        doc_freqs.iter().map(|&df| self.idf(df, doc_num as f64)).collect()
    }

    /// Re-weight a (binary or count) matrix, rows = tokens, columns = documents.
    fn transform<N>(&self, matrix: &CscMatrix<N>) -> CscMatrix<f64>
    where
        N: Num + Copy + Into<f64>,
    {
        self.transform_with_doc_num(matrix, matrix.n_cols())
    }

    /// Like `transform`, with the IDF document count given explicitly.
    /// Used when `matrix` holds only a subset of the corpus columns.
    fn transform_with_doc_num<N>(&self, matrix: &CscMatrix<N>, doc_num: usize) -> CscMatrix<f64>
    where
        N: Num + Copy + Into<f64>,
    {
        let doc_totals = matrix.column_sums();
        let idf = self.idf_vec(&matrix.row_sums(), doc_num);
        matrix.map_values(|row, col, count| {
            let tf = self.tf(count.into(), doc_totals[col]);
            self.weight(tf, idf[row])
        })
    }
}

/// Default scale applied before log compression
pub const DEFAULT_SCALE: f64 = 1e5;

/// Default engine
///
/// - `TF[t,d] = C[t,d] / sum_t' C[t',d]`
/// - `IDF[t] = ln(1 + D / sum_d C[t,d])`
/// - `W'[t,d] = ln(1 + TF * IDF * scale)`
///
/// A document with no retained token keeps an empty column and a token that
/// appears in no document gets IDF 0, so nothing divides by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultTFIDFEngine {
    pub scale: f64,
}

impl DefaultTFIDFEngine {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }
}

impl Default for DefaultTFIDFEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE)
    }
}

impl TFIDFEngine for DefaultTFIDFEngine {
    #[inline]
    fn tf(&self, count: f64, doc_total: f64) -> f64 {
        if doc_total == 0.0 {
            return 0.0;
        }
        count / doc_total
    }

    #[inline]
    fn idf(&self, doc_freq: f64, doc_num: f64) -> f64 {
        if doc_freq <= 0.0 {
            return 0.0;
        }
        (doc_num / doc_freq).ln_1p()
    }

    #[inline]
    fn weight(&self, tf: f64, idf: f64) -> f64 {
        (tf * idf * self.scale).ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine without the log compression, to check TF and IDF directly
    struct RawEngine;
    impl TFIDFEngine for RawEngine {
        fn tf(&self, count: f64, doc_total: f64) -> f64 {
            DefaultTFIDFEngine::default().tf(count, doc_total)
        }
        fn idf(&self, doc_freq: f64, doc_num: f64) -> f64 {
            DefaultTFIDFEngine::default().idf(doc_freq, doc_num)
        }
        fn weight(&self, tf: f64, idf: f64) -> f64 {
            tf * idf
        }
    }

    fn binary(n_rows: usize, cols: &[&[u32]]) -> CscMatrix<u8> {
        let mut m = CscMatrix::new(n_rows);
        for rows in cols {
            m.push_pattern_column(rows, 1);
        }
        m
    }

    #[test]
    fn single_token_document_has_tf_one() {
        let engine = DefaultTFIDFEngine::default();
        assert_eq!(engine.tf(1.0, 1.0), 1.0);

        // doc 0 holds only token 0; token 0 is also in doc 1
        let m = binary(2, &[&[0], &[0, 1]]);
        let w = RawEngine.transform(&m);
        let idf0 = (1.0f64 + 2.0 / 2.0).ln();
        assert!((w.get(0, 0) - idf0).abs() < 1e-12);
        assert!((w.get(0, 1) - 0.5 * idf0).abs() < 1e-12);
    }

    #[test]
    fn token_in_every_document_has_idf_ln2() {
        let engine = DefaultTFIDFEngine::default();
        assert!((engine.idf(7.0, 7.0) - 2f64.ln()).abs() < 1e-15);
        let idf = engine.idf_vec(&[3.0, 1.0], 3);
        assert!((idf[0] - 2f64.ln()).abs() < 1e-15);
        assert!((idf[1] - 4f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn zero_guards_never_produce_nan() {
        let engine = DefaultTFIDFEngine::default();
        assert_eq!(engine.tf(0.0, 0.0), 0.0);
        assert_eq!(engine.idf(0.0, 10.0), 0.0);
        assert_eq!(engine.weight(0.0, 0.0), 0.0);
    }

    #[test]
    fn compression_is_log1p_of_scaled_weight() {
        let m = binary(2, &[&[0, 1], &[1]]);
        let w = DefaultTFIDFEngine::default().transform(&m);
        let tf = 0.5;
        let idf = (1.0f64 + 2.0 / 1.0).ln();
        assert!((w.get(0, 0) - (tf * idf * 1e5).ln_1p()).abs() < 1e-9);
        assert!(w.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn pattern_is_preserved_with_empty_columns() {
        let m = binary(3, &[&[0, 2], &[], &[1], &[]]);
        let w = DefaultTFIDFEngine::default().transform(&m);
        assert!(w.same_pattern(&m));
        assert_eq!(w.nnz(), 3);
        assert_eq!(w.column(1).0.len(), 0);
        assert!(w.values().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn explicit_doc_num_drives_idf() {
        // same columns as `[&[0, 1], &[1]]` plus an empty one left out
        let m = binary(2, &[&[0, 1], &[1]]);
        let w = RawEngine.transform_with_doc_num(&m, 3);
        assert!((w.get(0, 0) - 0.5 * (1.0f64 + 3.0).ln()).abs() < 1e-12);
        assert!((w.get(1, 1) - (1.0f64 + 1.5).ln()).abs() < 1e-12);
        assert_eq!(RawEngine.transform_with_doc_num(&m, 2), RawEngine.transform(&m));
    }

    #[test]
    fn rarer_token_weighs_more_in_same_document() {
        // tokens: 0 = common (docs 0,1), 1 = rare (doc 0)
        let m = binary(2, &[&[0, 1], &[0], &[]]);
        let w = DefaultTFIDFEngine::default().transform(&m);
        assert!(w.get(1, 0) > w.get(0, 0));
    }
}
