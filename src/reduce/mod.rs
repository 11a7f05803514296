//! Dense numeric stages after TF-IDF.
//!
//! Each stage sits behind a trait so the pipeline can be driven with other
//! backends. The defaults are:
//!
//! - [`svd::TruncatedSvd`] for [`DimensionReducer`]
//! - [`embedding::NeighborEmbedding`] for [`Projector`]
//! - [`phenograph::Phenograph`] for [`Clusterer`]

pub mod embedding;
pub mod knn;
pub mod phenograph;
pub mod svd;

use nalgebra::DMatrix;

use crate::error::Result;
use crate::utils::datastruct::matrix::CscMatrix;

/// Low-rank document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// documents x rank
    pub vectors: DMatrix<f64>,
    /// descending
    pub singular_values: Vec<f64>,
}

impl Embedding {
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    pub fn n_documents(&self) -> usize {
        self.vectors.nrows()
    }
}

/// tokens x documents sparse weights -> documents x rank dense coordinates
pub trait DimensionReducer {
    fn reduce(&self, weights: &CscMatrix<f64>) -> Result<Embedding>;
}

/// rows x dims -> rows x 2, same row order
pub trait Projector {
    fn project(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>>;
}

/// one label per row, same row order
pub trait Clusterer {
    fn cluster(&self, data: &DMatrix<f64>) -> Result<Vec<usize>>;
}

/// Copy the rows of a column-major matrix into contiguous vectors.
pub(crate) fn rows_of(data: &DMatrix<f64>) -> Vec<Vec<f64>> {
    (0..data.nrows())
        .map(|i| data.row(i).iter().copied().collect())
        .collect()
}

/// Fails when any entry is NaN or infinite.
pub(crate) fn ensure_finite(stage: &str, data: &DMatrix<f64>) -> Result<()> {
    if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
        return Err(crate::error::PipelineError::Numeric(format!(
            "{stage} produced a non-finite value at flat index {pos}"
        )));
    }
    Ok(())
}
