//! This crate maps a collection of wine reviews onto a 2D landscape.
//! Descriptions are turned into a sparse TF-IDF matrix, reduced with a
//! truncated SVD, projected with a neighbor-graph embedding and clustered.

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod reduce;
pub mod report;
pub mod utils;
pub mod vectorizer;

/// Pipeline
/// The top-level struct of this crate, running every stage from reviews to
/// 2D coordinates and cluster labels.
///
/// Internally, it holds:
/// - The configuration
/// - A TF-IDF calculation engine
/// - The vocabulary filter
/// - An optional on-disk occurrence matrix cache
/// - The numeric backends
///
/// `Pipeline<R, P, C>` has the following generic parameters:
/// - `R`: dimensionality reducer (default `TruncatedSvd`)
/// - `P`: 2D projector (default `NeighborEmbedding`)
/// - `C`: clusterer (default `Phenograph`)
pub use pipeline::{Analysis, Pipeline};

/// Pipeline configuration
/// Deserializable from TOML, every field has a default.
pub use config::{EmptyDocumentPolicy, PipelineConfig};

/// Corpus
/// Full vocabulary plus the binary token x document occurrence matrix.
/// This is the artifact that is cached between runs.
///
/// # Serialization
/// Through `CorpusRecord` (write) and `CorpusData` (read), which carry the
/// cache format version and the input fingerprint along with the corpus.
pub use vectorizer::corpus::Corpus;

/// Vocabulary
/// Ordered, de-duplicated tokens. The index of a token is its matrix row.
pub use vectorizer::vocab::Vocabulary;

/// Vocabulary filter
/// Blacklist and minimum document occurrence.
pub use vectorizer::filter::{FilteredCorpus, VocabularyFilter};

/// TF-IDF Engine
/// Trait for the TF, IDF and weight formulas, and the default implementation.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Compressed sparse column matrix
/// Only stored entries are kept; columns are documents.
pub use utils::datastruct::matrix::CscMatrix;

/// Numeric stages
pub use reduce::{Clusterer, DimensionReducer, Embedding, Projector};

/// Dataset row
pub use dataset::Review;

/// Error type of every fallible operation
pub use error::{PipelineError, Result};
