//! Text side of the pipeline: tokens, vocabulary, occurrence matrix, filtering
//! and TF-IDF weighting.

pub mod corpus;
pub mod filter;
pub mod serde;
pub mod tfidf;
pub mod token;
pub mod vocab;
