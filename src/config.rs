//! Pipeline configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all) is a
//! valid configuration. Command line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Tokens removed regardless of how often they occur.
/// Function words plus terms every wine review uses.
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "a", "about", "after", "all", "almost", "along", "also", "an", "and", "any", "are",
    "around", "as", "at", "be", "been", "but", "by", "can", "could", "drink", "flavor",
    "flavors", "for", "from", "has", "have", "here", "in", "into", "is", "it", "it's",
    "its", "just", "more", "nose", "note", "notes", "of", "offers", "on", "or", "palate",
    "shows", "so", "some", "than", "that", "the", "there", "this", "through", "to", "very",
    "well", "while", "which", "wine", "with", "yet",
];

/// What happens to documents left without any retained token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDocumentPolicy {
    /// stay as all-zero columns
    #[default]
    Keep,
    /// removed before TF-IDF
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".cache"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    pub blacklist: Vec<String>,
    /// inclusive minimum number of documents a token must occur in
    pub min_occurrence: u64,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            min_occurrence: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    pub scale: f64,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            scale: crate::vectorizer::tfidf::DEFAULT_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvdConfig {
    pub rank: usize,
    pub oversample: usize,
    pub power_iterations: usize,
    pub seed: u64,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            rank: 50,
            oversample: 10,
            power_iterations: 4,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub epochs: usize,
    pub negative_samples: usize,
    pub seed: u64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            min_dist: 0.1,
            epochs: 200,
            negative_samples: 5,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub k: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self { k: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// one presence plot per token
    pub highlight_tokens: Vec<String>,
    /// varieties with their own color, the rest is grouped as "other"
    pub top_varieties: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            highlight_tokens: vec!["oak".into(), "cherry".into(), "citrus".into()],
            top_varieties: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cache: CacheConfig,
    pub vocabulary: VocabularyConfig,
    pub tfidf: TfidfConfig,
    pub svd: SvdConfig,
    pub projection: ProjectionConfig,
    pub clustering: ClusteringConfig,
    pub empty_documents: EmptyDocumentPolicy,
    pub report: ReportConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_toml_str(&text).map_err(|source| PipelineError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
