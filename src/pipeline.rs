//! Stage orchestration: reviews in, coordinates and labels out.

use std::time::Instant;

use nalgebra::DMatrix;
use tracing::{info, warn};

use crate::cache::CorpusCache;
use crate::config::{EmptyDocumentPolicy, PipelineConfig};
use crate::dataset::Review;
use crate::error::{PipelineError, Result};
use crate::reduce::embedding::NeighborEmbedding;
use crate::reduce::phenograph::Phenograph;
use crate::reduce::svd::TruncatedSvd;
use crate::reduce::{Clusterer, DimensionReducer, Embedding, Projector};
use crate::utils::datastruct::matrix::CscMatrix;
use crate::vectorizer::corpus::Corpus;
use crate::vectorizer::filter::{FilteredCorpus, VocabularyFilter};
use crate::vectorizer::serde::Fingerprint;
use crate::vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Filtered and re-weighted documents, ready for the dense stages.
#[derive(Debug, Clone)]
pub struct Vectorized {
    pub filtered: FilteredCorpus,
    /// review id of each column of `tfidf`
    pub documents: Vec<usize>,
    /// retained tokens x `documents`
    pub tfidf: CscMatrix<f64>,
}

/// Everything one run derives. Row `i` of `embedding`, `projection` and
/// `labels` belongs to review `documents[i]`.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub corpus: Corpus,
    pub filtered: FilteredCorpus,
    pub documents: Vec<usize>,
    pub tfidf: CscMatrix<f64>,
    pub embedding: Embedding,
    pub projection: DMatrix<f64>,
    pub labels: Vec<usize>,
}

pub struct Pipeline<R = TruncatedSvd, P = NeighborEmbedding, C = Phenograph> {
    config: PipelineConfig,
    engine: DefaultTFIDFEngine,
    filter: VocabularyFilter,
    cache: Option<CorpusCache>,
    reducer: R,
    projector: P,
    clusterer: C,
    corpus_builds: usize,
}

impl Pipeline {
    /// Pipeline with the default numeric backends, configured from `config`.
    pub fn new(config: PipelineConfig) -> Self {
        let reducer = TruncatedSvd::from_config(&config.svd);
        let projector = NeighborEmbedding::from_config(&config.projection);
        let clusterer = Phenograph::from_config(&config.clustering);
        Self::with_backends(config, reducer, projector, clusterer)
    }
}

impl<R, P, C> Pipeline<R, P, C>
where
    R: DimensionReducer,
    P: Projector,
    C: Clusterer,
{
    pub fn with_backends(config: PipelineConfig, reducer: R, projector: P, clusterer: C) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| CorpusCache::new(config.cache.dir.clone()));
        Self {
            engine: DefaultTFIDFEngine::new(config.tfidf.scale),
            filter: VocabularyFilter::from_config(&config.vocabulary),
            cache,
            reducer,
            projector,
            clusterer,
            corpus_builds: 0,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// How many times the occurrence matrix was built instead of loaded.
    pub fn corpus_builds(&self) -> usize {
        self.corpus_builds
    }

    /// Vocabulary and occurrence matrix over every review, from the cache
    /// when a file for this exact input exists.
    pub fn corpus(&mut self, reviews: &[Review]) -> Result<Corpus> {
        let descriptions = || reviews.iter().map(Review::description);
        let fingerprint = Fingerprint::of_descriptions(descriptions());

        if let Some(cache) = &self.cache {
            if let Some(corpus) = cache.load(&fingerprint)? {
                return Ok(corpus);
            }
        }

        let started = Instant::now();
        let corpus = Corpus::build(descriptions());
        self.corpus_builds += 1;
        info!(
            docs = corpus.doc_num(),
            vocab = corpus.vocabulary.len(),
            nnz = corpus.matrix.nnz(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "occurrence matrix built"
        );

        if let Some(cache) = &self.cache {
            cache.store(&fingerprint, &corpus)?;
        }
        Ok(corpus)
    }

    /// Filter the vocabulary, apply the empty-document policy and re-weight.
    pub fn vectorize(&self, corpus: &Corpus) -> Result<Vectorized> {
        let started = Instant::now();
        let filtered = self.filter.apply(corpus);
        if filtered.vocabulary.is_empty() {
            return Err(PipelineError::EmptyInput(format!(
                "no token occurs in at least {} documents outside the blacklist",
                self.filter.min_occurrence()
            )));
        }

        let empty = filtered.empty_documents();
        if !empty.is_empty() {
            warn!(
                empty = empty.len(),
                policy = ?self.config.empty_documents,
                "documents without retained tokens"
            );
        }
        let (documents, counts) = match self.config.empty_documents {
            EmptyDocumentPolicy::Keep => ((0..filtered.matrix.n_cols()).collect(), None),
            EmptyDocumentPolicy::Drop => {
                let keep: Vec<usize> = (0..filtered.matrix.n_cols())
                    .filter(|&d| filtered.matrix.column_nnz(d) > 0)
                    .collect();
                let counts = filtered.matrix.select_columns(&keep);
                (keep, Some(counts))
            }
        };
        if documents.is_empty() {
            return Err(PipelineError::EmptyInput("every document is empty after filtering".into()));
        }

        // IDF always counts every document, dropped ones included
        let tfidf = self
            .engine
            .transform_with_doc_num(counts.as_ref().unwrap_or(&filtered.matrix), filtered.matrix.n_cols());
        info!(
            tokens = filtered.vocabulary.len(),
            docs = documents.len(),
            nnz = tfidf.nnz(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tf-idf computed"
        );
        Ok(Vectorized {
            filtered,
            documents,
            tfidf,
        })
    }

    /// Run every stage.
    pub fn run(&mut self, reviews: &[Review]) -> Result<Analysis> {
        if reviews.is_empty() {
            return Err(PipelineError::EmptyInput("no reviews".into()));
        }
        let corpus = self.corpus(reviews)?;
        let Vectorized {
            filtered,
            documents,
            tfidf,
        } = self.vectorize(&corpus)?;

        let started = Instant::now();
        let embedding = self.reducer.reduce(&tfidf)?;
        info!(
            rank = embedding.rank(),
            docs = embedding.n_documents(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dimensionality reduced"
        );

        let started = Instant::now();
        let projection = self.projector.project(&embedding.vectors)?;
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "projected to 2D");

        let started = Instant::now();
        let labels = self.clusterer.cluster(&embedding.vectors)?;
        let clusters = labels.iter().max().map_or(0, |&l| l + 1);
        info!(clusters, elapsed_ms = started.elapsed().as_millis() as u64, "clusters assigned");

        Ok(Analysis {
            corpus,
            filtered,
            documents,
            tfidf,
            embedding,
            projection,
            labels,
        })
    }
}
