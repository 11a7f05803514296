use std::collections::HashSet;

use tracing::debug;

use crate::config::VocabularyConfig;
use crate::vectorizer::corpus::{Corpus, OccurrenceMatrix};
use crate::vectorizer::vocab::Vocabulary;

/// Vocabulary filter: drop blacklisted tokens and tokens seen in too few documents.
///
/// `keep(t) = occurrence(t) >= min_occurrence && t not in blacklist`
#[derive(Debug, Clone)]
pub struct VocabularyFilter {
    blacklist: HashSet<Box<str>>,
    min_occurrence: u64,
}

/// Rows of a corpus that survived the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredCorpus {
    /// Retained tokens, in original vocabulary order
    pub vocabulary: Vocabulary,
    /// Original vocabulary index of each retained token
    pub source_rows: Vec<u32>,
    /// retained rows x all documents
    pub matrix: OccurrenceMatrix,
}

impl VocabularyFilter {
    /// # Arguments
    /// * `blacklist` - exact-match exclusions
    /// * `min_occurrence` - inclusive lower bound on the document count of a token
    pub fn new<I, S>(blacklist: I, min_occurrence: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blacklist: blacklist.into_iter().map(|s| s.as_ref().into()).collect(),
            min_occurrence,
        }
    }

    pub fn from_config(config: &VocabularyConfig) -> Self {
        Self::new(&config.blacklist, config.min_occurrence)
    }

    #[inline]
    pub fn keep(&self, token: &str, occurrence: u64) -> bool {
        occurrence >= self.min_occurrence && !self.blacklist.contains(token)
    }

    #[inline]
    pub fn min_occurrence(&self) -> u64 {
        self.min_occurrence
    }

    /// Select the retained rows. The document count is unchanged.
    pub fn apply(&self, corpus: &Corpus) -> FilteredCorpus {
        let counts = corpus.term_doc_counts();
        let source_rows: Vec<u32> = corpus
            .vocabulary
            .iter()
            .zip(&counts)
            .enumerate()
            .filter(|(_, (token, count))| self.keep(token, **count))
            .map(|(row, _)| row as u32)
            .collect();
        debug!(
            kept = source_rows.len(),
            dropped = corpus.vocabulary.len() - source_rows.len(),
            min_occurrence = self.min_occurrence,
            "vocabulary filtered"
        );
        FilteredCorpus {
            vocabulary: corpus.vocabulary.subset(&source_rows),
            matrix: corpus.matrix.select_rows(&source_rows),
            source_rows,
        }
    }
}

impl FilteredCorpus {
    /// Documents left with no retained token
    pub fn empty_documents(&self) -> Vec<usize> {
        (0..self.matrix.n_cols())
            .filter(|&d| self.matrix.column_nnz(d) == 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklisted_token_is_never_kept() {
        let filter = VocabularyFilter::new(["is", "and"], 1);
        assert!(!filter.keep("is", 1_000_000));
        assert!(!filter.keep("and", 1));
        assert!(filter.keep("wine", 1));
    }

    #[test]
    fn threshold_is_inclusive() {
        let filter = VocabularyFilter::new(Vec::<String>::new(), 10);
        assert!(!filter.keep("oak", 9));
        assert!(filter.keep("oak", 10));
        assert!(filter.keep("oak", 11));
    }

    #[test]
    fn apply_reduces_rows_only() {
        let corpus = Corpus::build(
            ["red wine is great", "white wine is nice", "red and white blend"]
                .iter()
                .map(|d| Some(*d)),
        );
        let filtered = VocabularyFilter::new(["is", "and"], 2).apply(&corpus);

        let kept: Vec<&str> = filtered.vocabulary.iter().collect();
        assert_eq!(kept, vec!["red", "wine", "white"]);
        assert_eq!(filtered.matrix.shape(), (3, 3));
        for (row, &src) in filtered.source_rows.iter().enumerate() {
            assert_eq!(corpus.vocabulary.token(src), filtered.vocabulary.token(row as u32));
            for d in 0..3 {
                assert_eq!(filtered.matrix.get(row, d), corpus.matrix.get(src as usize, d));
            }
        }
    }

    #[test]
    fn documents_can_become_empty() {
        let corpus = Corpus::build([Some("is and"), Some("oak is")]);
        let filtered = VocabularyFilter::new(["is", "and"], 1).apply(&corpus);
        assert_eq!(filtered.empty_documents(), vec![0]);
    }
}
