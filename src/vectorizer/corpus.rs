use tracing::debug;

use crate::utils::datastruct::matrix::CscMatrix;
use crate::utils::sort::sort_dedup_u32;
use crate::vectorizer::token::token_set;
use crate::vectorizer::vocab::Vocabulary;

/// Binary presence matrix, |vocabulary| x |documents|.
pub type OccurrenceMatrix = CscMatrix<u8>;

/// Full, unfiltered vocabulary plus the occurrence matrix built over it.
/// This is the artifact that is cached on disk between runs.
///
/// `matrix[t, d] == 1` iff token `t` appears at least once in document `d`;
/// every other cell is absent. A document without description is an empty column.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    /// Row names of `matrix`
    pub vocabulary: Vocabulary,
    pub matrix: OccurrenceMatrix,
}

impl Corpus {
    /// Tokenize every description, collect the vocabulary and build the matrix.
    ///
    /// # Arguments
    /// * `descriptions` - one entry per document, in document order
    pub fn build<'a, I>(descriptions: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let token_sets: Vec<Vec<String>> = descriptions.into_iter().map(token_set).collect();
        let vocabulary = Vocabulary::build(&token_sets);
        debug!(docs = token_sets.len(), vocab = vocabulary.len(), "vocabulary collected");
        Self::from_token_sets(vocabulary, &token_sets)
    }

    /// Build the occurrence matrix for a fixed vocabulary.
    /// Each document is one pass: hash lookups, sort, dedupe, append.
    /// Tokens unknown to `vocabulary` are ignored.
    pub fn from_token_sets<S>(vocabulary: Vocabulary, token_sets: &[Vec<S>]) -> Self
    where
        S: AsRef<str>,
    {
        let nnz_hint = token_sets.iter().map(Vec::len).sum();
        let mut matrix = OccurrenceMatrix::with_capacity(vocabulary.len(), token_sets.len(), nnz_hint);
        let mut rows: Vec<u32> = Vec::new();
        for set in token_sets {
            rows.clear();
            rows.extend(set.iter().filter_map(|t| vocabulary.index_of(t.as_ref())));
            sort_dedup_u32(&mut rows);
            matrix.push_pattern_column(&rows, 1);
        }
        matrix.shrink_to_fit();
        Self { vocabulary, matrix }
    }

    /// number of documents
    #[inline]
    pub fn doc_num(&self) -> usize {
        self.matrix.n_cols()
    }

    /// Number of documents containing each token, by vocabulary index
    #[inline]
    pub fn term_doc_counts(&self) -> Vec<u64> {
        self.matrix.row_nnz()
    }

    /// Does document `doc` contain `token`
    pub fn contains(&self, token: &str, doc: usize) -> bool {
        self.vocabulary
            .index_of(token)
            .is_some_and(|row| self.matrix.contains(row as usize, doc))
    }

    /// Documents without any token
    pub fn empty_documents(&self) -> Vec<usize> {
        (0..self.doc_num())
            .filter(|&d| self.matrix.column_nnz(d) == 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::token::tokenize;

    const DOCS: [&str; 3] = ["red wine is great", "white wine is nice", "red and white blend"];

    #[test]
    fn presence_matches_token_sets() {
        let corpus = Corpus::build(DOCS.iter().map(|d| Some(*d)));
        assert_eq!(corpus.matrix.shape(), (corpus.vocabulary.len(), 3));

        for (d, text) in DOCS.iter().enumerate() {
            let set = token_set(Some(*text));
            for (t, token) in corpus.vocabulary.iter().enumerate() {
                let expected = set.iter().any(|s| s == token);
                assert_eq!(corpus.matrix.get(t, d) == 1, expected, "({token}, {d})");
                assert_eq!(corpus.matrix.contains(t, d), expected);
            }
        }
    }

    #[test]
    fn row_sum_is_document_frequency() {
        let corpus = Corpus::build(DOCS.iter().map(|d| Some(*d)));
        let sums = corpus.matrix.row_sums();
        let counts = corpus.term_doc_counts();
        for (t, token) in corpus.vocabulary.iter().enumerate() {
            let df = DOCS.iter().filter(|d| tokenize(Some(**d)).any(|x| x == token)).count();
            assert_eq!(sums[t] as usize, df, "{token}");
            assert_eq!(counts[t] as usize, df);
        }
        let red = corpus.vocabulary.index_of("red").unwrap() as usize;
        assert_eq!(counts[red], 2);
    }

    #[test]
    fn repeated_tokens_are_stored_once() {
        let corpus = Corpus::build([Some("plum plum plum, plum.")]);
        assert_eq!(corpus.matrix.nnz(), 1);
        assert_eq!(corpus.matrix.get(0, 0), 1);
    }

    #[test]
    fn absent_description_is_an_empty_column() {
        let corpus = Corpus::build([Some("oak"), None, Some("")]);
        assert_eq!(corpus.doc_num(), 3);
        assert_eq!(corpus.empty_documents(), vec![1, 2]);
        assert!(corpus.contains("oak", 0));
        assert!(!corpus.contains("oak", 1));
        assert!(!corpus.contains("missing", 0));
    }

    #[test]
    fn fixed_vocabulary_ignores_unknown_tokens() {
        let vocab: Vocabulary = ["b", "a"].into_iter().collect();
        let corpus = Corpus::from_token_sets(vocab, &[vec!["a", "zzz", "b"]]);
        assert_eq!(corpus.matrix.column(0).0, &[0, 1]);
    }
}
