use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Ordered, de-duplicated token list.
/// The position of a token is its row index in the occurrence matrix.
///
/// Order is first encounter over the documents in their given order, which is
/// stable for a fixed document order. It is not alphabetical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    tokens: IndexSet<Box<str>>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self {
            tokens: IndexSet::new(),
        }
    }

    /// Collect every distinct token over all documents.
    ///
    /// # Arguments
    /// * `docs` - token sequence of each document
    pub fn build<D, T, S>(docs: D) -> Self
    where
        D: IntoIterator<Item = T>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self::new();
        for doc in docs {
            for token in doc {
                vocab.intern(token.as_ref());
            }
        }
        vocab
    }

    /// Index of `token`, inserting it at the end when new.
    #[inline]
    pub fn intern(&mut self, token: &str) -> u32 {
        if let Some(idx) = self.tokens.get_index_of(token) {
            return idx as u32;
        }
        self.tokens.insert_full(token.into()).0 as u32
    }

    #[inline]
    pub fn index_of(&self, token: &str) -> Option<u32> {
        self.tokens.get_index_of(token).map(|i| i as u32)
    }

    #[inline]
    pub fn token(&self, index: u32) -> Option<&str> {
        self.tokens.get_index(index as usize).map(|t| &**t)
    }

    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in index order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(|t| &**t)
    }

    /// Sub-vocabulary made of the given indices, in the given order
    pub fn subset(&self, indices: &[u32]) -> Self {
        Self {
            tokens: indices
                .iter()
                .filter_map(|&i| self.tokens.get_index(i as usize).cloned())
                .collect(),
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut vocab = Self::new();
        for token in iter {
            vocab.intern(token.as_ref());
        }
        vocab
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::vectorizer::token::tokenize;

    #[test]
    fn first_seen_order_and_no_duplicates() {
        let docs = [
            vec!["red", "wine", "is", "great"],
            vec!["white", "wine", "is", "nice"],
        ];
        let vocab = Vocabulary::build(docs.iter().map(|d| d.iter()));
        let order: Vec<&str> = vocab.iter().collect();
        assert_eq!(order, vec!["red", "wine", "is", "great", "white", "nice"]);
        assert_eq!(vocab.index_of("white"), Some(4));
        assert_eq!(vocab.token(1), Some("wine"));
        assert_eq!(vocab.index_of("rose"), None);
    }

    #[test]
    fn covers_exactly_the_distinct_tokens() {
        let texts = [
            Some("Tart cherry, tart plum."),
            None,
            Some("Plum (dried); cherry-pit finish"),
        ];
        let vocab = Vocabulary::build(texts.iter().map(|t| tokenize(*t)));
        let distinct: HashSet<String> = texts.iter().flat_map(|t| tokenize(*t)).collect();
        assert_eq!(vocab.len(), distinct.len());
        for token in &distinct {
            assert!(vocab.contains(token));
        }
    }

    #[test]
    fn building_twice_is_stable() {
        let texts = ["b a c", "c d a"];
        let a = Vocabulary::build(texts.iter().map(|t| tokenize(Some(*t))));
        let b = Vocabulary::build(texts.iter().map(|t| tokenize(Some(*t))));
        assert!(a.iter().eq(b.iter()));
    }

    #[test]
    fn subset_keeps_requested_order() {
        let vocab: Vocabulary = ["a", "b", "c", "d"].into_iter().collect();
        let sub = vocab.subset(&[1, 3]);
        assert_eq!(sub.iter().collect::<Vec<_>>(), vec!["b", "d"]);
    }
}
