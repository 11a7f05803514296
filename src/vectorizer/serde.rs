use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

use crate::vectorizer::corpus::{Corpus, OccurrenceMatrix};
use crate::vectorizer::token::SEPARATORS;
use crate::vectorizer::vocab::Vocabulary;

/// Bumped whenever the on-disk layout or the tokenizer behaviour changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// blake3 digest of (format version, separator set, every description).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// # Arguments
    /// * `descriptions` - one entry per document, in document order
    pub fn of_descriptions<'a, I>(descriptions: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&CACHE_FORMAT_VERSION.to_le_bytes());
        for sep in SEPARATORS {
            let mut buf = [0u8; 4];
            hasher.update(sep.encode_utf8(&mut buf).as_bytes());
        }
        for description in descriptions {
            match description {
                // absent and empty must not collide
                None => {
                    hasher.update(&[0]);
                }
                Some(text) => {
                    hasher.update(&[1]);
                    hasher.update(&(text.len() as u64).to_le_bytes());
                    hasher.update(text.as_bytes());
                }
            }
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// lowercase hex of the full digest
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// leading 16 hex characters, used in file names
    pub fn short(&self) -> String {
        blake3::Hash::from(self.0).to_hex()[..16].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Borrowed view written to the cache file.
pub struct CorpusRecord<'a> {
    pub fingerprint: &'a Fingerprint,
    pub corpus: &'a Corpus,
}

impl Serialize for CorpusRecord<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CorpusRecord", 4)?;
        state.serialize_field("format_version", &CACHE_FORMAT_VERSION)?;
        state.serialize_field("fingerprint", self.fingerprint)?;
        state.serialize_field("vocabulary", &self.corpus.vocabulary)?;
        state.serialize_field("matrix", &self.corpus.matrix)?;
        state.end()
    }
}

/// Owned form read back from the cache file.
/// Use `into_corpus` once the header has been checked.
#[derive(Debug, Deserialize)]
pub struct CorpusData {
    pub format_version: u32,
    pub fingerprint: Fingerprint,
    pub vocabulary: Vocabulary,
    pub matrix: OccurrenceMatrix,
}

impl CorpusData {
    /// Reason the record cannot stand for `expected`, if any
    pub fn mismatch(&self, expected: &Fingerprint) -> Option<String> {
        if self.format_version != CACHE_FORMAT_VERSION {
            return Some(format!(
                "format version {} (expected {})",
                self.format_version, CACHE_FORMAT_VERSION
            ));
        }
        if &self.fingerprint != expected {
            return Some(format!("fingerprint {} (expected {})", self.fingerprint, expected));
        }
        if self.vocabulary.len() != self.matrix.n_rows() {
            return Some(format!(
                "{} vocabulary entries for {} matrix rows",
                self.vocabulary.len(),
                self.matrix.n_rows()
            ));
        }
        None
    }

    pub fn into_corpus(self) -> Corpus {
        Corpus {
            vocabulary: self.vocabulary,
            matrix: self.matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_descriptions_differ() {
        let a = Fingerprint::of_descriptions([None, Some("oak")]);
        let b = Fingerprint::of_descriptions([Some(""), Some("oak")]);
        assert_ne!(a, b);
    }

    #[test]
    fn concatenation_does_not_collide() {
        let a = Fingerprint::of_descriptions([Some("ab"), Some("c")]);
        let b = Fingerprint::of_descriptions([Some("a"), Some("bc")]);
        assert_ne!(a, b);
    }

    #[test]
    fn same_input_same_fingerprint() {
        let docs = [Some("red wine"), None];
        let a = Fingerprint::of_descriptions(docs);
        let b = Fingerprint::of_descriptions(docs);
        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), 64);
        assert_eq!(a.short().len(), 16);
        assert!(a.to_hex().starts_with(&a.short()));
        assert!(a.to_hex().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn record_reads_back_as_data() {
        let corpus = Corpus::build([Some("red wine"), Some("white wine")]);
        let fp = Fingerprint::of_descriptions([Some("red wine"), Some("white wine")]);
        let bytes = serde_cbor::to_vec(&CorpusRecord {
            fingerprint: &fp,
            corpus: &corpus,
        })
        .unwrap();
        let data: CorpusData = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(data.mismatch(&fp), None);
        assert_eq!(data.into_corpus(), corpus);
    }

    #[test]
    fn other_fingerprint_is_reported() {
        let corpus = Corpus::build([Some("oak")]);
        let fp = Fingerprint::of_descriptions([Some("oak")]);
        let bytes = serde_cbor::to_vec(&CorpusRecord {
            fingerprint: &fp,
            corpus: &corpus,
        })
        .unwrap();
        let data: CorpusData = serde_cbor::from_slice(&bytes).unwrap();
        let other = Fingerprint::of_descriptions([Some("pine")]);
        assert!(data.mismatch(&other).unwrap().contains("fingerprint"));
    }
}
