//! On-disk cache of the occurrence matrix.
//!
//! One CBOR file per fingerprint: `<dir>/occurrence-<first 16 hex>.cbor`.
//! A different dataset or tokenizer hashes to a different name, so it is simply
//! a miss. A file that exists under the expected name but cannot be decoded, or
//! whose embedded header disagrees, is never silently rebuilt.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::vectorizer::corpus::Corpus;
use crate::vectorizer::serde::{CorpusData, CorpusRecord, Fingerprint};

#[derive(Debug, Clone)]
pub struct CorpusCache {
    dir: PathBuf,
}

impl CorpusCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("occurrence-{}.cbor", fingerprint.short()))
    }

    /// `Ok(None)` when no file exists for `fingerprint`.
    pub fn load(&self, fingerprint: &Fingerprint) -> Result<Option<Corpus>> {
        let path = self.path_for(fingerprint);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "cache miss");
                return Ok(None);
            }
            Err(e) => return Err(PipelineError::io(&path, e)),
        };

        let data: CorpusData = serde_cbor::from_reader(BufReader::new(file)).map_err(|e| {
            PipelineError::CacheCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        if let Some(reason) = data.mismatch(fingerprint) {
            return Err(PipelineError::CacheCorrupt { path, reason });
        }

        let corpus = data.into_corpus();
        info!(
            path = %path.display(),
            vocab = corpus.vocabulary.len(),
            docs = corpus.doc_num(),
            "occurrence matrix loaded from cache"
        );
        Ok(Some(corpus))
    }

    /// Write through a temporary file and rename, so a crash never leaves a
    /// half-written file under the final name.
    pub fn store(&self, fingerprint: &Fingerprint, corpus: &Corpus) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| PipelineError::io(&self.dir, e))?;
        let path = self.path_for(fingerprint);
        let tmp = path.with_extension("cbor.tmp");
        let write_err = |reason: String| PipelineError::CacheWrite {
            path: path.clone(),
            reason,
        };

        let written = Self::write_record(&tmp, &CorpusRecord { fingerprint, corpus })
            .and_then(|()| fs::rename(&tmp, &path).map_err(|e| e.to_string()));
        if let Err(reason) = written {
            // never leave a partial temporary file behind
            if let Err(e) = fs::remove_file(&tmp) {
                debug!(path = %tmp.display(), error = %e, "temporary cache file not removed");
            }
            return Err(write_err(reason));
        }

        info!(path = %path.display(), nnz = corpus.matrix.nnz(), "occurrence matrix cached");
        Ok(path)
    }

    fn write_record(tmp: &Path, record: &CorpusRecord<'_>) -> std::result::Result<(), String> {
        let file = fs::File::create(tmp).map_err(|e| e.to_string())?;
        let mut writer = BufWriter::new(file);
        serde_cbor::to_writer(&mut writer, record).map_err(|e| e.to_string())?;
        writer.flush().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Fingerprint, Corpus) {
        let docs = [Some("red wine is great"), None, Some("white wine")];
        (Fingerprint::of_descriptions(docs), Corpus::build(docs))
    }

    #[test]
    fn store_then_load_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CorpusCache::new(dir.path().join("nested"));
        let (fp, corpus) = sample();

        assert!(cache.load(&fp).unwrap().is_none());
        let path = cache.store(&fp, &corpus).unwrap();
        assert!(path.ends_with(format!("occurrence-{}.cbor", fp.short())));
        assert!(!path.with_extension("cbor.tmp").exists());

        let loaded = cache.load(&fp).unwrap().unwrap();
        assert_eq!(loaded, corpus);
        assert!(loaded.vocabulary.iter().eq(corpus.vocabulary.iter()));
    }

    #[test]
    fn failed_store_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CorpusCache::new(dir.path());
        let (fp, corpus) = sample();
        // a directory under the final name makes the rename fail
        let path = cache.path_for(&fp);
        fs::create_dir_all(&path).unwrap();

        match cache.store(&fp, &corpus) {
            Err(PipelineError::CacheWrite { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a cache write error, got {other:?}"),
        }
        assert!(!path.with_extension("cbor.tmp").exists());
    }

    #[test]
    fn garbage_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CorpusCache::new(dir.path());
        let (fp, _) = sample();
        fs::write(cache.path_for(&fp), b"not cbor at all").unwrap();

        let err = cache.load(&fp).unwrap_err();
        match err {
            PipelineError::CacheCorrupt { path, .. } => assert_eq!(path, cache.path_for(&fp)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_mismatch_under_expected_name_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CorpusCache::new(dir.path());
        let (fp, corpus) = sample();
        let other = Fingerprint::of_descriptions([Some("something else")]);

        // a record for `other` placed where `fp` is expected
        let written = cache.store(&other, &corpus).unwrap();
        fs::rename(written, cache.path_for(&fp)).unwrap();

        assert!(matches!(
            cache.load(&fp),
            Err(PipelineError::CacheCorrupt { .. })
        ));
    }
}
