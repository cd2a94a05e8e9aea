//! Corpus file loading.
//!
//! The corpus is read once, in full, at startup. Changing it requires a
//! restart.

use sha2::{Digest, Sha256};
use std::path::Path;

use faq_relay_core::chunk::{split_corpus, SplitOptions};
use faq_relay_core::models::Passage;
use faq_relay_core::RelayError;

/// A loaded corpus and its passages.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub text: String,
    /// Hex SHA-256 of `text`, logged so operators can tell corpus versions apart.
    pub fingerprint: String,
}

impl Corpus {
    pub fn passages(&self, opts: &SplitOptions) -> Vec<Passage> {
        split_corpus(&self.text, opts)
    }
}

/// Read the corpus file.
///
/// Fails with [`RelayError::CorpusUnavailable`] if the file cannot be read
/// or is not valid UTF-8.
pub fn load_corpus(path: &Path) -> Result<Corpus, RelayError> {
    let unavailable = |reason: String| RelayError::CorpusUnavailable {
        path: path.display().to_string(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| unavailable(e.to_string()))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| unavailable(format!("not valid UTF-8: {}", e.utf8_error())))?;

    Ok(Corpus {
        fingerprint: fingerprint(&text),
        text,
    })
}

fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
