use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::error::LoadError;

/// A flat keyword list, one word per line. Entries are kept exactly as
/// written: matching is plain string equality, so callers own the casing.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    words: HashSet<String>,
}

impl Lexicon {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Lexicon {
            path: path.to_path_buf(),
            source,
        })?;
        // Old word lists are often Latin-1; don't reject them outright.
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    pub fn parse(raw: &str) -> Self {
        let words = raw
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Lexicon { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Number of tokens found in the lexicon, counted with multiplicity.
    pub fn count_in(&self, tokens: &[String]) -> usize {
        tokens.iter().filter(|t| self.contains(t)).count()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// The positive and negative keyword sets, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Lexicons {
    pub positive: Lexicon,
    pub negative: Lexicon,
}

impl Lexicons {
    pub fn load(positive: &Path, negative: &Path) -> Result<Self, LoadError> {
        let positive = Lexicon::load(positive)?;
        let negative = Lexicon::load(negative)?;
        if positive.is_empty() || negative.is_empty() {
            warn!("A keyword list is empty; its score will always be 0");
        }
        info!(
            positive = positive.len(),
            negative = negative.len(),
            "Loaded keyword lists"
        );
        Ok(Lexicons { positive, negative })
    }
}
