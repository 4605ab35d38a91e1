//! HTML to cleaned token sequence: strip markup, drop punctuation,
//! lowercase, word-tokenize, remove stopwords.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use stop_words::{get, LANGUAGE};

use crate::error::LoadError;

static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Fused forms the Treebank tokenizer splits even without apostrophes.
const FUSED_WORDS: &[(&str, &str, &str)] = &[
    ("cannot", "can", "not"),
    ("gimme", "gim", "me"),
    ("gonna", "gon", "na"),
    ("gotta", "got", "ta"),
    ("lemme", "lem", "me"),
    ("wanna", "wan", "na"),
];

/// Stopword set handed to [`normalize`]. Built once per run.
#[derive(Debug, Clone)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Default for Stopwords {
    fn default() -> Self {
        Self::english()
    }
}

impl Stopwords {
    /// NLTK's English list. Entries with apostrophes never match a cleaned
    /// token.
    pub fn english() -> Self {
        Stopwords {
            words: get(LANGUAGE::English).into_iter().collect(),
        }
    }

    #[allow(dead_code)]
    pub fn from_list(words: &[&str]) -> Self {
        Stopwords {
            words: words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Custom list, one word per line. Decoded lossily like the keyword lists.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Stopwords {
            path: path.to_path_buf(),
            source,
        })?;
        let words = String::from_utf8_lossy(&bytes)
            .lines()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        Ok(Stopwords { words })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}

/// Full normalization of one page. Order and duplicates are preserved.
pub fn normalize(raw_html: &str, stopwords: &Stopwords) -> Vec<String> {
    let text = strip_markup(raw_html);
    let cleaned = clean_text(&text);
    tokenize(&cleaned)
        .into_iter()
        .filter(|t| !stopwords.contains(t))
        .collect()
}

/// Visible text of the document: text nodes concatenated in document order,
/// no separators added between elements.
pub fn strip_markup(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() / 2);

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

/// Drop every non-word, non-space character and lowercase the rest.
pub fn clean_text(text: &str) -> String {
    NON_WORD_RE.replace_all(text, "").to_lowercase()
}

/// Whitespace split plus the fused-word rules. Input is expected to be
/// punctuation-free already.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        match FUSED_WORDS.iter().find(|(fused, _, _)| *fused == word) {
            Some((_, head, tail)) => {
                tokens.push(head.to_string());
                tokens.push(tail.to_string());
            }
            None => tokens.push(word.to_string()),
        }
    }
    tokens
}
