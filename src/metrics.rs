use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::lexicon::Lexicons;

/// Keeps the score ratios finite when a denominator is zero.
pub const EPSILON: f64 = 1e-6;

/// A word with more vowel characters than this is "complex".
pub const COMPLEX_SYLLABLES: usize = 2;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+\s+").unwrap());

/// Everything computed for one page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DocumentMetrics {
    #[serde(rename = "Positive Score")]
    pub positive_count: usize,
    #[serde(rename = "Negative Score")]
    pub negative_count: usize,
    #[serde(rename = "Polarity Score")]
    pub polarity_score: f64,
    #[serde(rename = "Subjectivity Score")]
    pub subjectivity_score: f64,
    #[serde(rename = "Average Sentence Length")]
    pub avg_sentence_length: f64,
    #[serde(rename = "Percentage of Complex Words")]
    pub pct_complex_words: f64,
    #[serde(rename = "Fog Index")]
    pub fog_index: f64,
    #[serde(rename = "Average Words Per Sentence")]
    pub avg_words_per_sentence: f64,
    pub word_count: usize,
    pub sentence_count: usize,
    pub complex_word_count: usize,
}

pub fn analyze(tokens: &[String], lexicons: &Lexicons) -> DocumentMetrics {
    let positive_count = lexicons.positive.count_in(tokens);
    let negative_count = lexicons.negative.count_in(tokens);

    let word_count = tokens.len();
    let sentence_count = sentence_count(tokens);
    let complex_word_count = tokens.iter().filter(|t| is_complex(t)).count();

    let avg_sentence_length = ratio(word_count, sentence_count);
    let pct_complex_words = ratio(complex_word_count, word_count);

    DocumentMetrics {
        positive_count,
        negative_count,
        polarity_score: polarity(positive_count, negative_count),
        subjectivity_score: subjectivity(positive_count, negative_count, word_count),
        avg_sentence_length,
        pct_complex_words,
        fog_index: fog_index(avg_sentence_length, pct_complex_words),
        // Same formula as avg_sentence_length; both columns are reported.
        avg_words_per_sentence: ratio(word_count, sentence_count),
        word_count,
        sentence_count,
        complex_word_count,
    }
}

pub fn polarity(positive: usize, negative: usize) -> f64 {
    (positive as f64 - negative as f64) / ((positive + negative) as f64 + EPSILON)
}

pub fn subjectivity(positive: usize, negative: usize, total_words: usize) -> f64 {
    (positive + negative) as f64 / (total_words as f64 + EPSILON)
}

/// Sentences in the tokens re-joined with single spaces. The tokens carry no
/// punctuation, so any non-empty sequence is one sentence.
pub fn sentence_count(tokens: &[String]) -> usize {
    let joined = tokens.join(" ");
    SENTENCE_END_RE
        .split(&joined)
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Vowel characters in the word; not real syllabification.
pub fn syllable_count(word: &str) -> usize {
    word.chars().filter(|c| VOWELS.contains(c)).count()
}

pub fn is_complex(word: &str) -> bool {
    syllable_count(word) > COMPLEX_SYLLABLES
}

pub fn fog_index(avg_sentence_length: f64, pct_complex_words: f64) -> f64 {
    0.4 * (avg_sentence_length + pct_complex_words)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}
