//! Keyword relevance ranking shared by the persisted catalog and the spec cache.
//!
//! Scoring is additive:
//!
//! | Match | Points |
//! |-------|--------|
//! | whole cleaned query is a substring of path or title | 10 |
//! | each query word found in path or title | 3 |
//! | each query word found in description or tags | 2 |
//!
//! All comparisons are case-insensitive. A query that cleans to nothing
//! matches every candidate with score 0, in input order.

use crate::endpoint::Endpoint;

/// Filler words removed from queries before scoring.
pub const NOISE_WORDS: &[&str] = &[
    "list", "show", "display", "get", "all", "the", "a", "an", "apis", "api", "endpoints",
    "endpoint", "how", "what", "when", "where", "why", "which", "who", "can", "could", "should",
    "would", "do", "does", "did", "any", "some", "provide", "give", "tell", "me", "you", "from",
    "for", "with", "about", "to", "of", "in", "on", "at",
];

const PHRASE_POINTS: u32 = 10;
const PRIMARY_WORD_POINTS: u32 = 3;
const SECONDARY_WORD_POINTS: u32 = 2;

/// A query after noise removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedQuery {
    words: Vec<String>,
    phrase: String,
}

impl CleanedQuery {
    /// Lowercases, tokenizes on whitespace, trims surrounding punctuation and
    /// drops [`NOISE_WORDS`].
    #[must_use]
    pub fn new(query: &str) -> Self {
        let words: Vec<String> = query
            .split_whitespace()
            .map(|token| {
                token
                    .trim_matches(|c: char| matches!(c, '?' | '!' | '.' | ',' | ';' | ':' | '"' | '\'' | '(' | ')'))
                    .to_lowercase()
            })
            .filter(|token| !token.is_empty() && !NOISE_WORDS.contains(&token.as_str()))
            .collect();
        let phrase = words.join(" ");
        Self { words, phrase }
    }

    /// Remaining words, lowercase.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Remaining words joined by single spaces.
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Whether nothing is left to match on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Relevance of one endpoint.
    #[must_use]
    pub fn score(&self, endpoint: &Endpoint) -> u32 {
        if self.is_empty() {
            return 0;
        }
        let path = endpoint.path.to_lowercase();
        let title = endpoint.title.to_lowercase();
        let description = endpoint.description.to_lowercase();
        let tags: Vec<String> = endpoint.tags.iter().map(|t| t.to_lowercase()).collect();

        let mut score = 0;
        if path.contains(&self.phrase) || title.contains(&self.phrase) {
            score += PHRASE_POINTS;
        }
        for word in &self.words {
            if path.contains(word.as_str()) || title.contains(word.as_str()) {
                score += PRIMARY_WORD_POINTS;
            }
            if description.contains(word.as_str()) || tags.iter().any(|t| t.contains(word.as_str())) {
                score += SECONDARY_WORD_POINTS;
            }
        }
        score
    }
}

/// An endpoint paired with its relevance.
#[derive(Debug, Clone, Copy)]
pub struct Scored<'a> {
    /// Matched endpoint.
    pub endpoint: &'a Endpoint,
    /// Relevance; 0 only for empty queries.
    pub score: u32,
}

/// Scores and orders candidates.
///
/// Non-empty queries keep only candidates with a positive score. Ties keep
/// input order.
pub fn rank<'a>(
    candidates: impl IntoIterator<Item = &'a Endpoint>,
    query: &CleanedQuery,
) -> Vec<Scored<'a>> {
    if query.is_empty() {
        return candidates
            .into_iter()
            .map(|endpoint| Scored { endpoint, score: 0 })
            .collect();
    }
    let mut scored: Vec<Scored<'a>> = candidates
        .into_iter()
        .map(|endpoint| Scored {
            endpoint,
            score: query.score(endpoint),
        })
        .filter(|s| s.score > 0)
        .collect();
    // `sort_by` is stable.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Clamps a requested result count into `[1, max]`, defaulting when absent.
#[must_use]
pub fn clamp_limit(requested: Option<i64>, default: usize, max: usize) -> usize {
    let max = max.max(1);
    match requested {
        None => default.clamp(1, max),
        Some(n) if n < 1 => 1,
        Some(n) => usize::try_from(n).map_or(max, |n| n.min(max)),
    }
}

/// Truncates to at most `max_chars` characters, appending `...` when cut.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_owned(),
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
    }
}
