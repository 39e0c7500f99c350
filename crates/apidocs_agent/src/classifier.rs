//! Rule-based query classification.
//!
//! Intents and provider aliases are declarative tables scored by one routine.
//! Keywords and aliases match whole words (multi-word phrases must appear
//! contiguously), case-insensitively.

use crate::tools::DocTool;
use apidocs_catalog::CleanedQuery;
use serde::Serialize;

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

/// What the user is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    /// Find endpoints.
    Search,
    /// Learn about a specific endpoint.
    EndpointInfo,
    /// Usage and coverage questions.
    Analytics,
    /// Suggestions for better API usage.
    Improvement,
    /// Worked examples and walkthroughs.
    Tutorial,
    /// Comparing endpoints or providers.
    Comparison,
}

impl IntentType {
    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::EndpointInfo => "endpoint_info",
            Self::Analytics => "analytics",
            Self::Improvement => "improvement",
            Self::Tutorial => "tutorial",
            Self::Comparison => "comparison",
        }
    }

    /// Tools the orchestrator should prefer for this intent, in order.
    #[must_use]
    pub fn tool_set(self) -> &'static [DocTool] {
        match self {
            Self::Search => &[DocTool::SearchDocumentation, DocTool::SearchOpenapi],
            Self::EndpointInfo => &[
                DocTool::GetEndpointDetails,
                DocTool::GetOpenapiEndpointDetails,
                DocTool::SearchDocumentation,
            ],
            Self::Analytics => &[DocTool::UsageAnalytics, DocTool::ListProviders],
            Self::Improvement | Self::Tutorial => {
                &[DocTool::SearchDocumentation, DocTool::GetEndpointDetails]
            }
            Self::Comparison => &[DocTool::SearchDocumentation, DocTool::ListProviders],
        }
    }
}

struct IntentRule {
    intent: IntentType,
    keywords: &'static [&'static str],
    /// Hundredths.
    base_confidence: u32,
}

/// Table order breaks confidence ties.
const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: IntentType::Search,
        keywords: &[
            "search", "find", "look for", "where is", "how to", "list", "show", "get all",
            "display",
        ],
        base_confidence: 90,
    },
    IntentRule {
        intent: IntentType::EndpointInfo,
        keywords: &["endpoint", "tell me about", "what does", "how does", "explain"],
        base_confidence: 80,
    },
    IntentRule {
        intent: IntentType::Analytics,
        keywords: &["usage", "analytics", "stats", "performance", "metrics"],
        base_confidence: 85,
    },
    IntentRule {
        intent: IntentType::Improvement,
        keywords: &["improve", "better", "suggestion", "enhance", "optimize"],
        base_confidence: 80,
    },
    IntentRule {
        intent: IntentType::Tutorial,
        keywords: &["tutorial", "example", "how to use", "guide", "walkthrough"],
        base_confidence: 75,
    },
    IntentRule {
        intent: IntentType::Comparison,
        keywords: &["compare", "difference", "vs", "versus", "alternative"],
        base_confidence: 70,
    },
];

// Confidence arithmetic is done in hundredths so ties compare exactly.
const KEYWORD_BONUS: u32 = 5;
const FOLLOW_UP_SEARCH_BONUS: u32 = 10;
const DEFAULT_CONFIDENCE: u32 = 60;
const MAX_CONFIDENCE: u32 = 100;

/// Alias to provider identifier.
pub const PROVIDER_ALIASES: &[(&str, &str)] = &[
    ("atlassian", "atlassian"),
    ("jira", "atlassian"),
    ("kubernetes", "kubernetes"),
    ("k8s", "kubernetes"),
    ("datadog", "datadog"),
];

// ─────────────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Rough size of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryComplexity {
    /// Up to three words.
    Simple,
    /// Up to eight words.
    Moderate,
    /// More than eight words.
    Complex,
}

impl QueryComplexity {
    fn of(query: &str) -> Self {
        match query.split_whitespace().count() {
            0..=3 => Self::Simple,
            4..=8 => Self::Moderate,
            _ => Self::Complex,
        }
    }
}

/// Session facts that influence classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionFactors {
    /// Queries already answered in this session.
    pub session_query_count: usize,
    /// Intent of the previous query.
    pub previous_intent: Option<IntentType>,
}

/// Result of classifying one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Best-matching intent.
    pub intent_type: IntentType,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Preferred tools for the intent.
    pub tool_set: Vec<DocTool>,
    /// Provider the query most likely targets.
    pub provider_hint: Option<String>,
    /// Every distinct provider mentioned, in order of first mention.
    pub mentioned_providers: Vec<String>,
    /// Query without noise words.
    pub cleaned_query: String,
    /// Word-count bucket.
    pub query_complexity: QueryComplexity,
    /// Session facts used.
    pub context: SessionFactors,
}

/// Table-driven intent and provider classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryClassifier;

impl QueryClassifier {
    /// Creates a classifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Classifies `query` given what is known about its session.
    #[must_use]
    pub fn classify(&self, query: &str, session: SessionFactors) -> Classification {
        let words = tokenize(query);

        let mut best: Option<(IntentType, u32)> = None;
        for rule in INTENT_RULES {
            let hits: u32 = rule
                .keywords
                .iter()
                .map(|keyword| u32::from(contains_phrase(&words, keyword)))
                .sum();
            if hits == 0 {
                continue;
            }
            let confidence = rule.base_confidence + KEYWORD_BONUS * hits;
            if best.is_none_or(|(_, current)| confidence > current) {
                best = Some((rule.intent, confidence));
            }
        }

        let (intent_type, confidence) = match best {
            Some((IntentType::Search, confidence)) if session.session_query_count > 1 => {
                (IntentType::Search, confidence + FOLLOW_UP_SEARCH_BONUS)
            }
            Some(found) => found,
            None => (IntentType::Search, DEFAULT_CONFIDENCE),
        };

        let mentioned_providers = detect_providers(&words);
        Classification {
            intent_type,
            confidence: f64::from(confidence.min(MAX_CONFIDENCE)) / 100.0,
            tool_set: intent_type.tool_set().to_vec(),
            provider_hint: mentioned_providers.first().cloned(),
            mentioned_providers,
            cleaned_query: CleanedQuery::new(query).phrase().to_owned(),
            query_complexity: QueryComplexity::of(query),
            context: session,
        }
    }
}

/// Lowercase alphanumeric runs.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Token index where `phrase` starts, if present.
fn find_phrase(words: &[String], phrase: &str) -> Option<usize> {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return None;
    }
    words
        .windows(needle.len())
        .position(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    find_phrase(words, phrase).is_some()
}

/// Providers in order of first mention. At one position the longest alias wins.
fn detect_providers(words: &[String]) -> Vec<String> {
    let mut hits: Vec<(usize, usize, &str)> = Vec::new();
    for &(alias, provider) in PROVIDER_ALIASES {
        for (index, word) in words.iter().enumerate() {
            if word == alias {
                hits.push((index, alias.len(), provider));
            }
        }
    }
    hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut providers: Vec<String> = Vec::new();
    for (_, _, provider) in hits {
        if !providers.iter().any(|p| p == provider) {
            providers.push(provider.to_owned());
        }
    }
    providers
}
