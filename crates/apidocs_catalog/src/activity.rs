//! Usage records kept next to the catalog.
//!
//! [`QueryLog`] remembers documentation searches and [`IngestHistory`]
//! remembers ingestion runs. Both live in memory and hold a fixed number of
//! records; once full, the oldest record is dropped.

use crate::endpoint::HttpMethod;
use crate::ingest::{IngestOutcome, IngestStatus};
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

/// Searches kept by [`QueryLog::default`].
pub const DEFAULT_QUERY_LOG_CAPACITY: usize = 1000;
/// Runs kept by [`IngestHistory::default`].
pub const DEFAULT_INGEST_HISTORY_CAPACITY: usize = 200;
/// Entries in [`SearchAnalytics::top_queries`].
pub const TOP_QUERY_COUNT: usize = 10;
/// Most recent runs per provider that make up its success rate.
pub const SUCCESS_RATE_WINDOW: usize = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Query log
// ─────────────────────────────────────────────────────────────────────────────

/// One documentation search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRecord {
    /// Query text as given.
    pub query: String,
    /// Provider filter, when one was applied.
    pub provider: Option<String>,
    /// Method filter, when one was applied.
    pub http_method: Option<HttpMethod>,
    /// Matches found before truncation.
    pub results_count: usize,
    /// When the search ran.
    pub searched_at: DateTime<Utc>,
}

/// A frequently repeated query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopQuery {
    /// Query, trimmed and lowercased.
    pub query: String,
    /// Times it was searched.
    pub count: usize,
    /// Mean number of matches.
    pub avg_results: f64,
}

/// Aggregates over the query log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchAnalytics {
    /// Searches held in the log.
    pub total_searches: usize,
    /// Distinct queries among them.
    pub unique_queries: usize,
    /// Searches from the last 24 hours.
    pub recent_searches: usize,
    /// Most frequent queries, most frequent first.
    pub top_queries: Vec<TopQuery>,
}

/// Bounded log of documentation searches.
#[derive(Debug)]
pub struct QueryLog {
    capacity: usize,
    records: Mutex<VecDeque<QueryRecord>>,
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_LOG_CAPACITY)
    }
}

impl QueryLog {
    /// Creates a log holding at most `capacity` searches.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        }
    }

    /// Appends a search, dropping the oldest one when full.
    pub fn record(&self, record: QueryRecord) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Searches held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Up to `count` searches, newest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<QueryRecord> {
        self.records.lock().iter().rev().take(count).cloned().collect()
    }

    /// Totals and the most frequent queries as of `now`.
    #[must_use]
    pub fn analytics(&self, now: DateTime<Utc>) -> SearchAnalytics {
        let records = self.records.lock();
        let since = now - TimeDelta::hours(24);

        let mut grouped: IndexMap<String, (usize, usize)> = IndexMap::new();
        let mut recent_searches = 0;
        for record in records.iter() {
            let (count, results) = grouped
                .entry(record.query.trim().to_lowercase())
                .or_default();
            *count += 1;
            *results += record.results_count;
            if record.searched_at >= since {
                recent_searches += 1;
            }
        }

        let unique_queries = grouped.len();
        let mut top_queries: Vec<TopQuery> = grouped
            .into_iter()
            .map(|(query, (count, results))| TopQuery {
                query,
                count,
                avg_results: results as f64 / count as f64,
            })
            .collect();
        // Stable, so ties keep first-seen order.
        top_queries.sort_by(|a, b| b.count.cmp(&a.count));
        top_queries.truncate(TOP_QUERY_COUNT);

        SearchAnalytics {
            total_searches: records.len(),
            unique_queries,
            recent_searches,
            top_queries,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ingestion history
// ─────────────────────────────────────────────────────────────────────────────

/// One provider ingestion and when it ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestRun {
    /// What the run produced.
    #[serde(flatten)]
    pub outcome: IngestOutcome,
    /// When the run took the provider's lock.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub completed_at: DateTime<Utc>,
}

/// Ingestion health of one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderIngestStats {
    /// Provider name.
    pub provider: String,
    /// Runs held for the provider.
    pub runs: usize,
    /// Share of successful runs among the last [`SUCCESS_RATE_WINDOW`].
    pub success_rate: f64,
    /// Completion time of the latest successful run.
    pub last_success: Option<DateTime<Utc>>,
    /// Endpoints stored by the latest successful run.
    pub last_total_endpoints: Option<usize>,
    /// Error of the latest run, when it failed.
    pub last_error: Option<String>,
}

/// Bounded history of ingestion runs across providers.
#[derive(Debug)]
pub struct IngestHistory {
    capacity: usize,
    runs: Mutex<VecDeque<IngestRun>>,
}

impl Default for IngestHistory {
    fn default() -> Self {
        Self::new(DEFAULT_INGEST_HISTORY_CAPACITY)
    }
}

impl IngestHistory {
    /// Creates a history holding at most `capacity` runs.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            runs: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        }
    }

    /// Appends a run, dropping the oldest one when full.
    pub fn record(&self, run: IngestRun) {
        let mut runs = self.runs.lock();
        if runs.len() == self.capacity {
            runs.pop_front();
        }
        runs.push_back(run);
    }

    /// Runs held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    /// Whether no run has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.lock().is_empty()
    }

    /// Runs of one provider, newest first.
    #[must_use]
    pub fn runs_for(&self, provider: &str) -> Vec<IngestRun> {
        self.runs
            .lock()
            .iter()
            .rev()
            .filter(|run| run.outcome.provider == provider)
            .cloned()
            .collect()
    }

    /// Per-provider health, in the order providers were first ingested.
    #[must_use]
    pub fn provider_stats(&self) -> Vec<ProviderIngestStats> {
        let runs = self.runs.lock();
        let mut by_provider: IndexMap<&str, Vec<&IngestRun>> = IndexMap::new();
        for run in runs.iter() {
            by_provider
                .entry(run.outcome.provider.as_str())
                .or_default()
                .push(run);
        }

        by_provider
            .into_iter()
            .map(|(provider, runs)| {
                let window = &runs[runs.len().saturating_sub(SUCCESS_RATE_WINDOW)..];
                let succeeded = window
                    .iter()
                    .filter(|run| run.outcome.status == IngestStatus::Success)
                    .count();
                let last_success = runs
                    .iter()
                    .rev()
                    .find(|run| run.outcome.status == IngestStatus::Success);
                ProviderIngestStats {
                    provider: provider.to_owned(),
                    runs: runs.len(),
                    success_rate: succeeded as f64 / window.len() as f64,
                    last_success: last_success.map(|run| run.completed_at),
                    last_total_endpoints: last_success.map(|run| run.outcome.total_endpoints),
                    last_error: runs
                        .last()
                        .and_then(|run| run.outcome.error.as_ref())
                        .map(|failure| failure.message.clone()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestFailure;

    fn search(query: &str, results_count: usize, searched_at: DateTime<Utc>) -> QueryRecord {
        QueryRecord {
            query: query.to_owned(),
            provider: None,
            http_method: None,
            results_count,
            searched_at,
        }
    }

    fn run(provider: &str, ok: bool, at: DateTime<Utc>) -> IngestRun {
        IngestRun {
            outcome: IngestOutcome {
                provider: provider.to_owned(),
                status: if ok { IngestStatus::Success } else { IngestStatus::Failed },
                total_endpoints: if ok { 12 } else { 0 },
                new_endpoints: 0,
                updated_endpoints: 0,
                error: (!ok).then(|| IngestFailure {
                    url: None,
                    message: "timed out".to_owned(),
                }),
            },
            started_at: at,
            completed_at: at,
        }
    }

    #[test]
    fn query_log_drops_oldest_when_full() {
        let log = QueryLog::new(2);
        let now = Utc::now();
        for query in ["first", "second", "third"] {
            log.record(search(query, 1, now));
        }
        assert_eq!(log.len(), 2);
        let queries: Vec<String> = log.recent(5).into_iter().map(|r| r.query).collect();
        assert_eq!(queries, ["third", "second"]);
    }

    #[test]
    fn analytics_groups_queries_and_counts_recent() {
        let log = QueryLog::default();
        let now = Utc::now();
        log.record(search("create issue", 4, now - TimeDelta::days(3)));
        log.record(search("list pods", 2, now));
        log.record(search("  Create Issue ", 2, now));
        log.record(search("list pods", 0, now));
        log.record(search("create issue", 3, now));

        let analytics = log.analytics(now);
        assert_eq!(analytics.total_searches, 5);
        assert_eq!(analytics.unique_queries, 2);
        assert_eq!(analytics.recent_searches, 4);
        assert_eq!(
            analytics.top_queries,
            [
                TopQuery {
                    query: "create issue".into(),
                    count: 3,
                    avg_results: 3.0,
                },
                TopQuery {
                    query: "list pods".into(),
                    count: 2,
                    avg_results: 1.0,
                },
            ]
        );
    }

    #[test]
    fn provider_stats_use_recent_window() {
        let history = IngestHistory::default();
        let now = Utc::now();
        for i in 0..12 {
            // Two early failures fall outside the window.
            history.record(run("jira", i >= 2, now + TimeDelta::seconds(i)));
        }
        history.record(run("k8s", true, now));
        history.record(run("k8s", false, now + TimeDelta::seconds(1)));

        let stats = history.provider_stats();
        assert_eq!(stats.len(), 2);
        assert_eq!((stats[0].provider.as_str(), stats[0].runs), ("jira", 12));
        assert!((stats[0].success_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats[0].last_success, Some(now + TimeDelta::seconds(11)));
        assert_eq!(stats[0].last_error, None);

        assert!((stats[1].success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats[1].last_success, Some(now));
        assert_eq!(stats[1].last_total_endpoints, Some(12));
        assert_eq!(stats[1].last_error.as_deref(), Some("timed out"));
        assert_eq!(history.runs_for("k8s")[0].outcome.status, IngestStatus::Failed);
    }

    #[test]
    fn ingest_history_is_bounded() {
        let history = IngestHistory::new(3);
        let now = Utc::now();
        for _ in 0..5 {
            history.record(run("jira", true, now));
        }
        assert_eq!(history.len(), 3);
    }
}
