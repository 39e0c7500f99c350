//! Conversation sessions.
//!
//! [`SessionStore`] is a sharded map of sessions, each behind its own async
//! mutex so overlapping requests for one session run one at a time while
//! different sessions proceed independently.
//!
//! Sessions expire after an idle TTL, and the store holds at most
//! `max_sessions`; when full, the least recently active idle session is
//! evicted. Sessions that are currently locked by a request are never
//! evicted. Sweeps run whenever a session is acquired.

use crate::classifier::{IntentType, SessionFactors};
use apidocs_core::Clock;
use apidocs_models::llm::{AssistantBlock, Message, UserBlock};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Session lookup and integrity failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No session with this id exists.
    #[error("session '{0}' does not exist")]
    Missing(String),

    /// The stored history violates its invariants.
    #[error("session '{id}' is corrupted: {reason}")]
    Corrupted {
        /// Session id.
        id: String,
        /// Which invariant failed.
        reason: String,
    },
}

/// Limits for [`SessionStore`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle time after which a session is dropped.
    pub ttl: Duration,
    /// Most sessions held at once.
    pub max_sessions: usize,
    /// Most turns kept per session.
    pub max_history_turns: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_sessions: 1000,
            max_history_turns: 10,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// One user query and every message it produced.
#[derive(Debug, Clone)]
pub struct Turn {
    messages: Vec<Message>,
}

impl Turn {
    /// Starts a turn with the user's query.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(query)],
        }
    }

    /// Appends an assistant or tool-result message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Messages in order, starting with the user query.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// A conversation.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    created_at: Instant,
    query_count: usize,
    last_intent: Option<IntentType>,
    turns: VecDeque<Turn>,
}

impl Session {
    fn new(id: String, now: Instant) -> Self {
        Self {
            id,
            created_at: now,
            query_count: 0,
            last_intent: None,
            turns: VecDeque::new(),
        }
    }

    /// Session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the session was created.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Queries recorded so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.query_count
    }

    /// Intent of the most recent query.
    #[must_use]
    pub fn last_intent(&self) -> Option<IntentType> {
        self.last_intent
    }

    /// Facts the classifier uses.
    #[must_use]
    pub fn factors(&self) -> SessionFactors {
        SessionFactors {
            session_query_count: self.query_count,
            previous_intent: self.last_intent,
        }
    }

    /// Flattened message history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Message> {
        self.turns
            .iter()
            .flat_map(|turn| turn.messages.iter().cloned())
            .collect()
    }

    /// Number of stored messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.turns.iter().map(|turn| turn.messages.len()).sum()
    }

    /// Number of stored turns.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Counts a query and remembers its intent.
    pub fn record_query(&mut self, intent: IntentType) {
        self.query_count += 1;
        self.last_intent = Some(intent);
    }

    /// Appends a completed turn, dropping the oldest turns beyond `max_turns`.
    pub fn push_turn(&mut self, turn: Turn, max_turns: usize) {
        self.turns.push_back(turn);
        while self.turns.len() > max_turns {
            self.turns.pop_front();
        }
    }

    /// Drops the stored history, keeping counters.
    pub fn reset_history(&mut self) {
        self.turns.clear();
    }

    /// Checks that every turn starts with a user query and that every tool
    /// result answers a tool call made earlier in the same turn.
    ///
    /// # Errors
    ///
    /// [`SessionError::Corrupted`] naming the first violation.
    pub fn check_integrity(&self) -> Result<(), SessionError> {
        let corrupted = |reason: String| SessionError::Corrupted {
            id: self.id.clone(),
            reason,
        };
        for (index, turn) in self.turns.iter().enumerate() {
            let starts_with_query = matches!(
                turn.messages.first(),
                Some(Message::User { content })
                    if content.iter().any(|block| matches!(block, UserBlock::Text(_)))
            );
            if !starts_with_query {
                return Err(corrupted(format!("turn {index} does not start with a user query")));
            }

            let mut calls = HashSet::new();
            for message in &turn.messages[1..] {
                match message {
                    Message::Assistant { content, .. } => {
                        for block in content {
                            if let AssistantBlock::ToolCall(call) = block {
                                calls.insert(call.id.as_str());
                            }
                        }
                    }
                    Message::User { content } => {
                        for block in content {
                            if let UserBlock::ToolResult(result) = block
                                && !calls.contains(result.id.as_str())
                            {
                                return Err(corrupted(format!(
                                    "turn {index} has a result for unknown tool call '{}'",
                                    result.id
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionStore
// ─────────────────────────────────────────────────────────────────────────────

struct Slot {
    session: Arc<Mutex<Session>>,
    last_active: parking_lot::Mutex<Instant>,
}

impl Slot {
    fn in_use(&self) -> bool {
        self.session.try_lock().is_err()
    }
}

/// Aggregate numbers for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Sessions held.
    pub total_sessions: usize,
    /// Queries recorded across sessions.
    pub total_queries: usize,
    /// Messages stored across sessions.
    pub total_messages: usize,
    /// Sessions locked by a request when the totals were taken.
    pub busy_sessions: usize,
}

/// Exclusive access to one session for the duration of a request.
pub type SessionGuard = OwnedMutexGuard<Session>;

/// Keyed, bounded store of conversation sessions.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Slot>>,
    clock: Clock,
    config: SessionConfig,
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: SessionConfig, clock: Clock) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
            config,
        }
    }

    /// Store limits.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Locks the session `id`, creating it when absent or expired. `None`
    /// creates a session with a fresh id.
    ///
    /// Returns the session id and a guard that serializes access to it.
    pub async fn acquire(&self, id: Option<&str>) -> (String, SessionGuard) {
        self.sweep();
        let now = self.clock.now();
        let id = id.map_or_else(|| nanoid::nanoid!(), str::to_owned);

        let slot = {
            let entry = self.sessions.entry(id.clone()).or_insert_with(|| {
                tracing::debug!(session = %id, "session created");
                Arc::new(Slot {
                    session: Arc::new(Mutex::new(Session::new(id.clone(), now))),
                    last_active: parking_lot::Mutex::new(now),
                })
            });
            *entry.last_active.lock() = now;
            Arc::clone(entry.value())
        };
        self.enforce_capacity(&id);

        let guard = Arc::clone(&slot.session).lock_owned().await;
        (id, guard)
    }

    /// Locks an existing session.
    ///
    /// # Errors
    ///
    /// [`SessionError::Missing`] when no live session has this id.
    pub async fn get(&self, id: &str) -> Result<SessionGuard, SessionError> {
        self.sweep();
        let slot = self
            .sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::Missing(id.to_owned()))?;
        *slot.last_active.lock() = self.clock.now();
        Ok(Arc::clone(&slot.session).lock_owned().await)
    }

    /// Whether a session with this id is held.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Removes one session. Returns whether it existed.
    pub fn clear(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Removes every session. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        count
    }

    /// Sessions held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Totals across sessions. Sessions locked by an in-flight request are
    /// counted in `busy_sessions` and left out of the query and message
    /// totals.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let mut stats = SessionStats::default();
        for entry in &self.sessions {
            stats.total_sessions += 1;
            match entry.value().session.try_lock() {
                Ok(session) => {
                    stats.total_queries += session.query_count();
                    stats.total_messages += session.message_count();
                }
                Err(_) => stats.busy_sessions += 1,
            }
        }
        stats
    }

    /// Drops idle sessions past their TTL.
    fn sweep(&self) {
        let ttl = self.config.ttl;
        let clock = &self.clock;
        let before = self.sessions.len();
        self.sessions.retain(|_, slot| {
            slot.in_use() || !clock.has_expired(*slot.last_active.lock(), ttl)
        });
        let expired = before.saturating_sub(self.sessions.len());
        if expired > 0 {
            tracing::debug!(expired, "expired idle sessions");
        }
    }

    /// Evicts least recently active idle sessions until within capacity.
    fn enforce_capacity(&self, keep: &str) {
        let excess = self.sessions.len().saturating_sub(self.config.max_sessions);
        if excess == 0 {
            return;
        }
        let mut candidates: Vec<(String, Instant)> = self
            .sessions
            .iter()
            .filter(|entry| entry.key() != keep && !entry.value().in_use())
            .map(|entry| (entry.key().clone(), *entry.value().last_active.lock()))
            .collect();
        candidates.sort_by_key(|(_, last_active)| *last_active);
        for (id, _) in candidates.into_iter().take(excess) {
            self.sessions.remove(&id);
            tracing::debug!(session = %id, "evicted session over capacity");
        }
    }
}
