//! Injectable time source.
//!
//! Session expiry reads the time through a [`Clock`] so tests can move time
//! forward by hand.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic instants.
///
/// ```
/// use std::time::Instant;
/// use apidocs_core::{Clock, ClockProvider};
///
/// struct Frozen(Instant);
///
/// impl ClockProvider for Frozen {
///     fn now(&self) -> Instant {
///         self.0
///     }
/// }
///
/// let at = Instant::now();
/// let clock = Clock::with_provider(std::sync::Arc::new(Frozen(at)));
/// assert_eq!(clock.now(), at);
/// ```
pub trait ClockProvider: Send + Sync + 'static {
    /// The current instant.
    fn now(&self) -> Instant;
}

struct Monotonic;

impl ClockProvider for Monotonic {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cheaply cloneable handle to a [`ClockProvider`]. Defaults to the OS clock.
#[derive(Clone)]
pub struct Clock(Arc<dyn ClockProvider>);

impl Clock {
    /// The operating system's monotonic clock.
    #[must_use]
    pub fn system() -> Self {
        Self(Arc::new(Monotonic))
    }

    /// Reads time from `provider` instead.
    #[must_use]
    pub fn with_provider(provider: Arc<dyn ClockProvider>) -> Self {
        Self(provider)
    }

    /// The current instant.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.0.now()
    }

    /// Time since `earlier`, zero if `earlier` lies ahead.
    #[must_use]
    pub fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }

    /// Whether at least `ttl` has passed since `last_seen`.
    #[must_use]
    pub fn has_expired(&self, last_seen: Instant, ttl: Duration) -> bool {
        self.elapsed_since(last_seen) >= ttl
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl core::fmt::Debug for Clock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Clock")
    }
}

/// A clock that only moves when told to. Built for tests and the
/// `test-utils` feature.
///
/// ```ignore
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
/// use apidocs_core::{Clock, MockClock};
///
/// let mock = Arc::new(MockClock::new(Instant::now()));
/// let clock = Clock::with_provider(mock.clone());
/// let seen = clock.now();
///
/// mock.advance(Duration::from_secs(1800));
/// assert!(clock.has_expired(seen, Duration::from_secs(1800)));
/// ```
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct MockClock(parking_lot::Mutex<Instant>);

#[cfg(any(test, feature = "test-utils"))]
impl MockClock {
    /// Starts the clock at `start`.
    #[must_use]
    pub fn new(start: Instant) -> Self {
        Self(parking_lot::Mutex::new(start))
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.0.lock() += by;
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ClockProvider for MockClock {
    fn now(&self) -> Instant {
        *self.0.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = Clock::default();
        let first = clock.now();
        assert!(clock.now() >= first);
    }

    #[test]
    fn expiry_is_inclusive_of_ttl() {
        let start = Instant::now();
        let mock = Arc::new(MockClock::new(start));
        let clock = Clock::with_provider(mock.clone());
        let ttl = Duration::from_secs(30);

        mock.advance(Duration::from_secs(29));
        assert!(!clock.has_expired(start, ttl));

        mock.advance(Duration::from_secs(1));
        assert!(clock.has_expired(start, ttl));
    }

    #[test]
    fn future_instants_count_as_no_time() {
        let start = Instant::now();
        let clock = Clock::with_provider(Arc::new(MockClock::new(start)));

        assert_eq!(
            clock.elapsed_since(start + Duration::from_secs(5)),
            Duration::ZERO
        );
    }
}
