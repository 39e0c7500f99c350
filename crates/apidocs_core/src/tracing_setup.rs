//! Process-wide log output.
//!
//! Logs always go to stderr so command output on stdout stays machine-readable.

use core::str::FromStr;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line, colored.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON for log shippers.
    Json,
}

impl FromStr for TracingFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{other}' (expected pretty, compact or json)"
            )),
        }
    }
}

/// Subscriber configuration, applied once by [`init`](Self::init).
///
/// ```
/// use apidocs_core::{TracingFormat, TracingSetup};
/// use tracing::Level;
///
/// TracingSetup::new()
///     .with_level(Level::INFO)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("apidocs=info,reqwest=warn")
///     .init();
/// ```
#[derive(Debug, Clone)]
pub struct TracingSetup {
    level: Level,
    format: TracingFormat,
    directives: Option<String>,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            directives: None,
        }
    }
}

impl TracingSetup {
    /// `INFO`, pretty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Level used when no directives are given or they fail to parse.
    #[must_use]
    pub fn with_level(self, level: Level) -> Self {
        Self { level, ..self }
    }

    /// Sets the line format.
    #[must_use]
    pub fn with_format(self, format: TracingFormat) -> Self {
        Self { format, ..self }
    }

    /// Per-target directives in `EnvFilter` syntax, e.g. `apidocs_agent=debug,reqwest=warn`.
    #[must_use]
    pub fn with_env_filter(self, directives: impl Into<String>) -> Self {
        Self {
            directives: Some(directives.into()),
            ..self
        }
    }

    fn filter(&self) -> EnvFilter {
        self.directives
            .as_deref()
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(self.level.as_str()))
    }

    /// Installs the subscriber. An already installed one is kept.
    pub fn init(&self) {
        let output = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let output = match self.format {
            TracingFormat::Pretty => output.pretty().boxed(),
            TracingFormat::Compact => output.compact().boxed(),
            TracingFormat::Json => output.json().boxed(),
        };

        let installed = tracing_subscriber::registry()
            .with(output)
            .with(self.filter())
            .try_init();
        if installed.is_ok() {
            tracing::debug!(level = %self.level, format = ?self.format, "tracing initialized");
        }
    }
}
