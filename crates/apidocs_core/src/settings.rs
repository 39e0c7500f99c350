//! Environment-driven runtime configuration.

use crate::tracing_setup::TracingFormat;
use std::time::Duration;

/// A configuration value could not be interpreted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The variable is set but malformed.
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        /// Environment variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
        /// What was expected.
        reason: String,
    },
}

/// Runtime configuration.
///
/// | Variable | Default |
/// |----------|---------|
/// | `APIDOCS_LLM` | `openai/gpt-4o-mini` |
/// | `ANTHROPIC_API_KEY`, `OPENAI_API_KEY` | unset |
/// | `APIDOCS_MAX_TOOL_ROUNDS` | 5 |
/// | `APIDOCS_LLM_TIMEOUT_SECS` | 30 |
/// | `APIDOCS_LLM_RETRIES` | 2 |
/// | `APIDOCS_FETCH_TIMEOUT_SECS` | 30 |
/// | `APIDOCS_FETCH_MAX_BYTES` | 33554432 |
/// | `APIDOCS_SESSION_TTL_SECS` | 1800 |
/// | `APIDOCS_MAX_SESSIONS` | 1000 |
/// | `APIDOCS_MAX_HISTORY_TURNS` | 10 |
/// | `APIDOCS_LOG` | unset (level `info`) |
/// | `APIDOCS_LOG_FORMAT` | `pretty` |
#[derive(Clone)]
pub struct Settings {
    /// Model identifier in `provider/model` form.
    pub llm_model: String,
    /// Anthropic credentials.
    pub anthropic_api_key: Option<String>,
    /// `OpenAI` credentials.
    pub openai_api_key: Option<String>,
    /// Upper bound on tool-call rounds per query.
    pub max_tool_rounds: usize,
    /// Deadline for a single model call.
    pub llm_timeout: Duration,
    /// Retries after the first failed model call.
    pub llm_retries: u32,
    /// Deadline for fetching a specification document.
    pub fetch_timeout: Duration,
    /// Largest specification document accepted, in bytes.
    pub fetch_max_bytes: usize,
    /// Idle time after which a session is dropped.
    pub session_ttl: Duration,
    /// Most sessions kept at once.
    pub max_sessions: usize,
    /// Most conversation turns kept per session.
    pub max_history_turns: usize,
    /// Filter directive for the tracing subscriber.
    pub log_filter: Option<String>,
    /// Log output format.
    pub log_format: TracingFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_model: "openai/gpt-4o-mini".to_string(),
            anthropic_api_key: None,
            openai_api_key: None,
            max_tool_rounds: 5,
            llm_timeout: Duration::from_secs(30),
            llm_retries: 2,
            fetch_timeout: Duration::from_secs(30),
            fetch_max_bytes: 32 * 1024 * 1024,
            session_ttl: Duration::from_secs(30 * 60),
            max_sessions: 1000,
            max_history_turns: 10,
            log_filter: None,
            log_format: TracingFormat::Pretty,
        }
    }
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Settings")
            .field("llm_model", &self.llm_model)
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("llm_timeout", &self.llm_timeout)
            .field("llm_retries", &self.llm_retries)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("fetch_max_bytes", &self.fetch_max_bytes)
            .field("session_ttl", &self.session_ttl)
            .field("max_sessions", &self.max_sessions)
            .field("max_history_turns", &self.max_history_turns)
            .field("log_filter", &self.log_filter)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Settings {
    /// Reads settings from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any set-but-malformed variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for any set-but-malformed variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let llm_model = match get("APIDOCS_LLM") {
            Some(model) => {
                let valid = model
                    .split_once('/')
                    .is_some_and(|(provider, name)| !provider.is_empty() && !name.is_empty());
                if !valid {
                    return Err(ConfigError::Invalid {
                        key: "APIDOCS_LLM",
                        value: model,
                        reason: "expected 'provider/model'".to_string(),
                    });
                }
                model
            }
            None => defaults.llm_model,
        };

        let log_format = match get("APIDOCS_LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                key: "APIDOCS_LOG_FORMAT",
                value: raw,
                reason,
            })?,
            None => defaults.log_format,
        };

        Ok(Self {
            llm_model,
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            max_tool_rounds: positive(&get, "APIDOCS_MAX_TOOL_ROUNDS", defaults.max_tool_rounds)?,
            llm_timeout: seconds(&get, "APIDOCS_LLM_TIMEOUT_SECS", defaults.llm_timeout)?,
            llm_retries: number(&get, "APIDOCS_LLM_RETRIES", defaults.llm_retries)?,
            fetch_timeout: seconds(&get, "APIDOCS_FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
            fetch_max_bytes: positive(&get, "APIDOCS_FETCH_MAX_BYTES", defaults.fetch_max_bytes)?,
            session_ttl: seconds(&get, "APIDOCS_SESSION_TTL_SECS", defaults.session_ttl)?,
            max_sessions: positive(&get, "APIDOCS_MAX_SESSIONS", defaults.max_sessions)?,
            max_history_turns: positive(
                &get,
                "APIDOCS_MAX_HISTORY_TURNS",
                defaults.max_history_turns,
            )?,
            log_filter: get("APIDOCS_LOG"),
            log_format,
        })
    }

    /// Provider part of [`llm_model`](Self::llm_model).
    #[must_use]
    pub fn llm_provider(&self) -> &str {
        self.llm_model
            .split_once('/')
            .map_or(self.llm_model.as_str(), |(provider, _)| provider)
    }

    /// Whether credentials exist for the selected model provider.
    #[must_use]
    pub fn llm_credentials_present(&self) -> bool {
        match self.llm_provider() {
            "anthropic" => self.anthropic_api_key.is_some(),
            "openai" => self.openai_api_key.is_some(),
            _ => false,
        }
    }
}

fn number<T: core::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected a non-negative integer".to_string(),
        }),
        None => Ok(default),
    }
}

fn positive(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    let value = number(get, key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

fn seconds(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let secs = number(get, key, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
