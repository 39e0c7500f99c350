//! Assistant configuration.

use crate::orchestrator::OrchestratorConfig;
use crate::session::SessionConfig;
use apidocs_core::Settings;

/// Configuration for [`Assistant`](crate::Assistant).
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    /// Tool-loop limits.
    pub orchestrator: OrchestratorConfig,
    /// Session store limits.
    pub sessions: SessionConfig,
}

impl AgentConfig {
    /// Derives the configuration from runtime settings, keeping the default
    /// retry backoff.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            orchestrator: OrchestratorConfig {
                max_tool_rounds: settings.max_tool_rounds,
                model_timeout: settings.llm_timeout,
                max_retries: settings.llm_retries,
                ..OrchestratorConfig::default()
            },
            sessions: SessionConfig {
                ttl: settings.session_ttl,
                max_sessions: settings.max_sessions,
                max_history_turns: settings.max_history_turns,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn settings_flow_into_components() {
        let settings = Settings {
            max_tool_rounds: 3,
            llm_retries: 0,
            session_ttl: Duration::from_secs(60),
            max_history_turns: 4,
            ..Settings::default()
        };
        let config = AgentConfig::from_settings(&settings);
        assert_eq!(config.orchestrator.max_tool_rounds, 3);
        assert_eq!(config.orchestrator.max_retries, 0);
        assert_eq!(config.orchestrator.initial_backoff, Duration::from_millis(500));
        assert_eq!(config.sessions.ttl, Duration::from_secs(60));
        assert_eq!(config.sessions.max_history_turns, 4);
        assert_eq!(config.sessions.max_sessions, 1000);
    }
}
