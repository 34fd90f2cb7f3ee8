//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use voice_relay_bridge::{AgentConnector, RealtimeConnector, RelayConfig, RelaySupervisor};
use voice_relay_config::Settings;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    /// Per-call relay behaviour derived from `config`
    pub relay: Arc<RelayConfig>,
    /// Opens the agent leg of each call
    pub connector: Arc<dyn AgentConnector>,
}

impl AppState {
    /// State that connects calls to the configured realtime endpoint
    pub fn new(config: Settings) -> Self {
        let connector = Arc::new(RealtimeConnector::new(config.agent.clone()));
        Self::with_connector(config, connector)
    }

    pub fn with_connector(config: Settings, connector: Arc<dyn AgentConnector>) -> Self {
        Self {
            relay: Arc::new(RelayConfig::from(&config)),
            config: Arc::new(config),
            connector,
        }
    }

    /// Supervisor for one call
    pub fn supervisor(&self) -> RelaySupervisor {
        RelaySupervisor::new(self.relay.clone(), self.connector.clone())
    }
}
