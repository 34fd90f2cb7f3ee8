//! Relay supervisor
//!
//! Owns one call from telephony accept to teardown: opens the agent leg,
//! configures the agent session, runs both readers until either leg ends,
//! and closes whatever is still open.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use voice_relay_config::{BargeInMode, SessionProfile, Settings};
use voice_relay_core::{CallSession, CallStats, FrameSink, FrameSource, Result};

use crate::{
    AgentConnection, AgentConnector, AgentReader, BargeInController, Link, ReaderExit,
    SessionInitializer, TelephonyReader,
};

/// Per-call relay behaviour
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    pub profile: SessionProfile,
    pub barge_in: BargeInMode,
}

impl From<&Settings> for RelayConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            profile: settings.session.clone(),
            barge_in: settings.barge_in.mode,
        }
    }
}

/// Which leg ended the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Telephony,
    Agent,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Telephony => write!(f, "telephony"),
            Side::Agent => write!(f, "agent"),
        }
    }
}

/// Outcome of a relayed call
#[derive(Debug)]
pub struct CallSummary {
    pub call_id: String,
    pub stream_sid: Option<String>,
    pub call_sid: Option<String>,
    pub ended_by: Side,
    pub exit: ReaderExit,
    pub duration_ms: i64,
    pub stats: CallStats,
}

pub struct RelaySupervisor {
    config: Arc<RelayConfig>,
    connector: Arc<dyn AgentConnector>,
}

impl RelaySupervisor {
    pub fn new(config: Arc<RelayConfig>, connector: Arc<dyn AgentConnector>) -> Self {
        Self { config, connector }
    }

    /// Relay one accepted telephony connection until either leg ends.
    ///
    /// Fails only if the agent leg could not be established or configured;
    /// in that case the telephony leg is closed before returning.
    pub async fn run(
        &self,
        telephony_source: Box<dyn FrameSource>,
        telephony_sink: Box<dyn FrameSink>,
    ) -> Result<CallSummary> {
        let call_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("call", call_id = %call_id);
        self.relay(call_id, telephony_source, telephony_sink)
            .instrument(span)
            .await
    }

    async fn relay(
        &self,
        call_id: String,
        mut telephony_source: Box<dyn FrameSource>,
        telephony_sink: Box<dyn FrameSink>,
    ) -> Result<CallSummary> {
        tracing::info!("Telephony connected");
        let telephony = Link::new("telephony", telephony_sink);

        let AgentConnection {
            source: mut agent_source,
            sink: agent_sink,
        } = match self.connector.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::error!(error = %e, "Could not reach agent endpoint");
                telephony.close().await;
                return Err(e);
            }
        };
        let agent = Link::new("agent", agent_sink);

        let profile = &self.config.profile;
        if let Err(e) = SessionInitializer::new(profile).run(&agent).await {
            tracing::error!(error = %e, "Agent session setup failed");
            agent.close().await;
            telephony.close().await;
            return Err(e);
        }

        let session = Mutex::new(CallSession::new(call_id));
        let (ended_by, exit) = {
            let telephony_reader = TelephonyReader::new(&session, &agent, profile.audio_format);
            let agent_reader = AgentReader::new(
                &session,
                &agent,
                &telephony,
                BargeInController::new(self.config.barge_in),
                profile.audio_format,
            );

            tokio::select! {
                exit = telephony_reader.run(telephony_source.as_mut()) => (Side::Telephony, exit),
                exit = agent_reader.run(agent_source.as_mut()) => (Side::Agent, exit),
            }
        };

        match &exit {
            ReaderExit::Failed(e) => {
                tracing::warn!(side = %ended_by, error = %e, "Relay ended with an error")
            }
            other => tracing::info!(side = %ended_by, reason = %other, "Relay ended"),
        }

        agent.close().await;
        telephony.close().await;

        let session = session.into_inner();
        let summary = CallSummary {
            call_id: session.call_id().to_string(),
            stream_sid: session.stream_sid().map(str::to_owned),
            call_sid: session.call_sid().map(str::to_owned),
            ended_by,
            exit,
            duration_ms: (Utc::now() - session.started_at()).num_milliseconds(),
            stats: session.stats(),
        };
        Ok(summary)
    }
}
