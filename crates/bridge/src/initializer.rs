//! Agent session setup

use voice_relay_config::SessionProfile;
use voice_relay_core::{
    AgentCommand, ConversationItem, Modality, Result, SessionUpdate, TurnDetection,
};

use crate::Link;

/// Configures a freshly connected agent session from a [`SessionProfile`]
pub struct SessionInitializer<'a> {
    profile: &'a SessionProfile,
}

impl<'a> SessionInitializer<'a> {
    pub fn new(profile: &'a SessionProfile) -> Self {
        Self { profile }
    }

    /// The `session.update` payload
    pub fn session_update(&self) -> SessionUpdate {
        let profile = self.profile;
        SessionUpdate {
            turn_detection: TurnDetection::ServerVad,
            input_audio_format: profile.audio_format,
            output_audio_format: profile.audio_format,
            voice: profile.voice.clone(),
            language: profile.language.clone(),
            instructions: profile.instructions.clone(),
            modalities: vec![Modality::Text, Modality::Audio],
            temperature: profile.temperature,
        }
    }

    /// Setup messages in send order: session update, optional greeting, response request
    pub fn commands(&self) -> Vec<AgentCommand> {
        let mut commands = vec![AgentCommand::SessionUpdate {
            session: self.session_update(),
        }];

        if let Some(greeting) = self.profile.greeting.as_deref() {
            commands.push(AgentCommand::ConversationItemCreate {
                item: ConversationItem::assistant_text(greeting),
            });
        }
        commands.push(AgentCommand::ResponseCreate);
        commands
    }

    /// Send the setup messages on the agent link
    pub async fn run(&self, agent: &Link) -> Result<()> {
        for command in self.commands() {
            agent.send(&command).await?;
            tracing::debug!(kind = command.kind(), "Sent agent setup message");
        }

        tracing::info!(
            voice = %self.profile.voice,
            language = ?self.profile.language,
            greeting = self.profile.greeting.is_some(),
            "Agent session configured"
        );
        Ok(())
    }
}
