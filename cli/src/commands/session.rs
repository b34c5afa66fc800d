//! # Session Wiring
//!
//! File: cli/src/commands/session.rs
//!
//! Builds a `Conversation` from the loaded configuration and the visitor
//! flags. The terminal has no speech API, so voice is available only when a
//! transcripts file is configured.
//!
use anyhow::Context;
use clap::Args;
use gurukul_chat::chat::{
    ChatSettings, Conversation, Greeter, Pacing, ScriptedClassifier, ScriptedRecognizer,
    SessionContext, UserProfile, VoiceCapability,
};
use gurukul_chat::core::config::{Config, VoiceConfig};
use gurukul_chat::core::error::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Visitor and pacing flags shared by `chat` and `ask`.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Full name of the signed-in visitor. Omit for an anonymous visitor.
    #[arg(long, env = "GURUKUL_CHAT_NAME")]
    pub name: Option<String>,
    /// Visitor role (student, parent, teacher, admin).
    #[arg(long)]
    pub role: Option<String>,
    /// Visitor email address.
    #[arg(long)]
    pub email: Option<String>,
    /// Show replies immediately instead of simulating typing.
    #[arg(long)]
    pub no_delay: bool,
}

impl SessionArgs {
    /// `None` when no profile flag was given.
    pub fn profile(&self) -> Option<UserProfile> {
        if self.name.is_none() && self.role.is_none() && self.email.is_none() {
            return None;
        }
        Some(UserProfile {
            full_name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        })
    }
}

fn resolve_voice(config: &VoiceConfig) -> Result<VoiceCapability> {
    if !config.enabled {
        debug!("Voice capture disabled by configuration");
        return Ok(VoiceCapability::Unavailable);
    }
    match &config.transcripts {
        Some(path) => {
            let recognizer = ScriptedRecognizer::from_file(Path::new(path))?;
            Ok(VoiceCapability::Available(Arc::new(recognizer)))
        }
        None => Ok(VoiceCapability::Unavailable),
    }
}

pub fn open_conversation(
    config: &Config,
    args: &SessionArgs,
    initial_message: Option<&str>,
) -> Result<Conversation> {
    let classifier = ScriptedClassifier::new(&config.classifier, &config.assistant)
        .context("Failed to build the scripted classifier")?;
    let greeter = Greeter::new(&config.assistant)?;

    let mut settings = ChatSettings::from_config(config);
    if args.no_delay {
        settings.pacing = Pacing::immediate();
    }

    let context = match args.profile() {
        Some(user) => SessionContext::signed_in(user)
            .with_sign_out(Arc::new(|| info!("Visitor signed out of the chat session"))),
        None => SessionContext::anonymous(),
    };

    Conversation::builder(Arc::new(classifier))
        .greeter(greeter)
        .settings(settings)
        .voice(resolve_voice(&config.voice)?)
        .context(context)
        .open(initial_message)
}
