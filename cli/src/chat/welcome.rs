//! # Greetings
//!
//! File: cli/src/chat/welcome.rs
//!
//! Builds the synthetic assistant messages that seed a log: the welcome
//! greeting when a conversation opens and the shorter greeting left behind
//! by `clear()`.
//!
use crate::chat::classifier::UserProfile;
use crate::chat::message::{Message, ReplyMeta};
use crate::chat::render::markup::strip_markup;
use crate::core::config::AssistantConfig;
use crate::core::error::Result;
use crate::core::templating;
use std::collections::HashMap;

/// Name used when the visitor is anonymous or has no usable name.
pub const ANONYMOUS_NAME: &str = "friend";

/// The visitor's first name as it may appear inside assistant markup.
pub(crate) fn greeting_name(user: Option<&UserProfile>) -> String {
    let name = user
        .and_then(UserProfile::first_name)
        .map(strip_markup)
        .unwrap_or_default();
    let name = name.trim();
    if name.is_empty() {
        ANONYMOUS_NAME.to_string()
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Greeter {
    welcome_template: String,
    assistant: String,
    brand: String,
    /// The cleared greeting does not depend on the visitor, so it is rendered
    /// once up front and `clear()` stays infallible.
    cleared_text: String,
}

impl Greeter {
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let mut greeter = Self {
            welcome_template: config.welcome_template.clone(),
            assistant: config.name.clone(),
            brand: config.brand.clone(),
            cleared_text: String::new(),
        };
        greeter.cleared_text = templating::render_str(
            "assistant.cleared_template",
            &config.cleared_template,
            &greeter.context(None),
        )?;
        Ok(greeter)
    }

    fn context(&self, user: Option<&UserProfile>) -> HashMap<String, String> {
        HashMap::from([
            ("first_name".to_string(), greeting_name(user)),
            ("assistant".to_string(), self.assistant.clone()),
            ("brand".to_string(), self.brand.clone()),
        ])
    }

    pub fn welcome(&self, user: Option<&UserProfile>) -> Result<Message> {
        let content = templating::render_str(
            "assistant.welcome_template",
            &self.welcome_template,
            &self.context(user),
        )?;
        Ok(Message::welcome(
            content,
            ReplyMeta {
                persona: Some("student".to_string()),
                intent: Some("greeting".to_string()),
                ..Default::default()
            },
        ))
    }

    pub fn cleared(&self) -> Message {
        Message::welcome(self.cleared_text.clone(), ReplyMeta::default())
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant
    }
}
