//! # Chat Message Model
//!
//! File: cli/src/chat/message.rs
//!
//! ## Overview
//!
//! A `Message` is one conversational turn. Messages are immutable once
//! built: fields are private and exposed through accessors, and only the
//! assistant constructors can attach reply metadata (persona, intent,
//! confidence, supplementary fact).
//!
use crate::chat::classifier::ClassifierReply;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Stable identifier for a message, used for list identity only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    fn generate(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Assistant => write!(f, "assistant"),
        }
    }
}

/// Optional metadata carried by assistant replies.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplyMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplementary_fact: Option<String>,
}

impl ReplyMeta {
    pub fn is_empty(&self) -> bool {
        self.persona.is_none()
            && self.intent.is_none()
            && self.confidence.is_none()
            && self.supplementary_fact.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    id: MessageId,
    speaker: Speaker,
    content: String,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    meta: ReplyMeta,
}

impl Message {
    fn build(prefix: &str, speaker: Speaker, content: String, meta: ReplyMeta) -> Self {
        Self {
            id: MessageId::generate(prefix),
            speaker,
            content,
            created_at: Utc::now(),
            meta,
        }
    }

    /// A user turn. User messages never carry metadata.
    pub fn user(content: impl Into<String>) -> Self {
        Self::build("user", Speaker::User, content.into(), ReplyMeta::default())
    }

    /// An assistant turn with explicit metadata.
    pub fn assistant(content: impl Into<String>, meta: ReplyMeta) -> Self {
        Self::build("bot", Speaker::Assistant, content.into(), meta)
    }

    /// An assistant turn built from a classifier reply.
    pub fn from_reply(reply: ClassifierReply) -> Self {
        let meta = ReplyMeta {
            persona: reply.persona,
            intent: reply.intent,
            confidence: reply.confidence,
            supplementary_fact: reply.did_you_know,
        };
        Self::assistant(reply.message, meta)
    }

    /// The metadata-free reply used when classification fails.
    pub fn fallback(content: impl Into<String>) -> Self {
        Self::build("error", Speaker::Assistant, content.into(), ReplyMeta::default())
    }

    /// A greeting seeded into a fresh or cleared log.
    pub fn welcome(content: impl Into<String>, meta: ReplyMeta) -> Self {
        Self::build("welcome", Speaker::Assistant, content.into(), meta)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn meta(&self) -> &ReplyMeta {
        &self.meta
    }

    pub fn persona(&self) -> Option<&str> {
        self.meta.persona.as_deref()
    }

    pub fn intent(&self) -> Option<&str> {
        self.meta.intent.as_deref()
    }

    pub fn confidence(&self) -> Option<f64> {
        self.meta.confidence
    }

    pub fn supplementary_fact(&self) -> Option<&str> {
        self.meta.supplementary_fact.as_deref()
    }

    pub fn is_user(&self) -> bool {
        self.speaker == Speaker::User
    }
}
