//! # Intent Classification Collaborator
//!
//! File: cli/src/chat/classifier.rs
//!
//! ## Overview
//!
//! The conversation hands every submitted text, together with the current
//! visitor profile, to a `Classifier` and renders whatever comes back. The
//! classifier is a black box to the conversation: it may be the scripted
//! rule engine in `chat::rules`, a remote service, or a test double.
//!
//! A failed classification is *not* an error for the caller of
//! `Conversation::submit`; the conversation converts it into a fallback
//! reply.
//!
use crate::core::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A signed-in visitor, as far as the chat assistant cares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Platform role, e.g. `student`, `parent`, `teacher`, `admin`.
    #[serde(default)]
    pub role: Option<String>,
}

impl UserProfile {
    pub fn named(full_name: impl Into<String>) -> Self {
        Self {
            full_name: Some(full_name.into()),
            ..Default::default()
        }
    }

    /// First whitespace-separated token of the full name, if any.
    pub fn first_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
    }
}

/// Structured reply produced by a classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierReply {
    pub message: String,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    /// Expected in [0, 1].
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, rename = "didYouKnow", alias = "did_you_know")]
    pub did_you_know: Option<String>,
}

impl ClassifierReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Asynchronous intent classification.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str, user: Option<&UserProfile>) -> Result<ClassifierReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        assert_eq!(UserProfile::named("Priya Shah").first_name(), Some("Priya"));
        assert_eq!(UserProfile::named("  Arjun  ").first_name(), Some("Arjun"));
        assert_eq!(UserProfile::named("   ").first_name(), None);
        assert_eq!(UserProfile::default().first_name(), None);
    }

    #[test]
    fn test_reply_deserializes_wire_names() {
        let reply: ClassifierReply = serde_json::from_str(
            r#"{"message":"hi","persona":"student","confidence":0.5,"didYouKnow":"fact"}"#,
        )
        .unwrap();
        assert_eq!(reply.persona.as_deref(), Some("student"));
        assert_eq!(reply.intent, None);
        assert_eq!(reply.did_you_know.as_deref(), Some("fact"));
    }
}
