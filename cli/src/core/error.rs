//! # Gurukul Chat Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout the chat core and its
//! terminal host. Most failures inside a conversation are *recovered* rather
//! than propagated (a failed classification becomes a fallback message), so
//! the variants here cover the places where an error genuinely reaches the
//! caller:
//!
//! - Configuration loading and validation
//! - Template rendering (greetings, rule responses)
//! - Classifier construction (invalid rules)
//! - Voice capture (capability missing, adapter failure)
//! - Opening a conversation outside an async runtime
//!
//! ## Architecture
//!
//! - `ChatError`: a `thiserror` enum for the specific failure kinds
//! - `Result<T>`: alias for `anyhow::Result<T>` so call sites can attach context
//!
//! ## Examples
//!
//! ```rust
//! use gurukul_chat::core::error::ChatError;
//!
//! let err = ChatError::VoiceUnavailable;
//! assert!(err.to_string().contains("not supported"));
//! ```
//!
use thiserror::Error;

/// Custom error type for the chat application.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template rendering error: {source}")]
    Template {
        #[from]
        source: tera::Error,
    },

    #[error("Invalid classifier rule '{intent}': {reason}")]
    InvalidRule { intent: String, reason: String },

    #[error("Classification failed: {0}")]
    Classification(String),

    /// Shown to the user verbatim when the host has no speech capability.
    #[error("Speech recognition is not supported in this environment.")]
    VoiceUnavailable,

    #[error("Voice capture failed: {0}")]
    VoiceCapture(String),

    #[error("A conversation must be opened inside a Tokio runtime.")]
    RuntimeMissing,
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = ChatError::Config("min_delay_ms exceeds max_delay_ms".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: min_delay_ms exceeds max_delay_ms"
        );

        let rule_err = ChatError::InvalidRule {
            intent: "fees".into(),
            reason: "no patterns".into(),
        };
        assert_eq!(
            rule_err.to_string(),
            "Invalid classifier rule 'fees': no patterns"
        );

        assert_eq!(
            ChatError::VoiceUnavailable.to_string(),
            "Speech recognition is not supported in this environment."
        );
    }

    #[test]
    fn test_downcast_from_anyhow() {
        let err: anyhow::Error = ChatError::VoiceUnavailable.into();
        assert!(matches!(
            err.downcast_ref::<ChatError>(),
            Some(ChatError::VoiceUnavailable)
        ));
    }
}
