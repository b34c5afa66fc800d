//! # Rendering Pipeline
//!
//! File: cli/src/chat/render/mod.rs
//!
//! ## Overview
//!
//! Turns `Message`s into presentation structures. Rendering is pure and
//! deterministic: it only ever reads the raw stored content, so rendering
//! the same message twice produces the same output.
//!
//! ## Architecture
//!
//! - `markup`: assistant markup → typed `Span`s
//! - `html`: spans and rendered messages → escaped HTML
//! - `terminal`: spans and rendered messages → terminal text (optional ANSI)
//!
//! User-authored content is never passed through the markup parser; it
//! always renders as a single plain-text span.
//!
use crate::chat::message::{Message, MessageId, Speaker};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

pub mod html;
pub mod markup;
pub mod terminal;

pub use markup::{parse_markup, Span};

/// A metadata badge shown under an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Badge {
    Persona(String),
    Intent(String),
    /// Whole-number percentage.
    Confidence(u8),
}

impl Badge {
    pub fn label(&self) -> String {
        match self {
            Badge::Persona(p) => p.clone(),
            Badge::Intent(i) => i.clone(),
            Badge::Confidence(pct) => format!("{}%", pct),
        }
    }
}

/// Display structure for one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedMessage {
    pub id: MessageId,
    pub speaker: Speaker,
    pub body: Vec<Span>,
    pub badges: Vec<Badge>,
    pub fact: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RenderedMessage {
    /// Local wall-clock timestamp, e.g. `Mar 4, 2025 9:05 AM`.
    pub fn display_time(&self) -> String {
        format_timestamp(self.created_at)
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%b %-d, %Y %-I:%M %p").to_string()
}

/// Rounds a [0, 1] confidence to a whole percentage. Out-of-range values
/// are clamped.
pub fn confidence_percent(confidence: f64) -> u8 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}

pub fn render_message(message: &Message) -> RenderedMessage {
    let body = match message.speaker() {
        Speaker::User if message.content().is_empty() => Vec::new(),
        Speaker::User => vec![Span::text(message.content())],
        Speaker::Assistant => parse_markup(message.content()),
    };

    let mut badges = Vec::new();
    if message.speaker() == Speaker::Assistant {
        if let Some(persona) = message.persona() {
            badges.push(Badge::Persona(persona.to_string()));
        }
        if let Some(intent) = message.intent() {
            badges.push(Badge::Intent(intent.to_string()));
        }
        if let Some(confidence) = message.confidence() {
            badges.push(Badge::Confidence(confidence_percent(confidence)));
        }
    }

    RenderedMessage {
        id: message.id().clone(),
        speaker: message.speaker(),
        body,
        badges,
        fact: message.supplementary_fact().map(str::to_string),
        created_at: message.created_at(),
    }
}

/// Renders the full ordered log.
pub fn render_log(messages: &[Message]) -> Vec<RenderedMessage> {
    messages.iter().map(render_message).collect()
}
