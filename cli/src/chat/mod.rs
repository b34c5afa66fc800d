//! # Chat Core
//!
//! File: cli/src/chat/mod.rs
//!
//! ## Overview
//!
//! The chat assistant, leaf-first:
//! - `message`: one conversational turn
//! - `classifier`: the intent classification contract and visitor profile
//! - `rules`: the scripted classifier used by default
//! - `welcome`: greetings that seed the log
//! - `voice`: the optional speech input channel
//! - `conversation`: the state machine tying the above together
//! - `render`: presentation of messages (typed spans, HTML, terminal)
//!
//! Data flows from `Conversation::submit` (typed text or a voice transcript)
//! through the `Classifier` into a new assistant `Message`; hosts watch
//! `Conversation::subscribe` and re-render the log with `render::render_log`.
//!
pub mod classifier;
pub mod conversation;
pub mod message;
pub mod render;
pub mod rules;
pub mod voice;
pub mod welcome;

pub use classifier::{Classifier, ClassifierReply, UserProfile};
pub use conversation::{ChatSettings, ChatState, Conversation, Pacing, SessionContext};
pub use message::{Message, MessageId, ReplyMeta, Speaker};
pub use rules::ScriptedClassifier;
pub use voice::{ScriptedRecognizer, SpeechRecognizer, VoiceCapability, VoiceEvent};
pub use welcome::Greeter;
