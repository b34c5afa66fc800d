//! # Gurukul Chat Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! The terminal host's commands. Each defines its Clap arguments struct and
//! an async `handle_*` function that `main.rs` routes to.
//!
//! - `chat`: interactive session
//! - `ask`: one-shot questions with a printed transcript
//! - `render`: assistant markup → HTML / terminal text / spans
//! - `session`: shared visitor flags and conversation wiring
//!

/// Interactive terminal chat session.
pub mod chat;
/// One-shot questions; prints the resulting transcript.
pub mod ask;
/// Renders assistant markup without a conversation.
pub mod render;
/// Visitor profile flags and conversation construction shared by `chat` and `ask`.
pub mod session;
