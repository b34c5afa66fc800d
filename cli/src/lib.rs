//! # Gurukul Chat Library
//!
//! File: cli/src/lib.rs
//!
//! ## Overview
//!
//! The eYogi Gurukul chat assistant as a library: the conversation state
//! machine, the classification contract with its scripted implementation,
//! the rendering pipeline, and the configuration that wires them together.
//! The `gurukul-chat` binary is one host for it; integration tests are
//! another.
//!
//! - `chat`: the assistant itself
//! - `core`: configuration, errors, templating
//!
pub mod chat;
pub mod core;
