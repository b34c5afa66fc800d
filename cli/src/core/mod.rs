//! # Gurukul Chat Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces shared by the chat core and the terminal host:
//! - `config`: configuration loading, merging, and validation
//! - `error`: error types and the crate `Result` alias
//! - `templating`: Tera rendering for greetings and scripted responses
//!
//! ```rust
//! use gurukul_chat::core::config; // For loading configuration
//! use gurukul_chat::core::error::{ChatError, Result}; // For error handling
//! use gurukul_chat::core::templating; // For greeting templates
//! ```
//!
pub mod config;
pub mod error;
pub mod templating;
