//! # Ask Command
//!
//! File: cli/src/commands/ask.rs
//!
//! Opens a conversation, submits every question before any reply arrives,
//! waits for all replies, and prints the transcript. Replies appear in the
//! order they resolved.
//!
//! ```bash
//! gurukul-chat ask --no-delay "How do I enroll in a course?" "What is the fee structure?"
//! gurukul-chat ask --format html "Tell me an interesting fact"
//! ```
//!
use super::session::{self, SessionArgs};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use futures_util::future::join_all;
use gurukul_chat::chat::render::{self, html, terminal::TerminalRenderer};
use gurukul_chat::chat::Conversation;
use gurukul_chat::core::config::Config;
use gurukul_chat::core::error::Result;
use std::io::IsTerminal;
use tracing::{info, warn};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TranscriptFormat {
    Text,
    Html,
    Json,
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Questions to send. Blank questions are skipped.
    #[arg(required = true)]
    questions: Vec<String>,
    /// Transcript output format.
    #[arg(long, value_enum, default_value_t = TranscriptFormat::Text)]
    format: TranscriptFormat,
    #[command(flatten)]
    session: SessionArgs,
}

pub async fn handle_ask(args: AskArgs, config: &Config) -> Result<()> {
    info!("Handling ask command with {} question(s)", args.questions.len());
    let conversation = session::open_conversation(config, &args.session, None)?;

    let pending: Vec<_> = args
        .questions
        .iter()
        .filter_map(|q| conversation.submit(q))
        .collect();
    if pending.is_empty() {
        warn!("No non-empty questions were given");
    }
    for outcome in join_all(pending).await {
        outcome.context("Reply task failed")?;
    }

    println!("{}", format_transcript(&conversation, args.format)?);
    conversation.close();
    Ok(())
}

fn format_transcript(conversation: &Conversation, format: TranscriptFormat) -> Result<String> {
    let messages = conversation.messages();
    let output = match format {
        TranscriptFormat::Json => serde_json::to_string_pretty(&messages)
            .context("Failed to serialise transcript as JSON")?,
        TranscriptFormat::Html => html::transcript_to_html(&render::render_log(&messages)),
        TranscriptFormat::Text => {
            let renderer =
                TerminalRenderer::new(conversation.assistant_name(), std::io::stdout().is_terminal());
            render::render_log(&messages)
                .iter()
                .map(|m| renderer.message(m))
                .collect::<Vec<_>>()
                .join("\n\n")
        }
    };
    Ok(output)
}
