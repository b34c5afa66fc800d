//! # Interactive Chat Command
//!
//! File: cli/src/commands/chat.rs
//!
//! ## Overview
//!
//! Hosts a conversation in the terminal, the way the chat overlay hosts it
//! in the browser. Input lines are submitted as messages; lines starting
//! with `/` are commands:
//!
//! - `/clear`: reset the conversation
//! - `/voice`: toggle voice capture
//! - `/questions`: list quick questions
//! - `/signout`: forget the visitor for later messages
//! - `/help`: list commands
//! - `/quit`: leave
//!
//! While the log holds only the greeting, typing a quick question's number
//! sends that question.
//!
//! `/quit` leaves at once. When stdin ends instead, outstanding replies are
//! awaited and printed first.
//!
//! The view redraws from `Conversation::subscribe`, so replies (including
//! ones triggered by voice transcripts) print as soon as they land.
//!
use super::session::{self, SessionArgs};
use anyhow::Context;
use clap::Parser;
use gurukul_chat::chat::render::{render_message, terminal::TerminalRenderer};
use gurukul_chat::chat::{Conversation, MessageId};
use gurukul_chat::core::config::Config;
use gurukul_chat::core::error::{ChatError, Result};
use std::collections::HashSet;
use std::io::IsTerminal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Message sent automatically when the session opens.
    #[arg(long)]
    initial: Option<String>,
    /// Disable ANSI styling.
    #[arg(long)]
    no_color: bool,
    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplInput {
    Say(String),
    Pick(usize),
    Clear,
    Voice,
    Questions,
    SignOut,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

/// `offered` is the number of quick questions currently on offer.
fn parse_input(line: &str, offered: usize) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    if let Some(command) = line.strip_prefix('/') {
        return match command.trim().to_lowercase().as_str() {
            "clear" => ReplInput::Clear,
            "voice" | "mic" => ReplInput::Voice,
            "questions" | "q" => ReplInput::Questions,
            "signout" => ReplInput::SignOut,
            "help" | "?" => ReplInput::Help,
            "quit" | "exit" | "bye" => ReplInput::Quit,
            other => ReplInput::Unknown(other.to_string()),
        };
    }
    match line.parse::<usize>() {
        Ok(n) if n >= 1 && n <= offered => ReplInput::Pick(n - 1),
        _ => ReplInput::Say(line.to_string()),
    }
}

const HELP: &str = "Commands: /clear  /voice  /questions  /signout  /help  /quit";

/// Prints log entries that have not been shown yet, plus the typing and
/// listening indicators when they switch on.
struct View {
    renderer: TerminalRenderer,
    shown: HashSet<MessageId>,
    composing_shown: bool,
    listening_shown: bool,
}

impl View {
    fn new(renderer: TerminalRenderer) -> Self {
        Self {
            renderer,
            shown: HashSet::new(),
            composing_shown: false,
            listening_shown: false,
        }
    }

    fn refresh(&mut self, conversation: &Conversation) {
        for message in conversation.messages() {
            if self.shown.insert(message.id().clone()) {
                println!("\n{}", self.renderer.message(&render_message(&message)));
            }
        }

        let composing = conversation.is_composing();
        if composing && !self.composing_shown {
            println!("{}", self.renderer.typing_indicator());
        }
        self.composing_shown = composing;

        let listening = conversation.is_listening();
        if listening && !self.listening_shown {
            println!("🎙️  Listening…");
        }
        self.listening_shown = listening;
    }
}

fn print_quick_questions(conversation: &Conversation) {
    let questions = conversation.quick_questions();
    if questions.is_empty() {
        println!("Quick questions are offered only at the start of a conversation.");
        return;
    }
    println!("\nQuick Questions (type a number):");
    for (i, question) in questions.iter().enumerate() {
        println!("  {}. {}", i + 1, question);
    }
}

pub async fn handle_chat(args: ChatArgs, config: &Config) -> Result<()> {
    info!("Handling chat command");
    let conversation = session::open_conversation(config, &args.session, args.initial.as_deref())?;
    let color = !args.no_color && std::io::stdout().is_terminal();
    let mut view = View::new(TerminalRenderer::new(conversation.assistant_name(), color));
    let mut changes = conversation.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Chat with {}! {}", conversation.assistant_name(), HELP);
    view.refresh(&conversation);
    print_quick_questions(&conversation);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line.context("Failed to read from stdin")? {
                    Some(line) => line,
                    None => {
                        // Input ended; let outstanding replies land before leaving.
                        debug!("Stdin closed, waiting for outstanding replies");
                        conversation.wait_idle().await;
                        view.refresh(&conversation);
                        break;
                    }
                };
                match parse_input(&line, conversation.quick_questions().len()) {
                    ReplInput::Quit => break,
                    ReplInput::Empty => {}
                    ReplInput::Say(text) => {
                        conversation.submit(&text);
                    }
                    ReplInput::Pick(index) => {
                        if let Some(question) = conversation.quick_questions().get(index).cloned() {
                            conversation.submit(&question);
                        }
                    }
                    ReplInput::Clear => {
                        conversation.clear();
                        println!("\n(conversation cleared)");
                    }
                    ReplInput::Voice => match conversation.toggle_voice_capture() {
                        Ok(listening) => debug!("Voice capture toggled (listening={})", listening),
                        Err(e) => match e.downcast_ref::<ChatError>() {
                            Some(ChatError::VoiceUnavailable) => println!("⚠️  {}", e),
                            _ => return Err(e),
                        },
                    },
                    ReplInput::Questions => print_quick_questions(&conversation),
                    ReplInput::SignOut => {
                        conversation.sign_out();
                        println!("Signed out. Later messages are sent anonymously.");
                    }
                    ReplInput::Help => println!("{}", HELP),
                    ReplInput::Unknown(command) => {
                        println!("Unknown command '/{}'. {}", command, HELP);
                    }
                }
                view.refresh(&conversation);
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                view.refresh(&conversation);
            }
        }
    }

    if conversation.is_composing() {
        debug!("Quit with replies outstanding; they are discarded");
    }
    conversation.close();
    println!("🙏 Goodbye!");
    Ok(())
}
