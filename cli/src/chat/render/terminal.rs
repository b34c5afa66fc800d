//! # Terminal Back-end
//!
//! File: cli/src/chat/render/terminal.rs
//!
//! Plain-text rendering for the terminal host. With `color` on, bold spans
//! and links use ANSI attributes; otherwise bold text is written bare and
//! links become `label (href)`.
//!
use super::{RenderedMessage, Span};
use crate::chat::message::Speaker;
use std::fmt::Write;

const BOLD: &str = "\x1b[1m";
const UNDERLINE: &str = "\x1b[4m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const INDENT: &str = "    ";

#[derive(Debug, Clone)]
pub struct TerminalRenderer {
    pub color: bool,
    pub assistant_label: String,
    pub user_label: String,
}

impl TerminalRenderer {
    pub fn new(assistant_label: impl Into<String>, color: bool) -> Self {
        Self {
            color,
            assistant_label: assistant_label.into(),
            user_label: "You".to_string(),
        }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", style, text, RESET)
        } else {
            text.to_string()
        }
    }

    /// Spans as text. Breaks continue on an indented line.
    pub fn spans(&self, spans: &[Span]) -> String {
        let mut out = String::new();
        for span in spans {
            match span {
                Span::Text { text } => out.push_str(&text.replace('\n', &format!("\n{}", INDENT))),
                Span::Bold { text } => out.push_str(&self.styled(BOLD, text)),
                Span::Link { label, href } => {
                    let _ = write!(out, "{} ({})", self.styled(UNDERLINE, label), href);
                }
                Span::Break => {
                    out.push('\n');
                    out.push_str(INDENT);
                }
            }
        }
        out
    }

    pub fn message(&self, message: &RenderedMessage) -> String {
        let label = match message.speaker {
            Speaker::User => &self.user_label,
            Speaker::Assistant => &self.assistant_label,
        };
        let mut out = format!(
            "{} {}:\n{}{}",
            self.styled(DIM, &format!("[{}]", message.display_time())),
            self.styled(BOLD, label),
            INDENT,
            self.spans(&message.body)
        );
        if !message.badges.is_empty() {
            let badges: Vec<String> = message
                .badges
                .iter()
                .map(|b| format!("[{}]", b.label()))
                .collect();
            let _ = write!(out, "\n{}{}", INDENT, self.styled(DIM, &badges.join(" ")));
        }
        if let Some(fact) = &message.fact {
            let _ = write!(out, "\n{}💡 Did You Know? {}", INDENT, fact);
        }
        out
    }

    pub fn typing_indicator(&self) -> String {
        self.styled(DIM, &format!("{} is typing…", self.assistant_label))
    }
}
