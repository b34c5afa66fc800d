//! # Render Command
//!
//! File: cli/src/commands/render.rs
//!
//! Runs assistant markup through the rendering pipeline without opening a
//! conversation. Handy for checking how a configured rule response will look.
//!
use anyhow::Context;
use clap::{Parser, ValueEnum};
use gurukul_chat::chat::render::{html, parse_markup, terminal::TerminalRenderer};
use gurukul_chat::core::error::Result;
use tokio::io::AsyncReadExt;
use tracing::debug;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderFormat {
    Html,
    Text,
    /// The typed spans as JSON.
    Spans,
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Markup to render. Read from stdin when omitted.
    content: Option<String>,
    #[arg(long, value_enum, default_value_t = RenderFormat::Html)]
    format: RenderFormat,
}

pub async fn handle_render(args: RenderArgs) -> Result<()> {
    let content = match args.content {
        Some(content) => content,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read markup from stdin")?;
            buffer.trim_end_matches('\n').to_string()
        }
    };
    let spans = parse_markup(&content);
    debug!("Parsed {} span(s)", spans.len());

    let output = match args.format {
        RenderFormat::Html => html::spans_to_html(&spans),
        RenderFormat::Text => TerminalRenderer::new("", false).spans(&spans),
        RenderFormat::Spans => {
            serde_json::to_string_pretty(&spans).context("Failed to serialise spans")?
        }
    };
    println!("{}", output);
    Ok(())
}
