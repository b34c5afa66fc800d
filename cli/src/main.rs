//! # Gurukul Chat Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! This file is the entry point for the `gurukul-chat` terminal host. It:
//! - parses command-line arguments with Clap
//! - sets up logging from the verbosity flags (or `RUST_LOG`)
//! - loads the configuration once
//! - routes to the command handlers in `commands`
//!
//! ## Examples
//!
//! ```bash
//! # Interactive session as a signed-in student
//! gurukul-chat chat --name "Priya Shah" --role student
//!
//! # One-shot questions, replies as JSON, no typing delay
//! gurukul-chat ask --no-delay --format json "What is the fee structure?"
//!
//! # Render assistant markup as HTML
//! echo '**Namaste** [courses](/courses)' | gurukul-chat render
//! ```
//!
use clap::Parser;
use gurukul_chat::core::config;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "gurukul-chat",
    about = "🙏 eYogi Gurukul chat assistant",
    long_about = "Chat with the eYogi Gurukul assistant from the terminal, ask one-shot \n\
                  questions, or render assistant markup.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Use this configuration file instead of the user/project files.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "c")]
    Chat(commands::chat::ChatArgs),
    #[command(alias = "a")]
    Ask(commands::ask::AskArgs),
    #[command(alias = "r")]
    Render(commands::render::RenderArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => match cli.command {
            Commands::Chat(args) => commands::chat::handle_chat(args, &cfg).await,
            Commands::Ask(args) => commands::ask::handle_ask(args, &cfg).await,
            Commands::Render(args) => commands::render::handle_render(args).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
