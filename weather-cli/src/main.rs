//! Binary crate for the `weather` chatbot.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - The terminal chat session and human-friendly output

use clap::Parser;

mod chat;
mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cli::init_tracing(cmd.verbose);
    cmd.run().await
}
