//! Docflow CLI: automated documentation updates.
//!
//! Runs an ordered pipeline of steps that draft new content with a
//! text-generation backend, rewrite the tracked documentation files, and
//! commit the result.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
