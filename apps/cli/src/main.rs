//! heritagekb CLI: enrich heritage-site listings into a structured dataset.
//!
//! Lists sites per category, enriches each one from secondary sources and
//! writes the output document, checkpointing as it goes.

mod commands;
mod progress;

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
