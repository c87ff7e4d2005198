//! docdistill CLI: crawl a documentation site into prompt/completion datasets.
//!
//! Walks every page reachable from a root URL, builds a page tree per page,
//! and writes the trees plus flattened records as JSON, JSONL and CSV.

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
