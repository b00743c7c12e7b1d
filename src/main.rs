//! Markpool CLI: render a directory of Markdown through a pool of Markdoc workers.

use anyhow::Result;
use clap::Parser;
use markpool::engine::arg_parser::Cli;
use markpool::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
