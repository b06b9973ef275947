mod abundance;
mod cli;
mod config;
mod coverage;
mod database;
mod hits;
mod pool;
mod process;
mod report;
mod scoring;
mod solver;
mod store;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let cfg = cli::handle_cli().with_context(|| "Error processing command line arguments")?;
    process::process_hits(&cfg)
}
