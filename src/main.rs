//! # swimcube
//!
//! A command-line tool for turning SWIM acquisitions into spectral cubes.
//!
//! ## Usage
//!
//! ```bash
//! # Extract both cubes from an acquisition
//! swimcube extract run_042.d out/ --unique-swim-ids 2048 --sampling-period 1.0
//!
//! # Same, with settings from a config file
//! swimcube extract run_042.d out/ --config swimcube.toml
//!
//! # Synthetic acquisition, no vendor library required
//! swimcube demo out/
//!
//! # Inspect a written cube
//! swimcube info out/run_042_fourierdomain.parquet
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
