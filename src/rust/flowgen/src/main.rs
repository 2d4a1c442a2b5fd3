//! Synthetic NetFlow v5 load generator. Sends random records to the
//! configured collector at a fixed rate until interrupted.

mod ports;
mod synth;
mod worker;

use anyhow::Result;
use flow_config::{load_config, Config};
use flow_utils::logging::set_console_logging;
use signal_hook::{
  consts::{SIGINT, SIGTERM},
  iterator::Signals,
};
use std::path::Path;
use tracing::{info, level_filters::LevelFilter, warn};
use worker::WorkerPool;

fn main() -> Result<()> {
  set_console_logging(LevelFilter::INFO)?;

  let config = match std::env::args().nth(1) {
    Some(path) => Config::load(Path::new(&path))?,
    None => load_config()?,
  };
  info!(
    "Generating {} flows per second towards {}",
    config.generator.flows_per_second,
    config.exporter.collector_target()
  );

  let pool = WorkerPool::start(&config)?;
  info!("{} workers running", pool.len());

  // Block until the first SIGINT/SIGTERM, then stop every worker
  let mut signals = Signals::new([SIGINT, SIGTERM])?;
  if let Some(sig) = signals.forever().next() {
    warn!("Stopping generator on signal {sig}");
  }
  let total = pool.shutdown();
  info!(
    "Sent {} records in {} messages ({} failed)",
    total.records_sent, total.messages_sent, total.send_failures
  );
  Ok(())
}
