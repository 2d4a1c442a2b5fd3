use anyhow::{Context, Result};
use flow_config::{load_config, Config};
use flow_utils::logging::set_console_logging;
use flowd::capture::{spawn_json_reader, ChannelPacketSource};
use flowd::exporter::UdpSender;
use flowd::scheduler::Scheduler;
use flowd::stats::ExporterStats;
use signal_hook::{
  consts::{SIGINT, SIGTERM},
  iterator::Signals,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};

// Use JemAllocator only on supported platforms
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use jemallocator::Jemalloc;

// Use JemAllocator only on supported platforms
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// The first argument, if any, names the configuration file.
fn read_config() -> Result<Config> {
  let config = match std::env::args().nth(1) {
    Some(path) => Config::load(Path::new(&path))?,
    None => load_config()?,
  };
  Ok(config)
}

fn main() -> Result<()> {
  // Set up logging
  set_console_logging(LevelFilter::WARN)?;

  let config = read_config()?;
  let target: SocketAddr = config
    .exporter
    .collector_target()
    .parse()
    .with_context(|| format!("Invalid collector address {}", config.exporter.collector_target()))?;
  let transport = UdpSender::bind(config.exporter.source_port, target)
    .with_context(|| format!("Unable to open a UDP socket for {target}"))?;
  info!("Sending {} flows to {target} from {}", config.exporter.protocol, transport.local_addr()?);

  let stats = Arc::new(ExporterStats::default());
  let scheduler = Scheduler::new(&config, transport, stats.clone())?;

  // Packet events arrive from the capture helper as JSON lines
  let (packet_tx, packet_rx) = crossbeam_channel::bounded(config.capture.channel_capacity);
  let _reader = spawn_json_reader(&config.capture, packet_tx, stats)?;
  let source = ChannelPacketSource::new(packet_rx);

  // Signals become a single shutdown event for the scheduler
  let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
  let mut signals = Signals::new([SIGINT, SIGTERM])?;
  std::thread::Builder::new().name("Signal Handler".to_string()).spawn(move || {
    if let Some(sig) = signals.forever().next() {
      match sig {
        SIGINT => warn!("Terminating on SIGINT"),
        SIGTERM => warn!("Terminating on SIGTERM"),
        _ => warn!("Terminating on signal {sig}"),
      }
      let _ = shutdown_tx.send(());
    }
  })?;

  // The reader thread may still be blocked on its input; it dies with
  // the process.
  scheduler.run(source, shutdown_rx)
}
