//! Drives one exporter instance. A capture thread feeds the flow table
//! in bounded windows while this thread exports on the active-timeout
//! tick and re-announces the template on its own tick.

use crate::capture::{PacketSource, SourceState};
use crate::exporter::{BatchExporter, DatagramSender, ExportError, ExportReport};
use crate::flow_data::{FlowTable, PacketEvent};
use crate::stats::ExporterStats;
use crate::template::TemplateManager;
use crossbeam_channel::{select, Receiver};
use flow_config::{Config, EvictionPolicy, TimeoutConfig};
use flow_utils::unix_time::boot_time_ms;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Exporting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub active_timeout: Duration,
    pub inactive_timeout: Duration,
    pub template_interval: Duration,
    pub eviction_policy: EvictionPolicy,
}

impl From<&TimeoutConfig> for Timings {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            active_timeout: config.active_timeout(),
            inactive_timeout: config.inactive_timeout(),
            template_interval: config.template_interval(),
            eviction_policy: config.eviction_policy,
        }
    }
}

pub struct Scheduler<T: DatagramSender> {
    table: Arc<Mutex<FlowTable>>,
    exporter: BatchExporter<T>,
    templates: TemplateManager,
    timings: Timings,
    stats: Arc<ExporterStats>,
    last_template: Option<Instant>,
    phase: Phase,
}

impl<T: DatagramSender> Scheduler<T> {
    pub fn new(config: &Config, transport: T, stats: Arc<ExporterStats>) -> anyhow::Result<Self> {
        let templates = TemplateManager::from_config(config)?;
        let exporter = BatchExporter::new(&config.exporter, &templates, transport, stats.clone())?;
        Ok(Self {
            table: Arc::new(Mutex::new(FlowTable::new())),
            exporter,
            templates,
            timings: Timings::from(&config.timeouts),
            stats,
            last_template: None,
            phase: Phase::Collecting,
        })
    }

    /// Replaces the configured timings, which only come in whole seconds.
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn table(&self) -> Arc<Mutex<FlowTable>> {
        self.table.clone()
    }

    /// Runs until `shutdown` fires (or its sender is dropped) or the
    /// source is exhausted, then stops capture, flushes every remaining
    /// flow and closes the transport.
    pub fn run<S: PacketSource + 'static>(mut self, source: S, shutdown: Receiver<()>) -> anyhow::Result<()> {
        info!(
            "Exporting {} with {:?} eviction, active timeout {:?}",
            self.templates.protocol(),
            self.timings.eviction_policy,
            self.timings.active_timeout
        );

        // Collectors need the template before the first data message
        self.maybe_announce();

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        let capture = {
            let table = self.table.clone();
            let templates = self.templates.clone();
            let stats = self.stats.clone();
            let budget = self.timings.active_timeout;
            std::thread::Builder::new()
                .name("Flow Capture".to_string())
                .spawn(move || {
                    capture_loop(source, budget, &stop_rx, &table, &templates, &stats);
                    let _ = done_tx.send(());
                })?
        };

        let export_tick = crossbeam_channel::tick(self.timings.active_timeout);
        let template_tick = crossbeam_channel::tick(self.timings.template_interval);
        loop {
            select! {
                recv(shutdown) -> _ => {
                    info!("Shutdown requested");
                    break;
                }
                recv(done_rx) -> _ => {
                    info!("Packet source finished");
                    break;
                }
                recv(export_tick) -> _ => {
                    self.maybe_announce();
                    self.timed_export();
                }
                recv(template_tick) -> _ => self.maybe_announce(),
            }
        }

        // Stop ingestion before the final pass so nothing lands in the
        // table after it has been drained.
        drop(stop_tx);
        if capture.join().is_err() {
            error!("Flow capture thread panicked");
        }
        match self.export_pass(boot_now_ms(), true) {
            Ok(report) => info!("Final export: {} flows in {} messages", report.flows, report.messages),
            Err(e) => error!("Final export failed: {e}"),
        }
        drop(self.exporter.into_transport());
        info!("Exporter stopped. {}", self.stats.summary());
        Ok(())
    }

    /// Sends the template if the interval has passed or it never went
    /// out. A lost announcement is retried on the next check.
    pub fn maybe_announce(&mut self) {
        if !self.templates.needs_announcement() {
            return;
        }
        let now = Instant::now();
        if !TemplateManager::should_reannounce(now, self.last_template, self.timings.template_interval) {
            return;
        }
        match self.exporter.announce_template(&self.templates) {
            Ok(true) => self.last_template = Some(now),
            Ok(false) => {}
            Err(e) => error!("Unable to announce template: {e}"),
        }
    }

    fn timed_export(&mut self) {
        match self.export_pass(boot_now_ms(), false) {
            Ok(report) => {
                if report.send_failures > 0 {
                    warn!(
                        "Export pass lost {} of {} messages",
                        report.send_failures,
                        report.messages + report.send_failures
                    );
                }
            }
            Err(e) => error!("Export pass halted: {e}"),
        }
        debug!("{}", self.stats.summary());
    }

    /// Takes flows out of the table according to the eviction policy
    /// (or all of them when `final_pass`) and exports them. The table
    /// lock is only held while removing flows.
    pub fn export_pass(&mut self, now_ms: u64, final_pass: bool) -> Result<ExportReport, ExportError> {
        self.phase = Phase::Exporting;
        let flows = {
            let mut table = self.table.lock();
            if final_pass || self.timings.eviction_policy == EvictionPolicy::DrainAll {
                table.drain_all()
            } else {
                table.evict_idle(now_ms, self.timings.inactive_timeout)
            }
        };
        debug!("Export pass with {} flows", flows.len());
        let result = self.exporter.export(&flows);
        self.phase = Phase::Collecting;
        result
    }
}

fn capture_loop<S: PacketSource>(
    mut source: S,
    budget: Duration,
    stop: &Receiver<()>,
    table: &Mutex<FlowTable>,
    templates: &TemplateManager,
    stats: &ExporterStats,
) {
    let mut sink = |event: PacketEvent| {
        if templates.accepts(&event.key()) {
            table.lock().ingest(event);
            ExporterStats::add(&stats.packets_ingested, 1);
        } else {
            ExporterStats::add(&stats.packets_dropped, 1);
        }
    };
    loop {
        match source.deliver(budget, stop, &mut sink) {
            Ok(SourceState::Open) => {}
            Ok(SourceState::Stopped) => return,
            Ok(SourceState::Exhausted) => {
                info!("Packet source exhausted");
                return;
            }
            Err(e) => {
                error!("Packet source failed: {e}");
                return;
            }
        }
    }
}

fn boot_now_ms() -> u64 {
    match boot_time_ms() {
        Ok(ms) => ms,
        Err(e) => {
            warn!("Boot clock unavailable: {e}");
            0
        }
    }
}
