//! Independent sender threads. Each worker owns its socket, its random
//! number generator and its sequence counter; nothing is shared, so
//! sequence numbers are only ordered within one worker.

use crate::synth::RecordSynth;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use flow_config::Config;
use flow_utils::unix_time::{boot_time_ms, truncate_ms};
use flowd::exporter::{DatagramSender, ExportTime, SendError, SequenceCounter, UdpSender, WireFormat};
use flowd::netflow5::RECORD_LEN;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// What a worker did before it stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub messages_sent: u64,
    pub records_sent: u64,
    pub send_failures: u64,
}

struct Worker {
    index: u32,
    records_per_second: u32,
    records_per_message: usize,
    synth: RecordSynth,
    format: WireFormat,
}

impl Worker {
    fn run<T: DatagramSender>(self, transport: T, cancel: Receiver<()>) -> WorkerSummary {
        let mut rng = SmallRng::from_os_rng();
        let sequence = SequenceCounter::new(rng.random());
        let mut summary = WorkerSummary::default();
        let mut body = Vec::with_capacity(self.records_per_message * RECORD_LEN);
        debug!("Worker {} sending {} records per second", self.index, self.records_per_second);

        loop {
            let started = Instant::now();
            let time = ExportTime::now();
            let now_ms = boot_time_ms().map(truncate_ms).unwrap_or(time.uptime_ms);
            let mut remaining = self.records_per_second as usize;
            while remaining > 0 {
                let count = remaining.min(self.records_per_message);
                body.clear();
                for _ in 0..count {
                    self.synth.record(&mut rng, now_ms).write_to(&mut body);
                }
                let message = self.format.data_message(&body, count, sequence.next(), &time);
                match transport.send(&message) {
                    Ok(()) => {
                        summary.messages_sent += 1;
                        summary.records_sent += count as u64;
                    }
                    Err(SendError::Transient(e)) => {
                        debug!("Worker {} lost a message: {e}", self.index);
                        summary.send_failures += 1;
                    }
                    Err(SendError::SocketUnusable(e)) => {
                        error!("Worker {} socket is unusable, stopping: {e}", self.index);
                        summary.send_failures += 1;
                        return summary;
                    }
                }
                remaining -= count;
            }

            // Sleep out the rest of the second, waking early on cancellation
            let wait = Duration::from_secs(1).saturating_sub(started.elapsed());
            match cancel.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return summary,
            }
        }
    }
}

/// A running set of workers.
pub struct WorkerPool {
    workers: Vec<(Sender<()>, JoinHandle<WorkerSummary>)>,
}

impl WorkerPool {
    /// Splits `flows_per_second` across workers and starts them, each
    /// with its own UDP socket.
    pub fn start(config: &Config) -> anyhow::Result<Self> {
        let target: SocketAddr = config.exporter.collector_target().parse()?;
        Self::start_with(config, |_| UdpSender::bind(0, target))
    }

    /// Like [`WorkerPool::start`], with the transport for each worker
    /// coming from `transport_for`.
    pub fn start_with<T, F>(config: &Config, mut transport_for: F) -> anyhow::Result<Self>
    where
        T: DatagramSender + 'static,
        F: FnMut(u32) -> std::io::Result<T>,
    {
        let generator = &config.generator;
        let synth = RecordSynth::new(generator)?;
        let format = WireFormat::Netflow5 {
            engine_type: config.exporter.engine_type,
            engine_id: config.exporter.engine_id,
            sampling_interval: config.exporter.sampling_interval,
        };
        let worker_count = generator.worker_count();
        info!(
            "Spawning {worker_count} workers to handle {} flows per second",
            generator.flows_per_second
        );

        let mut pool = Self { workers: Vec::new() };
        for index in 0..worker_count {
            let worker = Worker {
                index,
                records_per_second: generator.flows_for_worker(index),
                records_per_message: generator.records_per_message.max(1) as usize,
                synth: synth.clone(),
                format,
            };
            let transport = match transport_for(index) {
                Ok(transport) => transport,
                Err(e) => {
                    pool.shutdown();
                    return Err(e.into());
                }
            };
            let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(1);
            let handle = std::thread::Builder::new()
                .name(format!("Flow Gen {index}"))
                .spawn(move || worker.run(transport, cancel_rx));
            match handle {
                Ok(handle) => pool.workers.push((cancel_tx, handle)),
                Err(e) => {
                    pool.shutdown();
                    return Err(e.into());
                }
            }
        }
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Signals every worker, then waits for all of them.
    pub fn shutdown(self) -> WorkerSummary {
        let (cancels, handles): (Vec<_>, Vec<_>) = self.workers.into_iter().unzip();
        for cancel in cancels.iter() {
            let _ = cancel.try_send(());
        }
        drop(cancels);

        let mut total = WorkerSummary::default();
        for handle in handles {
            match handle.join() {
                Ok(summary) => {
                    total.messages_sent += summary.messages_sent;
                    total.records_sent += summary.records_sent;
                    total.send_failures += summary.send_failures;
                }
                Err(_) => error!("A generator worker panicked"),
            }
        }
        total
    }
}
