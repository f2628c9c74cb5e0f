use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::metrics::Metrics;
use crate::sdk::MotionSdk;

/// One register the poller reads on every sampling tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerRegister {
    /// Register UID as named in the drive dictionary.
    pub uid: String,
    #[serde(default)]
    pub axis: u16,
}

/// One reading of the whole register list.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerSample {
    /// Time since the poller started.
    pub offset: Duration,
    /// Values in register-list order.
    pub values: Vec<f64>,
}

/// Pollers registered per drive alias, owned by the service.
pub type PollerRegistry = Arc<Mutex<IndexMap<String, Arc<PollerThread>>>>;

/// Continuous register sampling for one drive, on its own thread.
///
/// The thread reads the register list every `sampling_time`, accumulates
/// readings in a ring buffer of `buffer_size`, and at least every
/// `refresh_time` broadcasts the accumulated batch to subscribers. It runs
/// outside the dispatch queue on purpose: sampling must not wait behind
/// queued commands, and each poller touches only its own drive channel.
///
/// A failed register read is logged and the sample skipped; the poller
/// keeps running. [`stop`](Self::stop) is idempotent and joins the thread.
pub struct PollerThread {
    alias: String,
    running: Arc<AtomicBool>,
    batch_tx: broadcast::Sender<Vec<PollerSample>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

/// Capacity of the sample broadcast channel, in batches.
const BATCH_CHANNEL_CAPACITY: usize = 16;

impl PollerThread {
    /// Spawn the sampling thread, already running.
    pub fn spawn(
        sdk: Arc<dyn MotionSdk>,
        alias: &str,
        registers: Vec<PollerRegister>,
        sampling_time: Duration,
        refresh_time: Duration,
        buffer_size: usize,
        metrics: Arc<Metrics>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let (batch_tx, _) = broadcast::channel(BATCH_CHANNEL_CAPACITY);

        let loop_running = Arc::clone(&running);
        let loop_tx = batch_tx.clone();
        let loop_alias = alias.to_string();
        let handle = thread::Builder::new()
            .name(format!("poller-{alias}"))
            .spawn(move || {
                sample_loop(
                    sdk,
                    loop_alias,
                    registers,
                    sampling_time,
                    refresh_time,
                    buffer_size,
                    loop_running,
                    loop_tx,
                    metrics,
                )
            })
            .expect("failed to spawn poller thread");

        Self {
            alias: alias.to_string(),
            running,
            batch_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Drive alias this poller samples.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Subscribe to sample batches.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<PollerSample>> {
        self.batch_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop sampling and join the thread. Safe to call more than once.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!(alias = %self.alias, "poller thread panicked");
            }
            tracing::debug!(alias = %self.alias, "poller stopped");
        }
    }
}

impl Drop for PollerThread {
    fn drop(&mut self) {
        self.stop();
    }
}

#[allow(clippy::too_many_arguments)]
fn sample_loop(
    sdk: Arc<dyn MotionSdk>,
    alias: String,
    registers: Vec<PollerRegister>,
    sampling_time: Duration,
    refresh_time: Duration,
    buffer_size: usize,
    running: Arc<AtomicBool>,
    batch_tx: broadcast::Sender<Vec<PollerSample>>,
    metrics: Arc<Metrics>,
) {
    tracing::debug!(%alias, registers = registers.len(), "poller started");

    let started = Instant::now();
    let mut buffer: VecDeque<PollerSample> = VecDeque::with_capacity(buffer_size);
    let mut last_emit = Instant::now();

    while running.load(Ordering::SeqCst) {
        let mut values = Vec::with_capacity(registers.len());
        let mut complete = true;
        for register in &registers {
            match sdk.read_register(&register.uid, register.axis, &alias) {
                Ok(value) => values.push(value),
                Err(error) => {
                    tracing::warn!(%alias, uid = %register.uid, %error, "register read failed, sample skipped");
                    complete = false;
                    break;
                }
            }
        }

        if complete {
            if buffer.len() == buffer_size {
                buffer.pop_front();
            }
            buffer.push_back(PollerSample {
                offset: started.elapsed(),
                values,
            });
        }

        if last_emit.elapsed() >= refresh_time && !buffer.is_empty() {
            let batch: Vec<PollerSample> = buffer.drain(..).collect();
            metrics.record_poller_batch();
            // No subscribers yet is fine; samples are best-effort.
            let _ = batch_tx.send(batch);
            last_emit = Instant::now();
        }

        thread::sleep(sampling_time);
    }
}

/// Stop the poller registered under `alias`, if there is one and it is
/// running; otherwise do nothing.
pub(crate) fn stop_registered(registry: &PollerRegistry, alias: &str) {
    let poller = registry.lock().unwrap().get(alias).cloned();
    if let Some(poller) = poller {
        if poller.is_running() {
            tracing::info!(%alias, "stopping poller");
            poller.stop();
        }
    }
}
