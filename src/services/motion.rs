use std::sync::{Arc, Mutex};

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use tokio::sync::{broadcast, mpsc};

use crate::config::ServiceConfig;
use crate::dispatch::{Completed, DispatchWorker, Operation, Report, Task};
use crate::metrics::Metrics;
use crate::models::{ConnectionModel, Drive};
use crate::sdk::MotionSdk;
use crate::services::bootloader::BootloaderThread;
use crate::services::ops::{
    ConnectDrives, DisconnectDrives, EmergencyStop, EnableMotor, InstallFirmware, ScanServos,
};
use crate::services::poller::{self, PollerRegister, PollerRegistry, PollerThread};

/// The single point of submission for drive operations.
///
/// Owns exactly one [`DispatchWorker`] (the serialized hardware channel),
/// the poller registry, and the completion channel. Submission never blocks
/// and never returns a result synchronously: success reports come back
/// through [`process_completed`](Self::process_completed), failure reports
/// through [`subscribe_errors`](Self::subscribe_errors).
///
/// The UI layer is expected to call `process_completed` from its own event
/// loop; that is what keeps callbacks off the worker thread.
pub struct MotionService {
    sdk: Arc<dyn MotionSdk>,
    worker: DispatchWorker,
    completed_rx: Mutex<mpsc::UnboundedReceiver<Completed>>,
    pollers: PollerRegistry,
    metrics: Arc<Metrics>,
    config: ServiceConfig,
}

impl MotionService {
    pub fn new(sdk: Arc<dyn MotionSdk>) -> Self {
        Self::with_config(sdk, ServiceConfig::default())
    }

    pub fn with_config(sdk: Arc<dyn MotionSdk>, config: ServiceConfig) -> Self {
        let metrics = Arc::new(Metrics::new());
        let (worker, completed_rx) = DispatchWorker::spawn(Arc::clone(&sdk), Arc::clone(&metrics));
        Self {
            sdk,
            worker,
            completed_rx: Mutex::new(completed_rx),
            pollers: Arc::new(Mutex::new(IndexMap::new())),
            metrics,
            config,
        }
    }

    /// Queue an operation for serialized execution.
    ///
    /// `callback` is invoked with the report exactly once on success, by
    /// whichever thread drains [`process_completed`](Self::process_completed).
    /// On failure the report goes to the error subscribers instead.
    pub fn submit<F>(&self, operation: Box<dyn Operation>, callback: F)
    where
        F: FnOnce(Report) + Send + 'static,
    {
        self.worker
            .submit(Task::new(operation, Box::new(callback)));
    }

    // Domain operations. Each builds the operation value and queues it; the
    // bodies run on the worker thread, see `ops`.

    pub fn connect_drives<F>(&self, callback: F, model: ConnectionModel)
    where
        F: FnOnce(Report) + Send + 'static,
    {
        self.submit(Box::new(ConnectDrives { model }), callback);
    }

    /// Scan for drives, expecting at least the configured minimum number of
    /// nodes.
    pub fn scan_servos<F>(&self, callback: F, model: ConnectionModel)
    where
        F: FnOnce(Report) + Send + 'static,
    {
        self.scan_servos_expecting(callback, model, self.config.scan.minimum_nodes);
    }

    /// Scan with an explicit node minimum (flashing needs one, connecting
    /// needs two).
    pub fn scan_servos_expecting<F>(&self, callback: F, model: ConnectionModel, minimum_nodes: usize)
    where
        F: FnOnce(Report) + Send + 'static,
    {
        self.submit(
            Box::new(ScanServos {
                model,
                minimum_nodes,
            }),
            callback,
        );
    }

    pub fn disconnect_drives<F>(&self, callback: F)
    where
        F: FnOnce(Report) + Send + 'static,
    {
        self.submit(
            Box::new(DisconnectDrives {
                pollers: Arc::clone(&self.pollers),
            }),
            callback,
        );
    }

    pub fn emergency_stop<F>(&self, callback: F)
    where
        F: FnOnce(Report) + Send + 'static,
    {
        self.submit(Box::new(EmergencyStop), callback);
    }

    pub fn enable_motor<F>(&self, callback: F, drive: Drive)
    where
        F: FnOnce(Report) + Send + 'static,
    {
        self.submit(Box::new(EnableMotor { drive }), callback);
    }

    /// Flash firmware through the serialized queue. `progress` runs on the
    /// worker thread; keep it cheap.
    pub fn install_firmware<F, P>(
        &self,
        callback: F,
        progress: P,
        drive: Drive,
        firmware: Utf8PathBuf,
        node_id: u16,
    ) where
        F: FnOnce(Report) + Send + 'static,
        P: FnMut(u8) + Send + 'static,
    {
        self.submit(
            Box::new(InstallFirmware {
                drive,
                firmware,
                node_id,
                progress: Box::new(progress),
            }),
            callback,
        );
    }

    /// Drain the completion channel, invoking each pending callback on the
    /// calling thread. Returns how many callbacks ran.
    ///
    /// Callbacks fire in task-submission order.
    pub fn process_completed(&self) -> usize {
        let mut completed_rx = self.completed_rx.lock().unwrap();
        let mut count = 0;
        while let Ok(completed) = completed_rx.try_recv() {
            Self::execute_callback(completed);
            count += 1;
        }
        count
    }

    /// Deliver one report to its callback.
    pub fn execute_callback(completed: Completed) {
        (completed.callback)(completed.report);
    }

    /// Subscribe to reports of failed tasks.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<Report> {
        self.worker.subscribe_errors()
    }

    /// Whether the worker thread is alive. `false` after [`stop`](Self::stop)
    /// or after a fatal (non-domain) failure killed it.
    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Names of the network interfaces usable for EtherCAT links.
    ///
    /// Synchronous passthrough: it reads host state, not the drive link, so
    /// it does not go through the queue.
    pub fn interface_names(&self) -> Vec<String> {
        self.sdk.interface_names()
    }

    /// Create (and start) a poller for `alias` with the configured timing
    /// defaults.
    pub fn create_poller(&self, alias: &str, registers: Vec<PollerRegister>) -> Arc<PollerThread> {
        let poller = &self.config.poller;
        self.create_poller_with(
            alias,
            registers,
            poller.sampling_time(),
            poller.refresh_time(),
            poller.buffer_size,
        )
    }

    /// Create (and start) a poller for `alias` with explicit parameters.
    ///
    /// At most one live poller per alias: a running poller already
    /// registered under `alias` is stopped before the new one replaces it.
    pub fn create_poller_with(
        &self,
        alias: &str,
        registers: Vec<PollerRegister>,
        sampling_time: std::time::Duration,
        refresh_time: std::time::Duration,
        buffer_size: usize,
    ) -> Arc<PollerThread> {
        poller::stop_registered(&self.pollers, alias);

        let poller = Arc::new(PollerThread::spawn(
            Arc::clone(&self.sdk),
            alias,
            registers,
            sampling_time,
            refresh_time,
            buffer_size,
            Arc::clone(&self.metrics),
        ));
        self.pollers
            .lock()
            .unwrap()
            .insert(alias.to_string(), Arc::clone(&poller));
        poller
    }

    /// Stop the poller for `alias` if one is registered and running; no-op
    /// otherwise.
    pub fn stop_poller(&self, alias: &str) {
        poller::stop_registered(&self.pollers, alias);
    }

    /// The poller currently registered for `alias`, if any.
    pub fn poller(&self, alias: &str) -> Option<Arc<PollerThread>> {
        self.pollers.lock().unwrap().get(alias).cloned()
    }

    /// Spawn an untracked firmware-flash thread, independent of the queue
    /// and of other flashes. The caller owns the handle.
    pub fn create_bootloader(
        &self,
        drive: Drive,
        firmware: Utf8PathBuf,
        node_id: u16,
    ) -> BootloaderThread {
        BootloaderThread::spawn(Arc::clone(&self.sdk), drive, firmware, node_id)
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Stop the service: drain and join the worker, stop owned pollers.
    ///
    /// Blocks until the worker thread has exited; every task enqueued before
    /// this call still executes (its report stays retrievable through
    /// [`process_completed`](Self::process_completed)). Idempotent.
    pub fn stop(&mut self) {
        let was_running = self.worker.is_running();
        self.worker.stop();
        for (_, poller) in self.pollers.lock().unwrap().iter() {
            poller.stop();
        }
        if was_running {
            self.metrics.log_summary();
        }
    }
}

impl Drop for MotionService {
    fn drop(&mut self) {
        self.stop();
    }
}
