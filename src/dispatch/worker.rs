use std::sync::Arc;
use std::thread;
use std::time::{Instant, SystemTime};

use tokio::sync::{broadcast, mpsc};

use crate::dispatch::task::{Completed, QueueItem, Report, Task};
use crate::metrics::Metrics;
use crate::sdk::MotionSdk;

/// Capacity of the error broadcast channel. Lagging subscribers lose the
/// oldest reports, they are diagnostics and not control flow.
const ERROR_CHANNEL_CAPACITY: usize = 64;

/// The single dedicated thread that serially drains the task queue.
///
/// All drive-link commands funnel through this worker, which is what
/// serializes hardware access: tasks execute strictly in submission order
/// and never concurrently. Successful reports leave on the completion
/// channel paired with their callback; failed reports leave on the error
/// broadcast channel.
///
/// The thread is running from construction. [`stop`](Self::stop) enqueues
/// the shutdown sentinel and joins: everything enqueued before the sentinel
/// still executes, in order, before the thread exits. A panic inside an
/// operation is a programming error and terminates the thread without a
/// report, the worker makes no attempt to catch it.
pub struct DispatchWorker {
    queue_tx: mpsc::UnboundedSender<QueueItem>,
    errored_tx: broadcast::Sender<Report>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DispatchWorker {
    /// Spawn the worker thread.
    ///
    /// Returns the worker handle and the receiver of the completion channel.
    /// The caller (the service) owns draining that channel and invoking the
    /// callbacks on its own thread.
    pub fn spawn(
        sdk: Arc<dyn MotionSdk>,
        metrics: Arc<Metrics>,
    ) -> (Self, mpsc::UnboundedReceiver<Completed>) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel::<QueueItem>();
        let (completed_tx, completed_rx) = mpsc::unbounded_channel::<Completed>();
        let (errored_tx, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);

        let loop_errored_tx = errored_tx.clone();
        let handle = thread::Builder::new()
            .name("dispatch-worker".to_string())
            .spawn(move || run_loop(queue_rx, sdk, completed_tx, loop_errored_tx, metrics))
            .expect("failed to spawn dispatch worker thread");

        (
            Self {
                queue_tx,
                errored_tx,
                handle: Some(handle),
            },
            completed_rx,
        )
    }

    /// Enqueue a task. Never blocks; the queue is unbounded.
    ///
    /// A task submitted after the worker has stopped (or died) is dropped
    /// with a warning, there is no one left to execute it.
    pub fn submit(&self, task: Task) {
        if self
            .queue_tx
            .send(QueueItem::Task(task))
            .is_err()
        {
            tracing::warn!("task submitted after worker shutdown, dropping");
        }
    }

    /// Subscribe to reports of failed tasks.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<Report> {
        self.errored_tx.subscribe()
    }

    /// Whether the worker thread is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Enqueue the shutdown sentinel and join the worker thread.
    ///
    /// Blocks until every task enqueued before this call has executed and
    /// the thread has exited. Idempotent.
    pub fn stop(&mut self) {
        let _ = self.queue_tx.send(QueueItem::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("dispatch worker thread panicked");
            }
        }
    }
}

impl Drop for DispatchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The worker loop: block on the queue, execute, report, repeat.
fn run_loop(
    mut queue_rx: mpsc::UnboundedReceiver<QueueItem>,
    sdk: Arc<dyn MotionSdk>,
    completed_tx: mpsc::UnboundedSender<Completed>,
    errored_tx: broadcast::Sender<Report>,
    metrics: Arc<Metrics>,
) {
    tracing::debug!("dispatch worker started");

    while let Some(item) = queue_rx.blocking_recv() {
        let task = match item {
            QueueItem::Task(task) => task,
            QueueItem::Shutdown => break,
        };

        let Task {
            operation,
            callback,
        } = task;
        let name = operation.name();
        let subject = operation.target();

        let timestamp = SystemTime::now();
        let started = Instant::now();
        let result = operation.execute(sdk.as_ref());
        let duration = started.elapsed();

        metrics.record_execution_time(duration);

        match result {
            Ok(output) => {
                metrics.record_task_completed();
                tracing::debug!(
                    operation = name,
                    ?duration,
                    "task completed"
                );
                let report = Report {
                    subject,
                    operation_name: name.to_string(),
                    output: Some(output),
                    timestamp,
                    duration,
                    error: None,
                };
                // The receiver dropping means the service is gone; the
                // callback can never be delivered anywhere else.
                if completed_tx.send(Completed { callback, report }).is_err() {
                    tracing::warn!(operation = name, "completion channel closed, report dropped");
                }
            }
            Err(error) => {
                metrics.record_task_failed();
                tracing::error!(
                    operation = name,
                    subject = subject.map(|d| d.alias()),
                    ?duration,
                    %error,
                    "task failed"
                );
                let report = Report {
                    subject,
                    operation_name: name.to_string(),
                    output: None,
                    timestamp,
                    duration,
                    error: Some(error),
                };
                // No subscribers is fine, the error was already logged.
                let _ = errored_tx.send(report);
            }
        }
    }

    tracing::debug!("dispatch worker stopped");
}
