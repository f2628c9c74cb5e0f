use std::fmt;
use std::time::{Duration, SystemTime};

use crate::error::DriveError;
use crate::models::Drive;
use crate::sdk::MotionSdk;

/// Return value of an executed operation.
///
/// A closed enum instead of a type parameter so that one report type can
/// travel through one queue regardless of which operation produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// The operation only has side effects.
    Unit,
    Int(i64),
    Float(f64),
    /// Node / slave ids found by a scan.
    Nodes(Vec<u16>),
    Text(String),
}

/// A unit of work the dispatch worker knows how to run.
///
/// Each domain operation (connect, scan, enable motor, ...) is a value
/// implementing this trait: its fields are the inputs, [`execute`] is the
/// blocking body that runs on the worker thread. Failures from the closed
/// [`DriveError`] set are returned and reported; anything else should panic
/// and will take the worker thread down with it, by design.
///
/// [`execute`]: Operation::execute
pub trait Operation: Send {
    /// Stable name identifying the operation in reports and logs.
    fn name(&self) -> &'static str;

    /// Which drive the operation concerns, when there is a single one.
    fn target(&self) -> Option<Drive> {
        None
    }

    /// Run the operation against the SDK. Consumes the operation; a task is
    /// executed at most once.
    fn execute(self: Box<Self>, sdk: &dyn MotionSdk) -> Result<Output, DriveError>;
}

/// Callback invoked with the report of a completed task.
///
/// Called at most once per submitted task, on the thread that drains the
/// completion channel, never on the worker thread.
pub type ReportCallback = Box<dyn FnOnce(Report) + Send>;

/// An operation paired with its completion callback, queued for the worker.
///
/// Immutable once enqueued; ownership moves from the submitter to the worker.
pub struct Task {
    pub operation: Box<dyn Operation>,
    pub callback: ReportCallback,
}

impl Task {
    pub fn new(operation: Box<dyn Operation>, callback: ReportCallback) -> Self {
        Self {
            operation,
            callback,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("operation", &self.operation.name())
            .finish_non_exhaustive()
    }
}

/// The timed, classified outcome of executing one [`Task`].
///
/// Exactly one of `output` / `error` is `Some`. Built by the worker right
/// after the operation returns and handed off immediately; the worker keeps
/// nothing.
#[derive(Debug, Clone)]
pub struct Report {
    /// Drive the task concerned, if the operation names one.
    pub subject: Option<Drive>,

    /// Name of the operation that ran.
    pub operation_name: String,

    /// The operation's return value; `None` when it failed.
    pub output: Option<Output>,

    /// Wall-clock time execution began.
    pub timestamp: SystemTime,

    /// Elapsed execution time.
    pub duration: Duration,

    /// The classified failure; `None` on success.
    pub error: Option<DriveError>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A successful report paired with the callback that wants it.
///
/// Sent over the completion channel so the callback runs on the consumer's
/// thread and not on the worker.
pub struct Completed {
    pub callback: ReportCallback,
    pub report: Report,
}

/// What travels on the task queue. `Shutdown` is the sentinel that ends the
/// worker loop; tasks enqueued after it are never executed.
pub enum QueueItem {
    Task(Task),
    Shutdown,
}
