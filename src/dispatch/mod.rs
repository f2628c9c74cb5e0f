//! The asynchronous task-dispatch engine.
//!
//! This is the core of the crate: a single always-on worker thread that
//! drains a FIFO queue of [`Task`]s, executes each one against the SDK,
//! times it, classifies failures, and hands the resulting [`Report`] back
//! across the thread boundary.
//!
//! # Components
//!
//! - [`Task`] / [`Report`]: the unit of work and the unit of result.
//! - [`Operation`]: the capability a domain operation implements to be
//!   dispatchable.
//! - [`DispatchWorker`]: owns the queue and the worker thread.
//!
//! # Delivery contract
//!
//! Successful tasks travel as [`Completed`] (callback + report) over an
//! unbounded mpsc channel; the consumer drains it on its own thread and
//! invokes the callback there, never on the worker. Failed tasks are logged
//! and broadcast as bare reports on the error channel. Both channels
//! preserve submission order because there is exactly one producer, the
//! worker.

pub mod task;
pub mod worker;

pub use task::{Completed, Operation, Output, QueueItem, Report, ReportCallback, Task};
pub use worker::DispatchWorker;
