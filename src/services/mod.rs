//! The service layer: submission API and auxiliary-thread lifecycle.
//!
//! [`MotionService`] is the only way UI code reaches the hardware. It owns
//! the dispatch worker (one per service instance), turns each domain
//! request into an [`Operation`](crate::dispatch::Operation) value from
//! [`ops`], and manages the per-drive [`PollerThread`]s and per-flash
//! [`BootloaderThread`]s that run outside the serialized queue.
//!
//! # Concurrency model
//!
//! - Everything touching the drive command link goes through the worker, in
//!   strict FIFO order.
//! - One poller per drive alias, sampling independently of the queue.
//! - One bootloader thread per flash, unordered with everything else.
//! - Callbacks never run on the worker thread: the consumer drains
//!   [`MotionService::process_completed`] from its own loop.

pub mod bootloader;
pub mod motion;
pub mod ops;
pub mod poller;

pub use bootloader::BootloaderThread;
pub use motion::MotionService;
pub use poller::{PollerRegister, PollerSample, PollerThread};
