// motionctl - Serialized task-dispatch engine for motion-control UIs
//
// This is the library crate a GUI layer builds on: it queues blocking drive
// operations onto one dedicated worker thread (strict FIFO per drive link)
// and delivers timed, classified reports back across the thread boundary.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod sdk;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{ConfigManager, ServiceConfig};
pub use dispatch::{Operation, Output, Report, Task};
pub use error::{DriveError, ErrorKind};
pub use models::{ConnectionModel, ConnectionProtocol, Drive};
pub use sdk::MotionSdk;
pub use services::{BootloaderThread, MotionService, PollerRegister, PollerThread};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
