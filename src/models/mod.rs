//! Data models shared between the service layer and its UI consumers.
//!
//! - [`Drive`], [`ConnectionProtocol`], [`CanDevice`], [`CanBaudrate`],
//!   [`OperationMode`]: closed enums describing the hardware topology.
//! - [`ConnectionModel`]: the link parameters a connect operation consumes.
//!
//! All models are `Clone + Serialize + Deserialize` so the UI layer can
//! persist form state and the operations can carry owned copies across the
//! worker-thread boundary.

pub mod connection;
pub mod enums;

pub use connection::ConnectionModel;
pub use enums::{CanBaudrate, CanDevice, ConnectionProtocol, Drive, OperationMode};
