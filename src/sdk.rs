//! The boundary to the hardware-control SDK.
//!
//! The dispatch engine never talks to hardware directly; it executes
//! operations against this trait. Production code wires in the real SDK
//! bindings, tests wire in a fake. Implementations are expected to be
//! internally synchronized (`Send + Sync`): the dispatch worker serializes
//! all command traffic on one drive link, while pollers and bootloader
//! threads touch physically independent channels.

use camino::Utf8Path;

use crate::error::DriveError;
use crate::models::{CanBaudrate, CanDevice, ConnectionProtocol, OperationMode};

/// Handle to the motion-control SDK.
///
/// Drives are addressed by their alias (see [`Drive::alias`](crate::models::Drive::alias)).
/// Every fallible method fails with a [`DriveError`], the closed set of
/// recoverable communication failures; SDK bugs should panic, not be mapped
/// into it.
pub trait MotionSdk: Send + Sync {
    /// Connect a servo over CANopen and register it under `alias`.
    fn connect_canopen(
        &self,
        device: CanDevice,
        baudrate: CanBaudrate,
        dictionary: &Utf8Path,
        node_id: u16,
        alias: &str,
    ) -> Result<(), DriveError>;

    /// Connect a servo over EtherCAT and register it under `alias`.
    fn connect_ethercat(
        &self,
        interface_index: usize,
        slave_id: u16,
        dictionary: &Utf8Path,
        alias: &str,
    ) -> Result<(), DriveError>;

    /// Scan the CAN bus for node ids.
    fn scan_canopen(
        &self,
        device: CanDevice,
        baudrate: CanBaudrate,
    ) -> Result<Vec<u16>, DriveError>;

    /// Scan an EtherCAT interface for slave ids.
    fn scan_ethercat(&self, interface_index: usize) -> Result<Vec<u16>, DriveError>;

    fn disconnect(&self, alias: &str) -> Result<(), DriveError>;

    /// Aliases of all currently registered servos, in registration order.
    fn servos(&self) -> Vec<String>;

    /// Whether the link to `alias` is still responding.
    fn is_alive(&self, alias: &str) -> bool;

    fn motor_enable(&self, alias: &str) -> Result<(), DriveError>;

    fn motor_disable(&self, alias: &str) -> Result<(), DriveError>;

    fn set_operation_mode(&self, mode: OperationMode, alias: &str) -> Result<(), DriveError>;

    /// Apply a saved register configuration file to a connected servo.
    fn load_configuration(&self, config: &Utf8Path, alias: &str) -> Result<(), DriveError>;

    /// Which protocol a dictionary file is written for.
    ///
    /// Dictionary parsing is SDK territory; the service layer only compares
    /// the result against the requested protocol.
    fn dictionary_interface(&self, dictionary: &Utf8Path)
        -> Result<ConnectionProtocol, DriveError>;

    /// Read one register value from a connected servo.
    fn read_register(&self, uid: &str, axis: u16, alias: &str) -> Result<f64, DriveError>;

    /// Flash a firmware file onto the drive with node id `node_id`.
    ///
    /// `progress` is called with 0..=100 as the installation advances. This
    /// call blocks for the whole flash, which is why it runs either on the
    /// dispatch worker (sequential) or on a dedicated bootloader thread.
    fn install_firmware(
        &self,
        firmware: &Utf8Path,
        node_id: u16,
        alias: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<(), DriveError>;

    /// Names of the network interfaces usable for EtherCAT links.
    fn interface_names(&self) -> Vec<String>;
}
