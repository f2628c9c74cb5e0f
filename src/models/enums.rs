use serde::{Deserialize, Serialize};
use std::fmt;

/// The two drives addressed by the application.
///
/// Doubles as the drive alias used by the SDK: `Drive::Left.alias() == "Left"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Drive {
    Left,
    Right,
}

impl Drive {
    /// The SDK servo alias for this drive.
    pub fn alias(&self) -> &'static str {
        match self {
            Drive::Left => "Left",
            Drive::Right => "Right",
        }
    }

    /// Resolve a drive from its SDK alias, if it is one of ours.
    pub fn from_alias(alias: &str) -> Option<Drive> {
        match alias {
            "Left" => Some(Drive::Left),
            "Right" => Some(Drive::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

/// Fieldbus protocol used to reach the drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionProtocol {
    CANopen,
    EtherCAT,
}

impl fmt::Display for ConnectionProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionProtocol::CANopen => f.write_str("CANopen"),
            ConnectionProtocol::EtherCAT => f.write_str("EtherCAT"),
        }
    }
}

/// Supported CAN transceiver hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanDevice {
    Kvaser,
    Pcan,
    Ixxat,
}

impl CanDevice {
    /// SDK identifier string for the transceiver.
    pub fn as_sdk_str(&self) -> &'static str {
        match self {
            CanDevice::Kvaser => "kvaser",
            CanDevice::Pcan => "pcan",
            CanDevice::Ixxat => "ixxat",
        }
    }
}

/// CAN bus baudrates accepted by the drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanBaudrate {
    Baudrate1M,
    Baudrate500K,
    Baudrate250K,
    Baudrate125K,
}

impl CanBaudrate {
    pub fn bits_per_second(&self) -> u32 {
        match self {
            CanBaudrate::Baudrate1M => 1_000_000,
            CanBaudrate::Baudrate500K => 500_000,
            CanBaudrate::Baudrate250K => 250_000,
            CanBaudrate::Baudrate125K => 125_000,
        }
    }
}

/// Drive operation modes we switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationMode {
    ProfilePosition,
    ProfileVelocity,
    Homing,
}
