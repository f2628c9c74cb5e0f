use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::models::enums::{CanBaudrate, CanDevice, ConnectionProtocol, Drive};

/// Everything the connect operation needs to know about the desired link.
///
/// Built by the UI layer from its form fields and handed to
/// [`MotionService::connect_drives`](crate::services::MotionService::connect_drives).
/// A drive with no node id is simply not connected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionModel {
    /// Path to the drive dictionary file. Connecting without one fails.
    pub dictionary: Option<Utf8PathBuf>,

    /// Protocol the dictionary and the link must agree on.
    pub connection: ConnectionProtocol,

    /// Network interface index for EtherCAT links.
    #[serde(default)]
    pub interface_index: usize,

    #[serde(default = "default_can_device")]
    pub can_device: CanDevice,

    #[serde(default = "default_can_baudrate")]
    pub can_baudrate: CanBaudrate,

    /// Node / slave id per drive; `None` means the drive is not used.
    pub left_id: Option<u16>,
    pub right_id: Option<u16>,

    /// Optional per-drive configuration file applied after connecting.
    pub left_config: Option<Utf8PathBuf>,
    pub right_config: Option<Utf8PathBuf>,
}

fn default_can_device() -> CanDevice {
    CanDevice::Kvaser
}

fn default_can_baudrate() -> CanBaudrate {
    CanBaudrate::Baudrate1M
}

impl ConnectionModel {
    /// The per-drive `(drive, node id, config)` triples with an id assigned.
    pub fn configured_drives(&self) -> Vec<(Drive, u16, Option<&Utf8PathBuf>)> {
        let mut drives = Vec::new();
        if let Some(id) = self.left_id {
            drives.push((Drive::Left, id, self.left_config.as_ref()));
        }
        if let Some(id) = self.right_id {
            drives.push((Drive::Right, id, self.right_config.as_ref()));
        }
        drives
    }
}

impl Default for ConnectionModel {
    fn default() -> Self {
        Self {
            dictionary: None,
            connection: ConnectionProtocol::CANopen,
            interface_index: 0,
            can_device: default_can_device(),
            can_baudrate: default_can_baudrate(),
            left_id: None,
            right_id: None,
            left_config: None,
            right_config: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_drives_skips_unassigned() {
        let model = ConnectionModel {
            left_id: Some(31),
            ..ConnectionModel::default()
        };

        let drives = model.configured_drives();
        assert_eq!(drives.len(), 1);
        assert_eq!(drives[0].0, Drive::Left);
        assert_eq!(drives[0].1, 31);
    }

    #[test]
    fn test_configured_drives_order_is_left_then_right() {
        let model = ConnectionModel {
            left_id: Some(31),
            right_id: Some(32),
            ..ConnectionModel::default()
        };

        let drives: Vec<Drive> = model.configured_drives().iter().map(|d| d.0).collect();
        assert_eq!(drives, vec![Drive::Left, Drive::Right]);
    }
}
