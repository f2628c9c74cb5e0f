//! The domain operations the service submits to the dispatch worker.
//!
//! Each operation is a plain value: its fields are the inputs captured at
//! submission time, [`Operation::execute`] is the blocking body that runs on
//! the worker thread. Validation failures and SDK failures surface as
//! [`DriveError`] values and become error reports; they never unwind.

use camino::Utf8PathBuf;

use crate::dispatch::{Operation, Output};
use crate::error::DriveError;
use crate::models::{ConnectionModel, ConnectionProtocol, Drive, OperationMode};
use crate::sdk::MotionSdk;
use crate::services::poller::{self, PollerRegistry};

/// Connect the configured drives over the protocol the model names.
///
/// Validates the model first (dictionary present, dictionary protocol
/// matching the link protocol, distinct node ids), then connects each
/// configured drive and applies its optional register configuration.
pub struct ConnectDrives {
    pub model: ConnectionModel,
}

impl Operation for ConnectDrives {
    fn name(&self) -> &'static str {
        "connect_drives"
    }

    fn execute(self: Box<Self>, sdk: &dyn MotionSdk) -> Result<Output, DriveError> {
        let model = self.model;

        let dictionary = model
            .dictionary
            .as_ref()
            .ok_or_else(|| DriveError::MissingResource("No dictionary selected.".to_string()))?;

        let dictionary_protocol = sdk.dictionary_interface(dictionary)?;
        if dictionary_protocol != model.connection {
            return Err(DriveError::Configuration(
                "Communication type does not match the dictionary type.".to_string(),
            ));
        }

        // Also rejects a model with no ids at all: None == None.
        if model.left_id == model.right_id {
            return Err(DriveError::InvalidValue(
                "Node IDs cannot be the same.".to_string(),
            ));
        }

        for (drive, id, config) in model.configured_drives() {
            match model.connection {
                ConnectionProtocol::CANopen => sdk.connect_canopen(
                    model.can_device,
                    model.can_baudrate,
                    dictionary,
                    id,
                    drive.alias(),
                )?,
                ConnectionProtocol::EtherCAT => {
                    sdk.connect_ethercat(model.interface_index, id, dictionary, drive.alias())?
                }
            }
            if let Some(config) = config {
                sdk.load_configuration(config, drive.alias())?;
            }
            tracing::info!(drive = drive.alias(), node_id = id, "drive connected");
        }

        Ok(Output::Unit)
    }
}

/// Scan the network for drives, failing when fewer than `minimum_nodes`
/// respond (connecting needs two, flashing only one).
pub struct ScanServos {
    pub model: ConnectionModel,
    pub minimum_nodes: usize,
}

impl Operation for ScanServos {
    fn name(&self) -> &'static str {
        "scan_servos"
    }

    fn execute(self: Box<Self>, sdk: &dyn MotionSdk) -> Result<Output, DriveError> {
        let nodes = match self.model.connection {
            ConnectionProtocol::CANopen => {
                sdk.scan_canopen(self.model.can_device, self.model.can_baudrate)?
            }
            ConnectionProtocol::EtherCAT => sdk.scan_ethercat(self.model.interface_index)?,
        };

        if nodes.len() < self.minimum_nodes {
            let found = if nodes.is_empty() {
                "(none)".to_string()
            } else {
                format!("{nodes:?}")
            };
            return Err(DriveError::Connection(format!(
                "Scan expected to find at least {} nodes. Nodes found: {found}",
                self.minimum_nodes
            )));
        }

        Ok(Output::Nodes(nodes))
    }
}

/// Disconnect every servo that is still alive: disable its motor, stop its
/// poller, drop the link.
pub struct DisconnectDrives {
    pub pollers: PollerRegistry,
}

impl Operation for DisconnectDrives {
    fn name(&self) -> &'static str {
        "disconnect_drives"
    }

    fn execute(self: Box<Self>, sdk: &dyn MotionSdk) -> Result<Output, DriveError> {
        for servo in sdk.servos() {
            if sdk.is_alive(&servo) {
                sdk.motor_disable(&servo)?;
                poller::stop_registered(&self.pollers, &servo);
                sdk.disconnect(&servo)?;
                tracing::info!(servo = %servo, "drive disconnected");
            }
        }
        Ok(Output::Unit)
    }
}

/// Disable the motors of every connected drive. Queued like any other task,
/// so it runs after whatever command is currently executing.
pub struct EmergencyStop;

impl Operation for EmergencyStop {
    fn name(&self) -> &'static str {
        "emergency_stop"
    }

    fn execute(self: Box<Self>, sdk: &dyn MotionSdk) -> Result<Output, DriveError> {
        for servo in sdk.servos() {
            if sdk.is_alive(&servo) {
                sdk.motor_disable(&servo)?;
            }
        }
        Ok(Output::Unit)
    }
}

/// Put one drive in profile-velocity mode and enable its motor.
pub struct EnableMotor {
    pub drive: Drive,
}

impl Operation for EnableMotor {
    fn name(&self) -> &'static str {
        "enable_motor"
    }

    fn target(&self) -> Option<Drive> {
        Some(self.drive)
    }

    fn execute(self: Box<Self>, sdk: &dyn MotionSdk) -> Result<Output, DriveError> {
        sdk.set_operation_mode(OperationMode::ProfileVelocity, self.drive.alias())?;
        sdk.motor_enable(self.drive.alias())?;
        Ok(Output::Unit)
    }
}

/// Flash firmware onto one drive through the serialized queue.
///
/// The queue-serialized variant; for flashing several drives in parallel use
/// [`BootloaderThread`](crate::services::BootloaderThread) instead.
pub struct InstallFirmware {
    pub drive: Drive,
    pub firmware: Utf8PathBuf,
    pub node_id: u16,
    /// Called with 0..=100 as the flash advances, on the worker thread.
    pub progress: Box<dyn FnMut(u8) + Send>,
}

impl Operation for InstallFirmware {
    fn name(&self) -> &'static str {
        "install_firmware"
    }

    fn target(&self) -> Option<Drive> {
        Some(self.drive)
    }

    fn execute(self: Box<Self>, sdk: &dyn MotionSdk) -> Result<Output, DriveError> {
        let mut progress = self.progress;
        sdk.install_firmware(
            &self.firmware,
            self.node_id,
            self.drive.alias(),
            &mut *progress,
        )?;
        Ok(Output::Unit)
    }
}
