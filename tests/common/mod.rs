//! A scriptable in-memory SDK for integration tests.
// Not every test binary uses every knob.
#![allow(dead_code)]

use std::sync::Mutex;

use camino::Utf8Path;
use indexmap::IndexMap;

use motionctl::error::DriveError;
use motionctl::models::{CanBaudrate, CanDevice, ConnectionProtocol, OperationMode};
use motionctl::sdk::MotionSdk;

#[derive(Default)]
struct FakeState {
    /// alias -> alive
    servos: IndexMap<String, bool>,
    /// Every SDK call, in order, as "method(args)".
    calls: Vec<String>,
    scan_result: Option<Result<Vec<u16>, DriveError>>,
    dictionary_protocol: Option<Result<ConnectionProtocol, DriveError>>,
    register_reads: u64,
    install_error: Option<DriveError>,
}

/// Fake drive SDK: records calls, returns scripted results.
pub struct FakeSdk {
    state: Mutex<FakeState>,
}

impl FakeSdk {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_servos(aliases: &[&str]) -> Self {
        let sdk = Self::new();
        {
            let mut state = sdk.state.lock().unwrap();
            for alias in aliases {
                state.servos.insert(alias.to_string(), true);
            }
        }
        sdk
    }

    pub fn script_scan(&self, result: Result<Vec<u16>, DriveError>) {
        self.state.lock().unwrap().scan_result = Some(result);
    }

    pub fn script_dictionary(&self, result: Result<ConnectionProtocol, DriveError>) {
        self.state.lock().unwrap().dictionary_protocol = Some(result);
    }

    pub fn script_install_error(&self, error: DriveError) {
        self.state.lock().unwrap().install_error = Some(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl MotionSdk for FakeSdk {
    fn connect_canopen(
        &self,
        device: CanDevice,
        _baudrate: CanBaudrate,
        _dictionary: &Utf8Path,
        node_id: u16,
        alias: &str,
    ) -> Result<(), DriveError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("connect_canopen({}, {node_id}, {alias})", device.as_sdk_str()));
        state.servos.insert(alias.to_string(), true);
        Ok(())
    }

    fn connect_ethercat(
        &self,
        interface_index: usize,
        slave_id: u16,
        _dictionary: &Utf8Path,
        alias: &str,
    ) -> Result<(), DriveError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("connect_ethercat({interface_index}, {slave_id}, {alias})"));
        state.servos.insert(alias.to_string(), true);
        Ok(())
    }

    fn scan_canopen(
        &self,
        _device: CanDevice,
        _baudrate: CanBaudrate,
    ) -> Result<Vec<u16>, DriveError> {
        self.record("scan_canopen".to_string());
        self.state
            .lock()
            .unwrap()
            .scan_result
            .clone()
            .unwrap_or(Ok(vec![]))
    }

    fn scan_ethercat(&self, interface_index: usize) -> Result<Vec<u16>, DriveError> {
        self.record(format!("scan_ethercat({interface_index})"));
        self.state
            .lock()
            .unwrap()
            .scan_result
            .clone()
            .unwrap_or(Ok(vec![]))
    }

    fn disconnect(&self, alias: &str) -> Result<(), DriveError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("disconnect({alias})"));
        state.servos.shift_remove(alias);
        Ok(())
    }

    fn servos(&self) -> Vec<String> {
        self.state.lock().unwrap().servos.keys().cloned().collect()
    }

    fn is_alive(&self, alias: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .servos
            .get(alias)
            .copied()
            .unwrap_or(false)
    }

    fn motor_enable(&self, alias: &str) -> Result<(), DriveError> {
        self.record(format!("motor_enable({alias})"));
        Ok(())
    }

    fn motor_disable(&self, alias: &str) -> Result<(), DriveError> {
        self.record(format!("motor_disable({alias})"));
        Ok(())
    }

    fn set_operation_mode(&self, mode: OperationMode, alias: &str) -> Result<(), DriveError> {
        self.record(format!("set_operation_mode({mode:?}, {alias})"));
        Ok(())
    }

    fn load_configuration(&self, config: &Utf8Path, alias: &str) -> Result<(), DriveError> {
        self.record(format!("load_configuration({config}, {alias})"));
        Ok(())
    }

    fn dictionary_interface(
        &self,
        _dictionary: &Utf8Path,
    ) -> Result<ConnectionProtocol, DriveError> {
        self.state
            .lock()
            .unwrap()
            .dictionary_protocol
            .clone()
            .unwrap_or(Ok(ConnectionProtocol::CANopen))
    }

    fn read_register(&self, _uid: &str, _axis: u16, alias: &str) -> Result<f64, DriveError> {
        let mut state = self.state.lock().unwrap();
        if !state.servos.get(alias).copied().unwrap_or(false) {
            return Err(DriveError::ConnectionClosed(format!(
                "servo {alias} is not connected"
            )));
        }
        state.register_reads += 1;
        Ok(state.register_reads as f64)
    }

    fn install_firmware(
        &self,
        firmware: &Utf8Path,
        node_id: u16,
        alias: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<(), DriveError> {
        self.record(format!("install_firmware({firmware}, {node_id}, {alias})"));
        if let Some(error) = self.state.lock().unwrap().install_error.clone() {
            return Err(error);
        }
        for percent in [0u8, 25, 50, 75, 100] {
            progress(percent);
        }
        Ok(())
    }

    fn interface_names(&self) -> Vec<String> {
        vec!["eth0".to_string(), "eth1".to_string()]
    }
}
