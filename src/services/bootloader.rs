use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use camino::Utf8PathBuf;
use tokio::sync::watch;

use crate::error::DriveError;
use crate::models::Drive;
use crate::sdk::MotionSdk;

/// One firmware installation on its own thread.
///
/// Flashing a drive takes minutes and the drives are independently
/// addressed, so each flash gets a dedicated thread that runs in parallel
/// with the dispatch queue and with other flashes. The thread is not
/// tracked by the service; the caller holds the handle.
///
/// A flash is not interruptible: [`join`](Self::join) waits for the outcome.
pub struct BootloaderThread {
    drive: Drive,
    running: Arc<AtomicBool>,
    progress_rx: watch::Receiver<u8>,
    handle: Mutex<Option<thread::JoinHandle<Result<(), DriveError>>>>,
}

impl BootloaderThread {
    /// Spawn the flash thread, already running.
    pub fn spawn(
        sdk: Arc<dyn MotionSdk>,
        drive: Drive,
        firmware: Utf8PathBuf,
        node_id: u16,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let (progress_tx, progress_rx) = watch::channel(0u8);

        let flash_running = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name(format!("bootloader-{}", drive.alias()))
            .spawn(move || {
                tracing::info!(drive = drive.alias(), %firmware, node_id, "firmware installation started");
                let mut report_progress = |percent: u8| {
                    let _ = progress_tx.send(percent);
                };
                let result =
                    sdk.install_firmware(&firmware, node_id, drive.alias(), &mut report_progress);
                flash_running.store(false, Ordering::SeqCst);
                match &result {
                    Ok(()) => {
                        tracing::info!(drive = drive.alias(), "firmware installation finished")
                    }
                    Err(error) => {
                        tracing::error!(drive = drive.alias(), %error, "firmware installation failed")
                    }
                }
                result
            })
            .expect("failed to spawn bootloader thread");

        Self {
            drive,
            running,
            progress_rx,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    /// Watch the installation progress, 0 to 100.
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wait for the flash to finish and return its outcome.
    ///
    /// Returns `None` if the thread was already joined. A panic on the flash
    /// thread is a programming error and is re-raised here.
    pub fn join(&self) -> Option<Result<(), DriveError>> {
        let handle = self.handle.lock().unwrap().take()?;
        match handle.join() {
            Ok(result) => Some(result),
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}
