//! Flash session orchestration
//!
//! A session owns the device and the image for one complete programming run
//! and walks a fixed sequence of states. Write and verify each get their own
//! bounded retry budget; every other step is single-attempt. The transport
//! handle is released by ownership: dropping the session (on success or on
//! the error path) closes it.

use crate::device::Touchpad;
use crate::error::{Error, Result};
use crate::protocol::{FIRMWARE_SIZE, MAX_RETRIES};
use crate::transport::FeatureTransport;

/// Phases of a programming session. `Failed` is terminal and reachable from
/// every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Erasing,
    Writing,
    Verifying,
    Provisioning,
    Finalizing,
    Done,
    Failed,
}

/// One complete erase/write/verify/provision/finalize run.
pub struct FlashSession<T: FeatureTransport> {
    device: Touchpad<T>,
    image: Vec<u8>,
    state: SessionState,
}

impl<T: FeatureTransport> FlashSession<T> {
    /// Create a session for the given image. Rejects any image that is not
    /// exactly one full firmware's worth of bytes, before touching the
    /// device.
    pub fn new(device: Touchpad<T>, image: Vec<u8>) -> Result<Self> {
        if image.len() != FIRMWARE_SIZE {
            return Err(Error::FirmwareSize {
                expected: FIRMWARE_SIZE,
                got: image.len(),
            });
        }
        Ok(Self {
            device,
            image,
            state: SessionState::Idle,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion. On any failure the session lands in
    /// `Failed` and the error propagates; the device handle is closed when
    /// the session is dropped.
    pub fn run(&mut self) -> Result<()> {
        let result = self.execute();
        if result.is_err() {
            self.state = SessionState::Failed;
        }
        result
    }

    fn execute(&mut self) -> Result<()> {
        self.state = SessionState::Erasing;
        log::info!("Erasing program pages");
        self.device.erase_program_region()?;

        self.state = SessionState::Writing;
        self.write_with_retry()?;

        self.state = SessionState::Verifying;
        self.verify_with_retry()?;

        self.state = SessionState::Provisioning;
        log::info!("Rewriting serial record");
        self.device.provision_serial()?;

        self.state = SessionState::Finalizing;
        log::info!("Ending programming mode");
        self.device.end_programming()?;

        self.state = SessionState::Done;
        Ok(())
    }

    fn write_with_retry(&mut self) -> Result<()> {
        let attempts = MAX_RETRIES + 1;
        for attempt in 1..=attempts {
            match self.device.write_firmware(&self.image) {
                Ok(()) => {
                    log::info!("Firmware written ({} bytes)", self.image.len());
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("Firmware write failed (attempt {}/{}): {}", attempt, attempts, e)
                }
            }
        }
        Err(Error::WriteRetriesExhausted { attempts })
    }

    fn verify_with_retry(&mut self) -> Result<()> {
        let attempts = MAX_RETRIES + 1;
        for attempt in 1..=attempts {
            match self.device.read_firmware(self.image.len()) {
                Ok(readback) if readback == self.image => {
                    log::info!("Verification passed");
                    return Ok(());
                }
                Ok(_) => log::warn!(
                    "Read-back differs from written image (attempt {}/{})",
                    attempt,
                    attempts
                ),
                Err(e) => log::warn!("Read-back failed (attempt {}/{}): {}", attempt, attempts, e),
            }
        }
        Err(Error::VerifyFailed { attempts })
    }
}
