//! Error types for touchpad flashing operations

use thiserror::Error;

/// Result type alias using the crate's own error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the touchpad or handling firmware
/// images. Everything is fatal for the exchange it occurred in; retry policy
/// lives in the flash session, not here.
#[derive(Debug, Error)]
pub enum Error {
    /// No touchpad with the supported vendor/product pair is attached
    #[error("touchpad not found (VID:258A PID:000C)")]
    DeviceNotFound,

    /// HID layer error (open failed, transfer rejected by the OS, ...)
    #[error("HID transport error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// Firmware file I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A feature-report exchange moved fewer/more bytes than the frame size
    #[error("short feature report transfer: expected {expected} bytes, got {got}")]
    TransferFailed { expected: usize, got: usize },

    /// Firmware image has the wrong length for this controller
    #[error("firmware image must be {expected} bytes, got {got}")]
    FirmwareSize { expected: usize, got: usize },

    /// The firmware write kept failing after exhausting its retry budget
    #[error("firmware write still failing after {attempts} attempts")]
    WriteRetriesExhausted { attempts: usize },

    /// Read-back never matched the written image within the retry budget
    #[error("read-back verification failed after {attempts} attempts")]
    VerifyFailed { attempts: usize },
}
