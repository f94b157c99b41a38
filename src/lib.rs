//! pbtpflash - firmware flasher for the Pinebook HID touchpad
//!
//! Talks the vendor feature-report protocol of the touchpad controller
//! (VID `0x258a`, PID `0x000c`) to read the flashed firmware out to a file
//! or to program a new image: erase, write with bounded retry, verify by
//! read-back with its own retry budget, rewrite the serial record, then
//! leave programming mode.
//!
//! # Architecture
//!
//! - [`protocol`] - frame builders and the protocol's fixed constants
//! - [`transport`] - the [`FeatureTransport`] boundary plus the `hidapi`
//!   implementation
//! - [`device`] - the protocol engine: read, write, serial provisioning
//! - [`session`] - orchestration state machine for one programming run
//! - [`dummy`] - in-memory controller emulator used by the tests

pub mod cli;
pub mod commands;
pub mod device;
pub mod dummy;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use device::{SerialRecord, Touchpad};
pub use error::{Error, Result};
pub use session::{FlashSession, SessionState};
pub use transport::{FeatureTransport, HidTransport};
