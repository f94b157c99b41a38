//! Read command implementation

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::device::Touchpad;
use crate::protocol::FIRMWARE_SIZE;
use crate::transport::HidTransport;

/// Read the device's firmware into `output`.
///
/// The output file is created first so a bad path fails before the device
/// is touched. A standalone read has no retry; any transport failure is
/// final.
pub fn run_read(output: &Path, request_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(output)?;

    let transport = HidTransport::open()?;
    let mut pad = Touchpad::new(transport, request_size);

    let image = pad.read_firmware(FIRMWARE_SIZE)?;
    file.write_all(&image)?;

    println!("Wrote {} bytes to {:?}", image.len(), output);
    Ok(())
}
