//! Write command implementation

use std::path::Path;
use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::device::Touchpad;
use crate::error::Error;
use crate::protocol::FIRMWARE_SIZE;
use crate::session::FlashSession;
use crate::transport::HidTransport;

/// Seconds the operator gets to abort before the erase starts
const GRACE_SECS: u64 = 5;

/// Flash `input` onto the device: erase, write (retried), verify by
/// read-back (retried), rewrite the serial record, finalize.
pub fn run_write(input: &Path, request_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let image = std::fs::read(input)?;
    if image.len() != FIRMWARE_SIZE {
        return Err(Error::FirmwareSize {
            expected: FIRMWARE_SIZE,
            got: image.len(),
        }
        .into());
    }
    println!("Read {} bytes from {:?}", image.len(), input);

    // Last chance to bail out before the erase makes this irreversible
    abort_grace();

    let transport = HidTransport::open()?;
    let pad = Touchpad::new(transport, request_size);
    let mut session = FlashSession::new(pad, image)?;
    session.run()?;

    println!("Write complete!");
    Ok(())
}

fn abort_grace() {
    println!("You have {} seconds to press CTRL+C", GRACE_SECS);
    let pb = ProgressBar::new(GRACE_SECS);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.red} {pos}/{len}s")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    for _ in 0..GRACE_SECS {
        thread::sleep(Duration::from_secs(1));
        pb.inc(1);
    }
    pb.finish_and_clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn short_firmware_file_is_rejected_before_device_access() {
        let path = std::env::temp_dir().join("pbtpflash-short-fw.bin");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 1024]).unwrap();
        drop(file);

        let err = run_write(&path, 6).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("14336"), "unexpected error: {}", msg);

        std::fs::remove_file(&path).ok();
    }
}
