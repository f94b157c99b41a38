//! Vendor protocol constants and frame builders
//!
//! The touchpad controller speaks an undocumented vendor protocol over HID
//! feature reports. Two frame shapes exist: "control" frames whose length is
//! the feature request size of the hardware revision (passed on the command
//! line), and fixed 2,050-byte "block" frames carrying 2,048 bytes of
//! firmware payload behind a 2-byte header.

use std::time::Duration;

/// USB vendor id of the touchpad controller
pub const USB_VENDOR: u16 = 0x258a;
/// USB product id of the touchpad controller
pub const USB_PRODUCT: u16 = 0x000c;

/// Size of a complete firmware image in bytes
pub const FIRMWARE_SIZE: usize = 14 * 1024;
/// Firmware payload bytes per block frame
pub const BLOCK_SIZE: usize = 2048;
/// Block frame size on the wire: report id + opcode + payload
pub const BLOCK_FRAME_SIZE: usize = BLOCK_SIZE + 2;
/// Number of block frames in a full image
pub const BLOCK_COUNT: usize = FIRMWARE_SIZE / BLOCK_SIZE;

/// Report id used by control frames
pub const REPORT_ID_CONTROL: u8 = 0x05;
/// Report id used by block-data frames
pub const REPORT_ID_BLOCK: u8 = 0x06;

/// Smallest control frame that can still hold the address/length fields
pub const CONTROL_MIN_SIZE: usize = 6;

/// Command opcodes, sent in the second byte of a frame
pub mod opcodes {
    /// Select an address/length window for reading
    pub const READ: u8 = 0x52;
    /// Select an address/length window for writing
    pub const WRITE: u8 = 0x57;
    /// Erase the flash page selected by the address field
    pub const ERASE: u8 = 0x65;
    /// Fetch the next chunk of the selected read window
    pub const BLOCK_READ: u8 = 0x72;
    /// Push the next chunk of the selected write window
    pub const BLOCK_WRITE: u8 = 0x77;
}

/// Filler byte of the "erase program pages" control frame
pub const ERASE_ALL_MARKER: u8 = 0x45;
/// Filler byte of the "end programming" control frame
pub const END_PROGRAMMING_MARKER: u8 = 0x55;

/// On-device address of the vendor/product/serial record
pub const SERIAL_REGION_ADDR: u16 = 0xff80;
/// Length of the serial record window
pub const SERIAL_REGION_LEN: u16 = 8;
/// Page selector used when erasing the config region (the controller takes
/// the raw bytes `ff 00` here; meaning undocumented)
pub const SERIAL_ERASE_ADDR: u16 = 0x00ff;
/// Configuration byte written back alongside the serial number
pub const SENSOR_DIRECT_FLAG: u8 = 1;

/// Retries granted to the write and verify phases (each gets its own budget)
pub const MAX_RETRIES: usize = 5;

/// Settle time after each block transfer, read or write
pub const BLOCK_SETTLE: Duration = Duration::from_millis(10);
/// Settle time after erasing the serial region
pub const ERASE_SETTLE: Duration = Duration::from_millis(200);

/// Build a control frame: report id, opcode, then a 16-bit little-endian
/// address and length. The remainder of the frame stays zeroed.
pub fn control_frame(report_size: usize, opcode: u8, address: u16, length: u16) -> Vec<u8> {
    let mut frame = vec![0u8; report_size];
    frame[0] = REPORT_ID_CONTROL;
    frame[1] = opcode;
    frame[2..4].copy_from_slice(&address.to_le_bytes());
    frame[4..6].copy_from_slice(&length.to_le_bytes());
    frame
}

/// Build a zeroed control-size frame carrying only the report id and opcode;
/// callers fill in opcode-specific payload themselves.
pub fn command_frame(report_size: usize, opcode: u8) -> Vec<u8> {
    let mut frame = vec![0u8; report_size];
    frame[0] = REPORT_ID_CONTROL;
    frame[1] = opcode;
    frame
}

/// Build one of the fixed marker-filled control frames (erase-all / end
/// programming): every byte is the marker except the report id.
pub fn filled_frame(report_size: usize, marker: u8) -> Vec<u8> {
    let mut frame = vec![marker; report_size];
    frame[0] = REPORT_ID_CONTROL;
    frame
}

/// Build a block-write frame around one 2,048-byte firmware block.
pub fn block_write_frame(block: &[u8]) -> Vec<u8> {
    debug_assert_eq!(block.len(), BLOCK_SIZE);
    let mut frame = Vec::with_capacity(BLOCK_FRAME_SIZE);
    frame.push(REPORT_ID_BLOCK);
    frame.push(opcodes::BLOCK_WRITE);
    frame.extend_from_slice(block);
    frame
}

/// Build the request buffer for a block read. The device fills everything
/// past the 2-byte header.
pub fn block_read_request() -> Vec<u8> {
    let mut frame = vec![0u8; BLOCK_FRAME_SIZE];
    frame[0] = REPORT_ID_BLOCK;
    frame[1] = opcodes::BLOCK_READ;
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_frame_encodes_address_and_length_little_endian() {
        let frame = control_frame(8, opcodes::READ, 0xff80, 0x0008);
        assert_eq!(frame, [0x05, 0x52, 0x80, 0xff, 0x08, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn control_frame_for_image_write() {
        let frame = control_frame(6, opcodes::WRITE, 0, FIRMWARE_SIZE as u16);
        // 14336 = 0x3800
        assert_eq!(frame, [0x05, 0x57, 0x00, 0x00, 0x00, 0x38]);
    }

    #[test]
    fn serial_erase_frame_bytes() {
        let frame = control_frame(6, opcodes::ERASE, SERIAL_ERASE_ADDR, 0);
        assert_eq!(frame, [0x05, 0x65, 0xff, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn filled_frames_keep_the_report_id() {
        let erase = filled_frame(6, ERASE_ALL_MARKER);
        assert_eq!(erase, [0x05, 0x45, 0x45, 0x45, 0x45, 0x45]);
        let end = filled_frame(6, END_PROGRAMMING_MARKER);
        assert_eq!(end, [0x05, 0x55, 0x55, 0x55, 0x55, 0x55]);
    }

    #[test]
    fn block_frames_have_the_fixed_size() {
        let block = [0xabu8; BLOCK_SIZE];
        let frame = block_write_frame(&block);
        assert_eq!(frame.len(), BLOCK_FRAME_SIZE);
        assert_eq!(frame[0], REPORT_ID_BLOCK);
        assert_eq!(frame[1], opcodes::BLOCK_WRITE);
        assert!(frame[2..].iter().all(|&b| b == 0xab));

        let request = block_read_request();
        assert_eq!(request.len(), BLOCK_FRAME_SIZE);
        assert_eq!(&request[..2], [REPORT_ID_BLOCK, opcodes::BLOCK_READ]);
        assert!(request[2..].iter().all(|&b| b == 0));
    }
}
