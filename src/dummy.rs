//! In-memory touchpad emulator for testing
//!
//! Implements [`FeatureTransport`] against an emulated controller: a 14 KiB
//! firmware array plus the vendor/product/serial config record. It keeps
//! counters for every kind of exchange and offers fault injection (short
//! block writes, corrupted read-back), so the engine and the flash session
//! can be tested without hardware.

use crate::error::Result;
use crate::protocol::{
    opcodes, BLOCK_SIZE, END_PROGRAMMING_MARKER, ERASE_ALL_MARKER, FIRMWARE_SIZE,
    REPORT_ID_BLOCK, REPORT_ID_CONTROL, SERIAL_REGION_ADDR, USB_PRODUCT, USB_VENDOR,
};
use crate::transport::FeatureTransport;

/// Emulated touchpad controller.
///
/// All state is public so tests can seed faults and inspect what the engine
/// actually sent.
pub struct DummyTouchpad {
    firmware: Vec<u8>,

    /// Stored config record
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: u16,

    // Windows selected by control frames
    read_offset: usize,
    write_offset: usize,
    serial_read_stage: usize,
    serial_write_stage: usize,

    // Per-attempt fault latches, armed when a window is selected
    failing_write: bool,
    corrupting_read: bool,

    /// Remaining write attempts whose block frames are answered short
    pub fail_writes: usize,
    /// Remaining read-back attempts whose first block comes back corrupted
    pub corrupt_reads: usize,

    /// Total feature-report exchanges seen
    pub exchanges: usize,
    /// Write-window selections at address 0 (one per write pass)
    pub write_selects: usize,
    /// Read-window selections at address 0 (one per read-out)
    pub read_selects: usize,
    /// Offsets of every accepted firmware block write, in order
    pub block_write_offsets: Vec<usize>,
    /// First payload byte of every block written at offset 0, in order
    pub first_block_first_bytes: Vec<u8>,
    /// Marker-filled erase frames seen
    pub erase_all_count: usize,
    /// Config-region erase commands seen
    pub serial_erases: usize,
    /// End-programming frames seen
    pub end_programming_count: usize,

    /// Values the engine wrote back into the config record
    pub written_vendor_id: Option<u16>,
    pub written_product_id: Option<u16>,
    pub written_flag: Option<u8>,
    pub written_serial: Option<u16>,
}

impl DummyTouchpad {
    /// Blank device: erased firmware, default config record.
    pub fn new() -> Self {
        Self {
            firmware: vec![0xff; FIRMWARE_SIZE],
            vendor_id: USB_VENDOR,
            product_id: USB_PRODUCT,
            serial: 0x1234,
            read_offset: 0,
            write_offset: 0,
            serial_read_stage: 0,
            serial_write_stage: 0,
            failing_write: false,
            corrupting_read: false,
            fail_writes: 0,
            corrupt_reads: 0,
            exchanges: 0,
            write_selects: 0,
            read_selects: 0,
            block_write_offsets: Vec::new(),
            first_block_first_bytes: Vec::new(),
            erase_all_count: 0,
            serial_erases: 0,
            end_programming_count: 0,
            written_vendor_id: None,
            written_product_id: None,
            written_flag: None,
            written_serial: None,
        }
    }

    /// Device pre-loaded with a firmware image.
    pub fn with_firmware(image: &[u8]) -> Self {
        let mut dev = Self::new();
        let len = image.len().min(dev.firmware.len());
        dev.firmware[..len].copy_from_slice(&image[..len]);
        dev
    }

    /// Current firmware contents.
    pub fn firmware(&self) -> &[u8] {
        &self.firmware
    }

    fn handle_control(&mut self, data: &[u8]) {
        // The erase-all and end-programming frames are nothing but marker
        // fill behind the report id; check for them before decoding fields.
        if data[1..].iter().all(|&b| b == ERASE_ALL_MARKER) {
            self.erase_all_count += 1;
            self.firmware.fill(0xff);
            return;
        }
        if data[1..].iter().all(|&b| b == END_PROGRAMMING_MARKER) {
            self.end_programming_count += 1;
            return;
        }

        let address = u16::from_le_bytes([data[2], data[3]]);
        match data[1] {
            opcodes::READ if address == 0 => {
                self.read_selects += 1;
                self.read_offset = 0;
                self.corrupting_read = self.corrupt_reads > 0;
                if self.corrupting_read {
                    self.corrupt_reads -= 1;
                }
            }
            opcodes::READ if address == SERIAL_REGION_ADDR => {
                self.serial_read_stage = 0;
            }
            opcodes::WRITE if address == 0 => {
                self.write_selects += 1;
                self.write_offset = 0;
                self.failing_write = self.fail_writes > 0;
                if self.failing_write {
                    self.fail_writes -= 1;
                }
            }
            opcodes::WRITE if address == SERIAL_REGION_ADDR => {
                self.serial_write_stage = 0;
            }
            opcodes::ERASE => {
                self.serial_erases += 1;
            }
            opcodes::BLOCK_WRITE => {
                // Config-record data rides in control-size frames
                if self.serial_write_stage == 0 {
                    self.written_vendor_id = Some(u16::from_be_bytes([data[2], data[3]]));
                    self.written_product_id = Some(u16::from_be_bytes([data[4], data[5]]));
                } else {
                    self.written_flag = Some(data[2]);
                    self.written_serial = Some(u16::from_be_bytes([data[4], data[5]]));
                }
                self.serial_write_stage += 1;
            }
            _ => {}
        }
    }
}

impl Default for DummyTouchpad {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureTransport for DummyTouchpad {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize> {
        self.exchanges += 1;
        match data[0] {
            REPORT_ID_CONTROL => {
                self.handle_control(data);
                Ok(data.len())
            }
            REPORT_ID_BLOCK => {
                if self.failing_write {
                    return Ok(data.len() - 1);
                }
                let payload = &data[2..];
                if self.write_offset == 0 {
                    self.first_block_first_bytes.push(payload[0]);
                }
                self.block_write_offsets.push(self.write_offset);
                let end = self.write_offset + payload.len();
                self.firmware[self.write_offset..end].copy_from_slice(payload);
                self.write_offset = end;
                Ok(data.len())
            }
            _ => Ok(0),
        }
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.exchanges += 1;
        match buf[0] {
            REPORT_ID_BLOCK => {
                let end = self.read_offset + BLOCK_SIZE;
                buf[2..2 + BLOCK_SIZE].copy_from_slice(&self.firmware[self.read_offset..end]);
                if self.corrupting_read && self.read_offset == 0 {
                    buf[2] ^= 0xff;
                }
                self.read_offset = end;
                Ok(buf.len())
            }
            REPORT_ID_CONTROL => {
                if self.serial_read_stage == 0 {
                    buf[2..4].copy_from_slice(&self.vendor_id.to_be_bytes());
                    buf[4..6].copy_from_slice(&self.product_id.to_be_bytes());
                } else {
                    buf[4..6].copy_from_slice(&self.serial.to_be_bytes());
                }
                self.serial_read_stage += 1;
                Ok(buf.len())
            }
            _ => Ok(0),
        }
    }
}
