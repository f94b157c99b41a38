//! Touchpad protocol engine
//!
//! `Touchpad` drives the vendor protocol over any [`FeatureTransport`]:
//! firmware read-out, firmware write, the serial-record rewrite, and the
//! fixed erase / end-programming commands. Every exchange is checked for an
//! exact-size transfer; nothing in here retries. The flash session layers
//! its retry policy on top for write and verify only.

use std::thread;

use crate::error::{Error, Result};
use crate::protocol::{
    self, opcodes, BLOCK_SETTLE, BLOCK_SIZE, END_PROGRAMMING_MARKER, ERASE_ALL_MARKER,
    ERASE_SETTLE, SENSOR_DIRECT_FLAG, SERIAL_ERASE_ADDR, SERIAL_REGION_ADDR, SERIAL_REGION_LEN,
};
use crate::transport::FeatureTransport;

/// Vendor id, product id and serial number as stored in the controller's
/// config region. Provisioning reads these and writes them back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialRecord {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: u16,
}

/// An open touchpad controller.
///
/// `request_size` is the length of every control frame; it varies between
/// hardware revisions and comes from the command line.
pub struct Touchpad<T: FeatureTransport> {
    transport: T,
    request_size: usize,
}

impl<T: FeatureTransport> Touchpad<T> {
    pub fn new(transport: T, request_size: usize) -> Self {
        Self {
            transport,
            request_size,
        }
    }

    /// Read `length` bytes of firmware out of the device.
    ///
    /// Selects a read window at address 0, then fetches `length / 2048`
    /// block frames in ascending order with a settle delay after each.
    pub fn read_firmware(&mut self, length: usize) -> Result<Vec<u8>> {
        self.send_control(opcodes::READ, 0, length as u16)?;

        let mut image = vec![0u8; length];
        for (i, chunk) in image.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            let mut frame = protocol::block_read_request();
            self.get_exact(&mut frame)?;
            thread::sleep(BLOCK_SETTLE);
            chunk.copy_from_slice(&frame[2..]);
            log::debug!("Read block {} ({} bytes)", i, BLOCK_SIZE);
        }

        Ok(image)
    }

    /// Push a full firmware image to the device.
    ///
    /// Selects a write window at address 0 and sends every block in
    /// ascending order. Block 0 goes out with its first payload byte forced
    /// to zero on the first pass; the controller requires this and the real
    /// byte is delivered by retransmitting block 0 unmodified at the end,
    /// after reselecting the window.
    pub fn write_firmware(&mut self, image: &[u8]) -> Result<()> {
        self.send_control(opcodes::WRITE, 0, image.len() as u16)?;

        for (i, block) in image.chunks_exact(BLOCK_SIZE).enumerate() {
            let mut frame = protocol::block_write_frame(block);
            if i == 0 {
                frame[2] = 0x00;
            }
            self.send_exact(&frame)?;
            thread::sleep(BLOCK_SETTLE);
            log::debug!("Wrote block {} ({} bytes)", i, BLOCK_SIZE);
        }

        self.send_control(opcodes::WRITE, 0, image.len() as u16)?;
        let frame = protocol::block_write_frame(&image[..BLOCK_SIZE]);
        self.send_exact(&frame)?;
        thread::sleep(BLOCK_SETTLE);

        Ok(())
    }

    /// Read the vendor/product/serial record and write it back unchanged,
    /// together with the fixed configuration flag. Single attempt; any short
    /// transfer aborts the whole session.
    pub fn provision_serial(&mut self) -> Result<SerialRecord> {
        // Select the config window holding the record
        self.send_control(opcodes::READ, SERIAL_REGION_ADDR, SERIAL_REGION_LEN)?;

        // First read carries the vendor and product ids
        let mut buf = protocol::command_frame(self.request_size, opcodes::BLOCK_READ);
        self.get_exact(&mut buf)?;
        let vendor_id = u16::from_be_bytes([buf[2], buf[3]]);
        let product_id = u16::from_be_bytes([buf[4], buf[5]]);

        // Second read of the same window carries the serial number
        let mut buf = protocol::command_frame(self.request_size, opcodes::BLOCK_READ);
        self.get_exact(&mut buf)?;
        let serial = u16::from_be_bytes([buf[4], buf[5]]);

        let record = SerialRecord {
            vendor_id,
            product_id,
            serial,
        };
        log::info!(
            "Device reports VID {:04x} PID {:04x} serial {:04x}",
            record.vendor_id,
            record.product_id,
            record.serial
        );

        // Erase the config region and give the flash controller time
        self.send_control(opcodes::ERASE, SERIAL_ERASE_ADDR, 0)?;
        thread::sleep(ERASE_SETTLE);

        self.send_control(opcodes::WRITE, SERIAL_REGION_ADDR, SERIAL_REGION_LEN)?;

        // Data frames reuse the control framing with the block-write opcode.
        // First the ids, big-endian as they came in.
        let mut frame = protocol::command_frame(self.request_size, opcodes::BLOCK_WRITE);
        frame[2..4].copy_from_slice(&record.vendor_id.to_be_bytes());
        frame[4..6].copy_from_slice(&record.product_id.to_be_bytes());
        self.send_exact(&frame)?;

        // Then the config flag and the serial number
        let mut frame = protocol::command_frame(self.request_size, opcodes::BLOCK_WRITE);
        frame[2] = SENSOR_DIRECT_FLAG;
        frame[3] = 0x00;
        frame[4..6].copy_from_slice(&record.serial.to_be_bytes());
        self.send_exact(&frame)?;

        Ok(record)
    }

    /// Erase the firmware pages (0-6) with the fixed marker-filled frame.
    pub fn erase_program_region(&mut self) -> Result<()> {
        let frame = protocol::filled_frame(self.request_size, ERASE_ALL_MARKER);
        self.send_exact(&frame)
    }

    /// Send the fixed end-programming frame.
    pub fn end_programming(&mut self) -> Result<()> {
        let frame = protocol::filled_frame(self.request_size, END_PROGRAMMING_MARKER);
        self.send_exact(&frame)
    }

    fn send_control(&mut self, opcode: u8, address: u16, length: u16) -> Result<()> {
        let frame = protocol::control_frame(self.request_size, opcode, address, length);
        self.send_exact(&frame)
    }

    fn send_exact(&mut self, frame: &[u8]) -> Result<()> {
        let sent = self.transport.send_feature_report(frame)?;
        if sent != frame.len() {
            return Err(Error::TransferFailed {
                expected: frame.len(),
                got: sent,
            });
        }
        Ok(())
    }

    fn get_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let got = self.transport.get_feature_report(buf)?;
        if got != buf.len() {
            return Err(Error::TransferFailed {
                expected: buf.len(),
                got,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::DummyTouchpad;
    use crate::protocol::{BLOCK_COUNT, FIRMWARE_SIZE};

    fn test_image() -> Vec<u8> {
        (0..FIRMWARE_SIZE).map(|i| ((i % 251) + 1) as u8).collect()
    }

    #[test]
    fn read_returns_device_contents() {
        let image = test_image();
        let mut dummy = DummyTouchpad::with_firmware(&image);
        let mut pad = Touchpad::new(&mut dummy, 6);

        let out = pad.read_firmware(FIRMWARE_SIZE).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn write_sends_all_blocks_in_order_plus_trailing_first_block() {
        let image = test_image();
        let mut dummy = DummyTouchpad::new();
        let mut pad = Touchpad::new(&mut dummy, 6);

        pad.write_firmware(&image).unwrap();

        // 7 ascending offsets, then offset 0 again
        let mut expected: Vec<usize> = (0..BLOCK_COUNT).map(|i| i * BLOCK_SIZE).collect();
        expected.push(0);
        assert_eq!(dummy.block_write_offsets, expected);
    }

    #[test]
    fn first_block_is_zeroed_then_restored() {
        let image = test_image();
        assert_ne!(image[0], 0);
        let mut dummy = DummyTouchpad::new();
        let mut pad = Touchpad::new(&mut dummy, 6);

        pad.write_firmware(&image).unwrap();

        // first transmission carries 0x00, the trailing one the real byte
        assert_eq!(dummy.first_block_first_bytes, [0x00, image[0]]);
        // the device ends up holding the original image
        assert_eq!(dummy.firmware(), &image[..]);
    }

    #[test]
    fn short_block_write_aborts() {
        let image = test_image();
        let mut dummy = DummyTouchpad::new();
        dummy.fail_writes = 1;
        let mut pad = Touchpad::new(&mut dummy, 6);

        match pad.write_firmware(&image) {
            Err(Error::TransferFailed { expected, got }) => {
                assert_eq!(expected, protocol::BLOCK_FRAME_SIZE);
                assert_eq!(got, protocol::BLOCK_FRAME_SIZE - 1);
            }
            other => panic!("expected TransferFailed, got {:?}", other),
        }
    }

    #[test]
    fn provisioning_preserves_the_record() {
        let mut dummy = DummyTouchpad::new();
        dummy.serial = 0xbee7;
        let mut pad = Touchpad::new(&mut dummy, 6);

        let record = pad.provision_serial().unwrap();
        assert_eq!(
            record,
            SerialRecord {
                vendor_id: crate::protocol::USB_VENDOR,
                product_id: crate::protocol::USB_PRODUCT,
                serial: 0xbee7,
            }
        );

        assert_eq!(dummy.written_vendor_id, Some(crate::protocol::USB_VENDOR));
        assert_eq!(dummy.written_product_id, Some(crate::protocol::USB_PRODUCT));
        assert_eq!(dummy.written_serial, Some(0xbee7));
        assert_eq!(dummy.written_flag, Some(SENSOR_DIRECT_FLAG));
        assert_eq!(dummy.serial_erases, 1);
    }
}
