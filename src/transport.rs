//! HID feature-report transport
//!
//! The protocol engine only needs two primitives: send a feature report and
//! fetch one. They are behind a trait so the engine can run against the
//! in-memory emulator in tests and against `hidapi` in production.

use crate::error::{Error, Result};
use crate::protocol::{USB_PRODUCT, USB_VENDOR};

/// Blocking feature-report exchange with a HID device.
///
/// Both methods return the number of bytes actually moved; the engine treats
/// anything other than the full frame size as a failed exchange.
pub trait FeatureTransport {
    /// Send a feature report (`data[0]` is the report id).
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize>;

    /// Fetch a feature report into `buf` (`buf[0]` selects the report id).
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<T: FeatureTransport + ?Sized> FeatureTransport for &mut T {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize> {
        (**self).send_feature_report(data)
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).get_feature_report(buf)
    }
}

/// Production transport over `hidapi`.
///
/// The handle is closed when the value is dropped, so ownership alone
/// guarantees release on every exit path.
pub struct HidTransport {
    device: hidapi::HidDevice,
}

impl HidTransport {
    /// Open the single supported touchpad by its fixed vendor/product pair.
    pub fn open() -> Result<Self> {
        let api = hidapi::HidApi::new()?;

        let present = api
            .device_list()
            .any(|d| d.vendor_id() == USB_VENDOR && d.product_id() == USB_PRODUCT);
        if !present {
            return Err(Error::DeviceNotFound);
        }

        let device = api.open(USB_VENDOR, USB_PRODUCT)?;
        log::debug!("Opened touchpad {:04x}:{:04x}", USB_VENDOR, USB_PRODUCT);
        Ok(Self { device })
    }
}

impl FeatureTransport for HidTransport {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize> {
        // hidapi reports success only for complete transfers
        self.device.send_feature_report(data)?;
        Ok(data.len())
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.device.get_feature_report(buf)?)
    }
}
