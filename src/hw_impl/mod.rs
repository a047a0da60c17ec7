//! Linux I2C character device (`/dev/i2c-N`) as an `AtcaBus`.

use std::io;

use embedded_hal::blocking::i2c::{Read as I2cRead, Write as I2cWrite};
use linux_embedded_hal::I2cdev;
use log::{error, info};

use super::transport::AtcaBus;
use super::AtcaStatus;

/// An open I2C adapter
pub struct I2cBus {
    path: String,
    device: I2cdev,
    /// 7-bit slave address, set by `acquire()`
    address: u8,
}

impl I2cBus {
    /// Opens the adapter at `path`, e.g. `/dev/i2c-1`
    pub fn open(path: &str) -> Result<I2cBus, AtcaStatus> {
        let device = I2cdev::new(path).map_err(|err| {
            error!("Cannot open {}: {}", path, err);
            AtcaStatus::AtcaBusUnavailable
        })?;
        Ok(I2cBus {
            path: path.to_owned(),
            device,
            address: 0,
        })
    } // I2cBus::open()
}

impl AtcaBus for I2cBus {
    fn identifier(&self) -> String {
        self.path.clone()
    }

    /// `address` is the 8-bit form used in device documentation (0xC0 by default)
    fn acquire(&mut self, address: u8) -> Result<(), AtcaStatus> {
        let slave = address >> 1;
        if let Err(err) = self.device.set_slave_address(u16::from(slave)) {
            error!("No device at 0x{:02X} on {}: {}", address, self.path, err);
            return Err(AtcaStatus::AtcaNoDevices);
        }
        self.address = slave;
        info!("Bound {} to address 0x{:02X}", self.path, address);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        I2cWrite::write(&mut self.device, self.address, data)
            .map(|_| data.len())
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        I2cRead::read(&mut self.device, self.address, buffer)
            .map(|_| buffer.len())
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }
}
