//! Linux I2C transport for the slot bus
//!
//! One `/dev/i2c-N` handle is shared by every slot and the power monitor;
//! the target address is switched on demand before each transaction.
//!
//! This module is only available on Linux targets.

#![cfg(target_os = "linux")]

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use juicyboard_common::error::{I2cError, I2cResult};
use tracing::trace;

use super::RegisterBus;

/// Slot bus backed by a Linux I2C character device
pub struct LinuxSlotBus {
    /// Underlying Linux I2C device
    device: LinuxI2CDevice,
    /// I2C bus number
    bus: u8,
    /// Address the kernel driver currently targets
    addr: u8,
}

impl LinuxSlotBus {
    /// Open `/dev/i2c-<bus>`, initially targeting `addr`
    ///
    /// # Errors
    /// Returns `I2cError::DeviceOpen` if the device cannot be opened (e.g.,
    /// permissions, missing `i2c-dev` module, or wrong bus number).
    pub fn new(bus: u8, addr: u8) -> Result<Self, I2cError> {
        let device_path = format!("/dev/i2c-{}", bus);
        let device = LinuxI2CDevice::new(&device_path, u16::from(addr)).map_err(|e| {
            I2cError::DeviceOpen {
                bus,
                source: Box::new(e),
            }
        })?;

        Ok(Self { device, bus, addr })
    }

    /// Bus number this handle was opened on
    pub fn bus(&self) -> u8 {
        self.bus
    }

    /// Point the kernel driver at `addr` if it is not already there
    fn select(&mut self, addr: u8) -> I2cResult<()> {
        if self.addr != addr {
            self.device
                .set_slave_address(u16::from(addr))
                .map_err(|e| I2cError::SetSlaveAddress {
                    addr,
                    source: Box::new(e),
                })?;
            self.addr = addr;
        }
        Ok(())
    }
}

impl RegisterBus for LinuxSlotBus {
    fn read_register(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> I2cResult<()> {
        self.select(addr)?;
        trace!("read 0x{:02X}:0x{:02X} ({} bytes)", addr, reg, buf.len());
        self.device
            .write(&[reg])
            .and_then(|_| self.device.read(buf))
            .map_err(|e| I2cError::ReadFailed {
                addr,
                reg,
                source: Box::new(e),
            })
    }

    fn write_register(&mut self, addr: u8, reg: u8, data: &[u8]) -> I2cResult<()> {
        self.select(addr)?;
        trace!("write 0x{:02X}:0x{:02X} {:02X?}", addr, reg, data);
        let mut frame = Vec::with_capacity(1 + data.len());
        frame.push(reg);
        frame.extend_from_slice(data);
        self.device.write(&frame).map_err(|e| I2cError::WriteFailed {
            addr,
            reg,
            source: Box::new(e),
        })
    }
}

// Note: Unit tests are omitted because LinuxI2CDevice needs a real
// /dev/i2c-N node. The register framing is covered by the HalBus tests.
