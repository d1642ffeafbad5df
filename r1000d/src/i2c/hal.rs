//! `embedded-hal` 1.0 transport for the slot bus
//!
//! Lets the manager run on top of any HAL that implements
//! `embedded_hal::i2c::I2c`, e.g. an MCU peripheral or a bus shared through
//! `embedded-hal-bus`.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use juicyboard_common::error::{I2cError, I2cResult};

use super::RegisterBus;

/// Register bus on top of an `embedded-hal` I2C peripheral
pub struct HalBus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> HalBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give the peripheral back
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterBus for HalBus<I2C> {
    fn read_register(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> I2cResult<()> {
        self.i2c
            .write_read(addr, &[reg], buf)
            .map_err(|e| map_error(addr, reg, e.kind()))
    }

    fn write_register(&mut self, addr: u8, reg: u8, data: &[u8]) -> I2cResult<()> {
        let mut frame = Vec::with_capacity(1 + data.len());
        frame.push(reg);
        frame.extend_from_slice(data);
        self.i2c
            .write(addr, &frame)
            .map_err(|e| map_error(addr, reg, e.kind()))
    }
}

fn map_error(addr: u8, reg: u8, kind: ErrorKind) -> I2cError {
    match kind {
        ErrorKind::NoAcknowledge(_) => I2cError::NoAcknowledge { addr, reg },
        other => I2cError::Bus {
            addr,
            kind: format!("{:?}", other),
        },
    }
}
