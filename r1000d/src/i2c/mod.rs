//! Register-level I2C access for the slot bus
//!
//! The manager only needs two primitives: read N bytes from a register and
//! write bytes to a register, both addressed by a 7-bit device address.
//! `LinuxSlotBus` provides them over `/dev/i2c-N`; `HalBus` provides them over
//! any `embedded-hal` 1.0 I2C implementation.

#[cfg(target_os = "linux")]
pub mod device;

pub mod hal;

use juicyboard_common::error::I2cResult;

#[cfg(target_os = "linux")]
pub use device::LinuxSlotBus;
pub use hal::HalBus;

/// Register read/write primitives on a shared I2C bus
///
/// Every call is one complete, blocking transaction. Implementations must
/// not retry; callers decide what a failed transaction means.
pub trait RegisterBus {
    /// Read `buf.len()` bytes starting at register `reg` of device `addr`
    fn read_register(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> I2cResult<()>;

    /// Write `data` to register `reg` of device `addr`
    fn write_register(&mut self, addr: u8, reg: u8, data: &[u8]) -> I2cResult<()>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn read_register(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> I2cResult<()> {
        (**self).read_register(addr, reg, buf)
    }

    fn write_register(&mut self, addr: u8, reg: u8, data: &[u8]) -> I2cResult<()> {
        (**self).write_register(addr, reg, data)
    }
}
