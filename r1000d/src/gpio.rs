//! Module reset line on a sysfs GPIO
//!
//! The reset net is open-drain: the line is either actively driven low or
//! released to the pull-up. Through sysfs that is `direction = low` for the
//! asserted state and `direction = in` (high impedance) for the released
//! state, so the pin never drives the net high.

use embedded_hal::digital::{ErrorType, OutputPin};
use juicyboard_common::error::GpioError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default sysfs GPIO class directory
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Open-drain output on a sysfs GPIO line
pub struct SysfsResetLine {
    line: u32,
    direction_path: PathBuf,
}

impl SysfsResetLine {
    /// Export `line` under the default sysfs root and release it high
    pub fn open(line: u32) -> Result<Self, GpioError> {
        Self::open_at(SYSFS_GPIO_ROOT, line)
    }

    /// Export `line` under `root` and release it high
    pub fn open_at(root: impl AsRef<Path>, line: u32) -> Result<Self, GpioError> {
        let root = root.as_ref();
        let line_dir = root.join(format!("gpio{}", line));

        if !line_dir.exists() {
            debug!("Exporting GPIO {}", line);
            fs::write(root.join("export"), line.to_string())
                .map_err(|source| GpioError::Export { line, source })?;
        }

        let mut pin = Self {
            line,
            direction_path: line_dir.join("direction"),
        };
        pin.set_high()?;
        Ok(pin)
    }

    /// GPIO number of this line
    pub fn line(&self) -> u32 {
        self.line
    }

    fn set_direction(&mut self, direction: &'static str) -> Result<(), GpioError> {
        fs::write(&self.direction_path, direction).map_err(|source| GpioError::Direction {
            line: self.line,
            direction,
            source,
        })
    }
}

impl ErrorType for SysfsResetLine {
    type Error = GpioError;
}

impl OutputPin for SysfsResetLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_direction("low")
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_direction("in")
    }
}
