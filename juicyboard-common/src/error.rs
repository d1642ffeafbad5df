//! Error types for the slot bus daemon
//!
//! - AppError: Top-level application errors
//! - I2cError: I2C transaction errors
//! - GpioError: Reset line errors
//! - ConfigError: Configuration loading/validation errors (re-exported from config module)
//! - ProtocolError: Slot protocol errors (re-exported from protocol module)

use std::io;

pub use crate::config::ConfigError;
pub use crate::protocol::ProtocolError;

/// Boxed transport error carried as the source of bus failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Top-Level Application Error
// ============================================================================

/// Top-level application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// I2C communication error
    #[error("I2C communication error: {0}")]
    I2c(#[from] I2cError),

    /// Reset line error
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error, typically on the console output stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// I2C Error
// ============================================================================

/// I2C transaction errors
#[derive(Debug, thiserror::Error)]
pub enum I2cError {
    /// Failed to open the I2C bus device
    #[error("Failed to open I2C bus {bus}: {source}")]
    DeviceOpen {
        bus: u8,
        #[source]
        source: BoxError,
    },

    /// Failed to select the target address
    #[error("Failed to select I2C address 0x{addr:02X}: {source}")]
    SetSlaveAddress {
        addr: u8,
        #[source]
        source: BoxError,
    },

    /// Read transaction failed
    #[error("Failed to read register 0x{reg:02X} at address 0x{addr:02X}: {source}")]
    ReadFailed {
        addr: u8,
        reg: u8,
        #[source]
        source: BoxError,
    },

    /// Write transaction failed
    #[error("Failed to write register 0x{reg:02X} at address 0x{addr:02X}: {source}")]
    WriteFailed {
        addr: u8,
        reg: u8,
        #[source]
        source: BoxError,
    },

    /// Nothing acknowledged the address or data
    #[error("No acknowledge from address 0x{addr:02X} (register 0x{reg:02X})")]
    NoAcknowledge { addr: u8, reg: u8 },

    /// Bus-level fault (arbitration loss, bus error, overrun)
    #[error("I2C bus error at address 0x{addr:02X}: {kind}")]
    Bus { addr: u8, kind: String },
}

// ============================================================================
// GPIO Error
// ============================================================================

/// Reset line errors
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    /// Failed to export the line through sysfs
    #[error("Failed to export GPIO {line}: {source}")]
    Export {
        line: u32,
        #[source]
        source: io::Error,
    },

    /// Failed to change the line direction
    #[error("Failed to set direction of GPIO {line} to {direction}: {source}")]
    Direction {
        line: u32,
        direction: &'static str,
        #[source]
        source: io::Error,
    },
}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

// Pins that cannot fail (test doubles, always-on lines)
impl From<std::convert::Infallible> for AppError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

// ============================================================================
// Result Type Aliases
// ============================================================================

/// Result type using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type using I2cError
pub type I2cResult<T> = std::result::Result<T, I2cError>;
