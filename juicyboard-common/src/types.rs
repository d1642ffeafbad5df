//! Core data types for the slot bus manager
//!
//! - SlotNumber: a validated slot index (1-15)
//! - IdField / SlotRecord: identification state recorded by a bus scan
//! - PowerReading: one sample of the three power monitor channels

use std::fmt;

use crate::protocol::{self, PMON_CHANNELS, ProtocolError, SLOT_MAX, SLOT_MIN};

/// Telemetry value recorded when a power monitor register could not be read
///
/// Far outside any plausible current or voltage, so it cannot be confused
/// with a decoded reading.
pub const READ_FAILED: f32 = -1_000_000.0;

/// A slot index on the expansion bus, always within 1-15
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotNumber(u8);

impl SlotNumber {
    /// Create a slot number, rejecting anything outside 1-15
    pub fn new(slot: i64) -> Result<Self, ProtocolError> {
        if (i64::from(SLOT_MIN)..=i64::from(SLOT_MAX)).contains(&slot) {
            Ok(Self(slot as u8))
        } else {
            Err(ProtocolError::InvalidSlot(slot))
        }
    }

    /// Iterate over every slot in bus order
    pub fn all() -> impl Iterator<Item = SlotNumber> {
        (SLOT_MIN..=SLOT_MAX).map(SlotNumber)
    }

    /// Raw slot index
    pub fn get(self) -> u8 {
        self.0
    }

    /// I2C address of the module in this slot
    pub fn address(self) -> u8 {
        protocol::slot_address(self.0)
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One identification attribute of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdField {
    /// Nothing acknowledged at the slot address
    #[default]
    NoCard,
    /// A card answered but is not a JuicyBoard module
    Incompatible,
    /// Value read from the module
    Value(u8),
}

impl IdField {
    /// Integer view used on the console: -1, -2 or the byte value
    pub fn raw(self) -> i32 {
        match self {
            IdField::NoCard => -1,
            IdField::Incompatible => -2,
            IdField::Value(v) => i32::from(v),
        }
    }
}

/// Identification state of one slot, as of the last scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotRecord {
    pub platform_id: IdField,
    pub device_id: IdField,
    pub firmware: IdField,
}

impl SlotRecord {
    /// Record for a slot that did not acknowledge the probe
    pub const EMPTY: SlotRecord = SlotRecord {
        platform_id: IdField::NoCard,
        device_id: IdField::NoCard,
        firmware: IdField::NoCard,
    };
}

/// Shunt current and bus voltage of one power monitor channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReading {
    /// Shunt current (mA), or `READ_FAILED`
    pub current_ma: f32,
    /// Bus voltage (V), or `READ_FAILED`
    pub bus_volts: f32,
}

impl Default for ChannelReading {
    fn default() -> Self {
        Self {
            current_ma: READ_FAILED,
            bus_volts: READ_FAILED,
        }
    }
}

/// One telemetry sample across all power monitor channels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerReading {
    pub channels: [ChannelReading; PMON_CHANNELS],
}

impl fmt::Display for PowerReading {
    /// Console telemetry line, without the line terminator
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PMON:")?;
        for (i, ch) in self.channels.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{:.2}mA,{:.3}V", ch.current_ma, ch.bus_volts)?;
        }
        Ok(())
    }
}
