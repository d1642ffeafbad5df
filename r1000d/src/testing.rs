//! Test doubles for the register bus and the reset line

use std::collections::HashMap;
use std::convert::Infallible;
use std::io;
use std::time::Instant;

use embedded_hal::digital::{ErrorType, OutputPin};
use juicyboard_common::config::Config;
use juicyboard_common::error::{I2cError, I2cResult};

use crate::i2c::RegisterBus;
use crate::manager::SlotBusManager;

/// In-memory register file; registers that were never set NACK
#[derive(Default)]
pub struct MockBus {
    registers: HashMap<(u8, u8), Vec<u8>>,
    /// Every read issued, in order
    pub reads: Vec<(u8, u8)>,
    /// Every write issued, in order
    pub writes: Vec<(u8, u8, Vec<u8>)>,
    /// Reject all writes
    pub fail_writes: bool,
}

impl MockBus {
    pub fn with_register(mut self, addr: u8, reg: u8, bytes: &[u8]) -> Self {
        self.registers.insert((addr, reg), bytes.to_vec());
        self
    }
}

impl RegisterBus for MockBus {
    fn read_register(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> I2cResult<()> {
        self.reads.push((addr, reg));
        let bytes = self
            .registers
            .get(&(addr, reg))
            .ok_or(I2cError::NoAcknowledge { addr, reg })?;
        let n = buf.len().min(bytes.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(())
    }

    fn write_register(&mut self, addr: u8, reg: u8, data: &[u8]) -> I2cResult<()> {
        self.writes.push((addr, reg, data.to_vec()));
        if self.fail_writes {
            return Err(I2cError::NoAcknowledge { addr, reg });
        }
        self.registers.insert((addr, reg), data.to_vec());
        Ok(())
    }
}

/// Output pin that timestamps every level change (`true` = high)
#[derive(Default)]
pub struct RecordingPin {
    pub events: Vec<(bool, Instant)>,
}

impl RecordingPin {
    pub fn levels(&self) -> Vec<bool> {
        self.events.iter().map(|(level, _)| *level).collect()
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.events.push((false, Instant::now()));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.events.push((true, Instant::now()));
        Ok(())
    }
}

/// Console stream whose every write fails
pub struct FailingWriter;

impl io::Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"))
    }
}

/// Manager wired to mocks, with the console output captured
pub struct Harness {
    pub bus: MockBus,
    pub pin: RecordingPin,
    pub out: Vec<u8>,
    pub config: Config,
}

impl Harness {
    pub fn new(bus: MockBus) -> Self {
        Self::with_config(bus, Config::default())
    }

    pub fn with_config(bus: MockBus, config: Config) -> Self {
        Self {
            bus,
            pin: RecordingPin::default(),
            out: Vec::new(),
            config,
        }
    }

    pub fn manager(
        &mut self,
    ) -> SlotBusManager<&mut MockBus, &mut RecordingPin, &mut Vec<u8>> {
        SlotBusManager::new(&mut self.bus, &mut self.pin, &mut self.out, self.config.clone())
            .unwrap()
    }

    pub fn output(&self) -> String {
        String::from_utf8(self.out.clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.output()
            .split_terminator("\r\n")
            .map(str::to_string)
            .collect()
    }
}
