//! Console command parsing and dispatch
//!
//! Grammar (one command per line, tokens separated by whitespace):
//!
//! ```text
//! mod temp <slot>
//! mod scan
//! mod reset
//! mod showconfig
//! mod getpmoncfg
//! mod readpmon
//! ```
//!
//! Lines for other consoles and unknown `mod` subcommands are ignored.

use embedded_hal::digital::OutputPin;
use std::io::Write;
use tracing::debug;

use juicyboard_common::error::{AppError, Result};

use super::SlotBusManager;
use crate::i2c::RegisterBus;

/// A recognised `mod` console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read a module's temperature; the argument is kept raw (may be empty)
    Temp(String),
    /// Rescan the bus and print the slot report
    Scan,
    /// Pulse the module reset line
    Reset,
    /// Dump the configured motor slots
    ShowConfig,
    /// Print the power monitor identification registers
    GetPowerMonitorConfig,
    /// Print one telemetry line
    ReadPowerMonitor,
}

impl Command {
    /// Parse a console line; `None` if the line is not a `mod` command this
    /// module understands
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();

        if tokens.next()? != "mod" {
            return None;
        }

        match tokens.next()? {
            "temp" => Some(Command::Temp(tokens.next().unwrap_or("").to_string())),
            "scan" => Some(Command::Scan),
            "reset" => Some(Command::Reset),
            "showconfig" => Some(Command::ShowConfig),
            "getpmoncfg" => Some(Command::GetPowerMonitorConfig),
            "readpmon" => Some(Command::ReadPowerMonitor),
            _ => None,
        }
    }
}

/// Parse a leading decimal integer the way C's `strtol` does for a 32-bit
/// `long`
///
/// Leading whitespace and one sign are accepted, parsing stops at the first
/// non-digit, and input without digits yields 0. Out-of-range values
/// saturate.
pub fn parse_long(input: &str) -> i32 {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i32 = 0;
    for d in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i32::from(d - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(d)
        } else {
            value.saturating_mul(10).saturating_add(d)
        };
    }
    value
}

impl<B, P, W> SlotBusManager<B, P, W>
where
    B: RegisterBus,
    P: OutputPin,
    W: Write,
    AppError: From<P::Error>,
{
    /// Handle one console line, ignoring anything that is not ours
    pub fn handle_line(&mut self, line: &str) -> Result<()> {
        match Command::parse(line) {
            Some(cmd) => self.execute(cmd),
            None => {
                debug!("Ignoring console line {:?}", line.trim_end());
                Ok(())
            }
        }
    }

    /// Run a parsed console command
    pub fn execute(&mut self, cmd: Command) -> Result<()> {
        debug!("Console command: {:?}", cmd);

        match cmd {
            Command::Temp(arg) => self.print_temperature(&arg)?,
            Command::Scan => {
                self.scan_bus();
                self.report_ids()?;
            }
            Command::Reset => self.reset_modules()?,
            Command::ShowConfig => self.show_config()?,
            Command::GetPowerMonitorConfig => self.print_power_monitor_config()?,
            Command::ReadPowerMonitor => {
                self.read_power_monitor()?;
            }
        }

        self.out.flush()?;
        Ok(())
    }
}
