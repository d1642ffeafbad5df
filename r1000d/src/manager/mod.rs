//! Slot bus manager for the R1000A carrier
//!
//! Owns the per-slot identification table, the module reset line and the
//! power monitor, and writes console responses to the host text stream.
//! Every bus failure here is non-fatal: it turns into a sentinel value or an
//! error line and the operation carries on. Only failures of the output
//! stream or the reset line propagate.

pub mod console;

use embedded_hal::digital::OutputPin;
use std::io::Write;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use juicyboard_common::config::Config;
use juicyboard_common::error::{AppError, I2cError, I2cResult, Result};
use juicyboard_common::protocol::{
    self, PMON_CONFIG_WORD, PMON_REG_CONFIG, PMON_REG_DIE_ID, PMON_REG_MANUFACTURER_ID,
    REG_DEVICE_ID, REG_FIRMWARE_VERSION, REG_PLATFORM_ID, REG_TEMPERATURE, SLOT_MAX,
};
use juicyboard_common::types::{IdField, PowerReading, SlotNumber, SlotRecord};

use crate::i2c::RegisterBus;

pub use console::Command;

/// Slot bus manager
///
/// Generic over the register bus, the reset line and the console output so
/// it can run against hardware or test doubles.
pub struct SlotBusManager<B, P, W> {
    bus: B,
    reset_line: P,
    out: W,
    config: Config,
    /// Indexed by slot number; index 0 is unused
    slots: [SlotRecord; SLOT_MAX as usize + 1],
    last_reading: PowerReading,
}

impl<B, P, W> SlotBusManager<B, P, W>
where
    B: RegisterBus,
    P: OutputPin,
    W: Write,
    AppError: From<P::Error>,
{
    /// Create a manager and release the reset line to its idle (high) level
    pub fn new(bus: B, mut reset_line: P, out: W, config: Config) -> Result<Self> {
        reset_line.set_high()?;

        debug!(
            "Motor slots: alpha={}, beta={}, gamma={}",
            config.alpha_slot_num, config.beta_slot_num, config.gamma_slot_num
        );

        Ok(Self {
            bus,
            reset_line,
            out,
            config,
            slots: [SlotRecord::EMPTY; SLOT_MAX as usize + 1],
            last_reading: PowerReading::default(),
        })
    }

    /// Bring the slot bus up: enumerate, reset, then configure the monitor
    ///
    /// Modules are identified before the reset pulse, and the power monitor
    /// is only touched after the pulse has completed.
    pub fn start(&mut self) -> Result<()> {
        info!("Starting slot bus manager");
        self.scan_bus();
        self.reset_modules()?;
        self.init_power_monitor()?;
        self.out.flush()?;
        Ok(())
    }

    // ========================================================================
    // Slot identification
    // ========================================================================

    /// Probe every slot and record its platform ID, device ID and firmware
    pub fn scan_bus(&mut self) {
        let mut found = 0;

        for slot in SlotNumber::all() {
            let record = self.probe_slot(slot);
            if record.device_id != IdField::NoCard {
                found += 1;
            }
            self.slots[usize::from(slot.get())] = record;
        }

        info!("Slot bus scan complete: {} module(s) found", found);
    }

    fn probe_slot(&mut self, slot: SlotNumber) -> SlotRecord {
        let addr = slot.address();

        let mut probe = [0u8; 1];
        if let Err(e) = self.bus.read_register(addr, REG_PLATFORM_ID, &mut probe) {
            debug!("Slot {} empty: {}", slot, e);
            return SlotRecord::EMPTY;
        }

        let record = SlotRecord {
            platform_id: IdField::Value(probe[0]),
            device_id: self.read_id_field(slot, REG_DEVICE_ID),
            firmware: self.read_id_field(slot, REG_FIRMWARE_VERSION),
        };
        debug!("Slot {} at 0x{:02X}: {:?}", slot, addr, record);
        record
    }

    fn read_id_field(&mut self, slot: SlotNumber, reg: u8) -> IdField {
        let mut buf = [0u8; 2];
        match self.bus.read_register(slot.address(), reg, &mut buf) {
            Ok(()) => IdField::Value(buf[0]),
            Err(e) => {
                warn!("Slot {} acknowledged probe but register read failed: {}", slot, e);
                IdField::NoCard
            }
        }
    }

    /// Print one identification line per slot
    pub fn report_ids(&mut self) -> Result<()> {
        for slot in SlotNumber::all() {
            let record = self.slots[usize::from(slot.get())];
            match record.device_id {
                IdField::NoCard => write!(
                    self.out,
                    "Slot {} NO CARD, ID: {}\r\n",
                    slot,
                    record.device_id.raw()
                )?,
                IdField::Incompatible => write!(
                    self.out,
                    "Slot {} NOT JuicyBoard COMPATIBLE! ID: {}\r\n",
                    slot,
                    record.device_id.raw()
                )?,
                IdField::Value(_) => write!(
                    self.out,
                    "Slot {} MOD #0x{:x}, FW 0x{:x}, PLATID 0x{:x}\r\n",
                    slot,
                    record.device_id.raw(),
                    record.firmware.raw(),
                    record.platform_id.raw()
                )?,
            }
        }
        Ok(())
    }

    /// Identification recorded for a slot by the last scan
    pub fn slot(&self, slot: SlotNumber) -> SlotRecord {
        self.slots[usize::from(slot.get())]
    }

    /// Device ID of a slot as the console reports it (-2, -1 or 0-255)
    pub fn slot_device_id(&self, slot: SlotNumber) -> i32 {
        self.slot(slot).device_id.raw()
    }

    // ========================================================================
    // Module commands
    // ========================================================================

    /// Print the temperature count of the module in the slot named by `arg`
    pub fn print_temperature(&mut self, arg: &str) -> Result<()> {
        let requested = console::parse_long(arg);

        let Ok(slot) = SlotNumber::new(i64::from(requested)) else {
            // Echoed as an unsigned long, so negative input wraps
            write!(self.out, "Invalid slot {}\r\n", requested as u32)?;
            return Ok(());
        };

        let mut buf = [0u8; 1];
        match self.bus.read_register(slot.address(), REG_TEMPERATURE, &mut buf) {
            Ok(()) => write!(self.out, "Slot {} Temp : {}\r\n", slot, buf[0] as i8)?,
            Err(e) => {
                debug!("Temperature read failed: {}", e);
                write!(self.out, "Slot {} did not ack!\r\n", slot)?;
            }
        }
        Ok(())
    }

    /// Pulse the shared reset line low for the configured width
    ///
    /// Blocks the calling thread for the whole pulse, so no other bus
    /// traffic can be issued until the modules are released.
    pub fn reset_modules(&mut self) -> Result<()> {
        let width = Duration::from_millis(self.config.reset_delay_ms);

        write!(self.out, "Resetting Mods...\r\n")?;
        info!("Resetting slot modules ({} ms pulse)", width.as_millis());

        self.reset_line.set_low()?;
        thread::sleep(width);
        self.reset_line.set_high()?;
        Ok(())
    }

    // ========================================================================
    // Power monitor
    // ========================================================================

    /// Write the operating configuration to the power monitor, with a
    /// readback before and after
    pub fn init_power_monitor(&mut self) -> Result<()> {
        let addr = self.config.power_monitor_addr;
        info!("Initializing power monitor at 0x{:02X}", addr);

        self.readback_power_monitor_config()?;

        let word = PMON_CONFIG_WORD.to_be_bytes();
        match self.bus.write_register(addr, PMON_REG_CONFIG, &word) {
            Ok(()) => write!(
                self.out,
                "Successfully wrote config {} to INL322\r\n",
                protocol::format_word_bytes(word)
            )?,
            Err(e) => self.report_bus_error(&e)?,
        }

        self.readback_power_monitor_config()
    }

    fn readback_power_monitor_config(&mut self) -> Result<()> {
        match self.read_power_monitor_word(PMON_REG_CONFIG) {
            Ok(word) => write!(
                self.out,
                "Readback INL322 Config {}\r\n",
                protocol::format_word_bytes(word)
            )?,
            Err(e) => self.report_bus_error(&e)?,
        }
        Ok(())
    }

    /// Print the configuration, manufacturer ID and die ID registers
    pub fn print_power_monitor_config(&mut self) -> Result<()> {
        let registers = [
            (PMON_REG_CONFIG, "INL322 Config Register:".to_string()),
            (
                PMON_REG_MANUFACTURER_ID,
                format!("INL322 Manufacturer ID (0x{:x}):", protocol::PMON_MANUFACTURER_ID),
            ),
            (
                PMON_REG_DIE_ID,
                format!("INL322 Die ID (0x{:x}):", protocol::PMON_DIE_ID),
            ),
        ];

        for (reg, label) in registers {
            match self.read_power_monitor_word(reg) {
                Ok(word) => write!(
                    self.out,
                    "{} {}\r\n",
                    label,
                    protocol::format_word_bytes(word)
                )?,
                Err(e) => self.report_bus_error(&e)?,
            }
        }
        Ok(())
    }

    /// Sample shunt current and bus voltage on every channel and print the
    /// telemetry line
    ///
    /// Each register read stands alone; a failed read leaves `READ_FAILED`
    /// in its field and the line is printed regardless.
    pub fn read_power_monitor(&mut self) -> Result<PowerReading> {
        let mut reading = PowerReading::default();

        for (ch, channel) in reading.channels.iter_mut().enumerate() {
            match self.read_power_monitor_word(protocol::pmon_shunt_register(ch)) {
                Ok(word) => {
                    let shunt_ohms = self.config.shunt_resistance[ch] as f32;
                    channel.current_ma = protocol::decode_shunt_mv(word) / shunt_ohms;
                }
                Err(e) => debug!("Channel {} shunt read failed: {}", ch + 1, e),
            }

            match self.read_power_monitor_word(protocol::pmon_bus_register(ch)) {
                Ok(word) => channel.bus_volts = protocol::decode_bus_volts(word),
                Err(e) => debug!("Channel {} bus read failed: {}", ch + 1, e),
            }
        }

        write!(self.out, "{}\r\n", reading)?;
        self.last_reading = reading;
        Ok(reading)
    }

    /// Most recent telemetry sample
    pub fn last_reading(&self) -> &PowerReading {
        &self.last_reading
    }

    fn read_power_monitor_word(&mut self, reg: u8) -> I2cResult<[u8; 2]> {
        let mut buf = [0u8; 2];
        self.bus
            .read_register(self.config.power_monitor_addr, reg, &mut buf)?;
        Ok(buf)
    }

    fn report_bus_error(&mut self, err: &I2cError) -> Result<()> {
        warn!("Power monitor transaction failed: {}", err);
        write!(self.out, "I2C Read Error!\r\n")?;
        Ok(())
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Dump the configured motor slots and the alpha slot's direction pin
    pub fn show_config(&mut self) -> Result<()> {
        let pins = self.config.motor_pins(self.config.alpha_slot_num);

        write!(self.out, "reporting config values\r\n")?;
        write!(self.out, "alpha_slot_num {}\r\n", self.config.alpha_slot_num)?;
        write!(self.out, "dir_pin: {}\r\n", pins.dir_pin)?;
        write!(self.out, "beta_slot_num {}\r\n", self.config.beta_slot_num)?;
        write!(self.out, "gamma_slot_num {}\r\n", self.config.gamma_slot_num)?;
        Ok(())
    }

    /// Release the reset line so modules are not held in reset after exit
    pub fn release_reset_line(&mut self) -> Result<()> {
        self.reset_line.set_high()?;
        Ok(())
    }
}
