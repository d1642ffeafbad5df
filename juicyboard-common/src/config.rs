//! Configuration types and loading for the slot bus manager

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::protocol::{DEFAULT_POWER_MONITOR_ADDR, PMON_CHANNELS, SLOT_MAX};

/// Default configuration file location
pub const DEFAULT_CONFIG_FILE: &str = "/etc/r1000d/r1000d.conf";

/// Default I2C bus number
pub const DEFAULT_I2C_BUS: u8 = 1;

/// Default sysfs GPIO line driving the module reset net (port 3, pin 25)
pub const DEFAULT_RESET_GPIO: u32 = 3 * 32 + 25;

/// Default reset pulse width in milliseconds
pub const DEFAULT_RESET_DELAY_MS: u64 = 10;

/// Default shunt resistance of each power monitor channel in ohms
pub const DEFAULT_SHUNT_RESISTANCE: f64 = 0.1;

/// Pin name used for motor pins that are not wired
pub const PIN_NOT_CONNECTED: &str = "nc";

/// Configuration for the slot bus daemon
///
/// Field names with underscores map to dash-separated keys in YAML
/// (e.g., `alpha_slot_num` <-> `alpha-slot-num`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// I2C bus number
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u8,

    /// I2C address of the on-board power monitor
    #[serde(default = "default_power_monitor_addr")]
    pub power_monitor_addr: u8,

    /// sysfs GPIO number of the open-drain module reset line
    #[serde(default = "default_reset_gpio")]
    pub reset_gpio: u32,

    /// How long the reset line is held low, in milliseconds
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,

    /// Slot carrying the alpha axis motor driver (0 = unassigned)
    #[serde(default)]
    pub alpha_slot_num: i32,

    /// Slot carrying the beta axis motor driver (0 = unassigned)
    #[serde(default)]
    pub beta_slot_num: i32,

    /// Slot carrying the gamma axis motor driver (0 = unassigned)
    #[serde(default)]
    pub gamma_slot_num: i32,

    /// Shunt resistor on each power monitor channel, in ohms
    #[serde(default = "default_shunt_resistance")]
    pub shunt_resistance: [f64; PMON_CHANNELS],

    /// Motor driver pin names, keyed by slot number
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub motor_pins: BTreeMap<u8, MotorPins>,
}

/// Pin names of the motor driver wired to one slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MotorPins {
    #[serde(default = "default_pin")]
    pub en_pin: String,

    #[serde(default = "default_pin")]
    pub step_pin: String,

    #[serde(default = "default_pin")]
    pub dir_pin: String,
}

impl Default for MotorPins {
    fn default() -> Self {
        Self {
            en_pin: default_pin(),
            step_pin: default_pin(),
            dir_pin: default_pin(),
        }
    }
}

// Default value functions for serde
fn default_i2c_bus() -> u8 {
    DEFAULT_I2C_BUS
}

fn default_power_monitor_addr() -> u8 {
    DEFAULT_POWER_MONITOR_ADDR
}

fn default_reset_gpio() -> u32 {
    DEFAULT_RESET_GPIO
}

fn default_reset_delay_ms() -> u64 {
    DEFAULT_RESET_DELAY_MS
}

fn default_shunt_resistance() -> [f64; PMON_CHANNELS] {
    [DEFAULT_SHUNT_RESISTANCE; PMON_CHANNELS]
}

fn default_pin() -> String {
    PIN_NOT_CONNECTED.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            i2c_bus: DEFAULT_I2C_BUS,
            power_monitor_addr: DEFAULT_POWER_MONITOR_ADDR,
            reset_gpio: DEFAULT_RESET_GPIO,
            reset_delay_ms: DEFAULT_RESET_DELAY_MS,
            alpha_slot_num: 0,
            beta_slot_num: 0,
            gamma_slot_num: 0,
            shunt_resistance: default_shunt_resistance(),
            motor_pins: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// Returns `Ok(Config)` if the file exists and is valid YAML.
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.into(), e))?;

        serde_yaml::from_str(&contents)
            .map_err(|e| ConfigError::YamlParse(path.into(), e.to_string()))
    }

    /// Load configuration from a file if it exists, otherwise return defaults
    ///
    /// This is useful for the default config file location where a missing file is not an error.
    pub fn from_file_or_default(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, slot) in [
            ("alpha-slot-num", self.alpha_slot_num),
            ("beta-slot-num", self.beta_slot_num),
            ("gamma-slot-num", self.gamma_slot_num),
        ] {
            if !(0..=i32::from(SLOT_MAX)).contains(&slot) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} {} is out of range (expected 0-{}, 0 = unassigned)",
                    key, slot, SLOT_MAX
                )));
            }
        }

        if let Some(slot) = self.motor_pins.keys().find(|s| **s == 0 || **s > SLOT_MAX) {
            return Err(ConfigError::InvalidValue(format!(
                "motor-pins entry for slot {} is out of range (expected 1-{})",
                slot, SLOT_MAX
            )));
        }

        if self.shunt_resistance.iter().any(|r| *r <= 0.0) {
            return Err(ConfigError::InvalidValue(
                "shunt-resistance values must be positive".to_string(),
            ));
        }

        if self.reset_delay_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "reset-delay-ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Motor driver pins wired to a slot, or all-`nc` for unwired slots
    pub fn motor_pins(&self, slot: i32) -> MotorPins {
        u8::try_from(slot)
            .ok()
            .and_then(|s| self.motor_pins.get(&s))
            .cloned()
            .unwrap_or_default()
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse YAML config file {0}: {1}")]
    YamlParse(PathBuf, String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
