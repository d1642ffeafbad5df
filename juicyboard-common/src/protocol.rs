//! I2C register protocol for the R1000A slot bus
//!
//! This module defines the slot addressing scheme, the identification
//! registers every JuicyBoard module exposes, the power monitor register map,
//! and the fixed-point decoders for the power monitor's ADC registers.

// ============================================================================
// Slot Addressing
// ============================================================================

/// Lowest valid slot number
pub const SLOT_MIN: u8 = 1;

/// Highest valid slot number
pub const SLOT_MAX: u8 = 15;

/// Base I2C address; slot N answers at `SLOT_ADDR_BASE + N`
pub const SLOT_ADDR_BASE: u8 = 0x10;

/// I2C address of the module in the given slot
pub fn slot_address(slot: u8) -> u8 {
    SLOT_ADDR_BASE + slot
}

// ============================================================================
// Module Registers
// ============================================================================

/// Platform ID (byte); also used as the presence probe
pub const REG_PLATFORM_ID: u8 = 0x01;

/// Device (module type) ID (2 bytes, first byte significant)
pub const REG_DEVICE_ID: u8 = 0x02;

/// Firmware version (2 bytes, first byte significant)
pub const REG_FIRMWARE_VERSION: u8 = 0x03;

/// On-module temperature (byte, signed count)
pub const REG_TEMPERATURE: u8 = 0x04;

// ============================================================================
// Power Monitor Registers
// ============================================================================

/// Default I2C address of the on-board power monitor
pub const DEFAULT_POWER_MONITOR_ADDR: u8 = 0x40;

/// Configuration register (word)
pub const PMON_REG_CONFIG: u8 = 0x00;

/// Manufacturer ID register (word)
pub const PMON_REG_MANUFACTURER_ID: u8 = 0xFE;

/// Die ID register (word)
pub const PMON_REG_DIE_ID: u8 = 0xFF;

/// Manufacturer ID reported by a genuine part
pub const PMON_MANUFACTURER_ID: u16 = 0x5449;

/// Die ID reported by a genuine part
pub const PMON_DIE_ID: u16 = 0x3220;

/// Configuration word written at startup: all three channels enabled,
/// 64x averaging, 1.1 ms bus and shunt conversion time, continuous mode
pub const PMON_CONFIG_WORD: u16 = 0x7727;

/// Number of power monitor channels
pub const PMON_CHANNELS: usize = 3;

/// Shunt voltage register of a channel (0-based)
pub fn pmon_shunt_register(channel: usize) -> u8 {
    0x01 + 2 * channel as u8
}

/// Bus voltage register of a channel (0-based)
pub fn pmon_bus_register(channel: usize) -> u8 {
    0x02 + 2 * channel as u8
}

// ============================================================================
// Fixed-Point Decoding
// ============================================================================

/// Shunt voltage LSB in millivolts
pub const SHUNT_LSB_MV: f64 = 0.04;

/// Bus voltage LSB in volts
pub const BUS_LSB_V: f64 = 0.008;

/// Decode a sign + 15-bit register whose value is left-shifted by 3
///
/// Positive values take the 12 magnitude bits directly. Negative values are
/// recovered by the monitor's two's-complement convention restricted to the
/// 15 bits below the sign: subtract one, complement, mask, then drop the
/// three padding bits.
pub fn decode_fixed_point(bytes: [u8; 2], lsb: f64) -> f32 {
    let [hi, lo] = bytes;

    if hi & 0x80 == 0 {
        let magnitude = (u32::from(hi & 0x7F) << 5) | u32::from(lo >> 3);
        (f64::from(magnitude) * lsb) as f32
    } else {
        let mut field = (u32::from(hi & 0x7F) << 8) | u32::from(lo);
        field = field.wrapping_sub(1);
        field = !field & 0x7FFF;
        let magnitude = field >> 3;
        (f64::from(magnitude) * -lsb) as f32
    }
}

/// Decode a shunt voltage register to millivolts
pub fn decode_shunt_mv(bytes: [u8; 2]) -> f32 {
    decode_fixed_point(bytes, SHUNT_LSB_MV)
}

/// Decode a bus voltage register to volts
pub fn decode_bus_volts(bytes: [u8; 2]) -> f32 {
    decode_fixed_point(bytes, BUS_LSB_V)
}

/// Format a register word the way the console always has: both bytes in
/// unpadded hex, concatenated (so `[0x05, 0x07]` prints as `0x57`)
pub fn format_word_bytes(bytes: [u8; 2]) -> String {
    format!("0x{:x}{:x}", bytes[0], bytes[1])
}

// ============================================================================
// Errors
// ============================================================================

/// Protocol errors for slot bus communication
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid slot {0} (expected 1-15)")]
    InvalidSlot(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_magnitude(magnitude: u16) -> [u8; 2] {
        (magnitude << 3).to_be_bytes()
    }

    #[test]
    fn test_slot_addresses() {
        assert_eq!(slot_address(SLOT_MIN), 0x11);
        assert_eq!(slot_address(SLOT_MAX), 0x1F);
    }

    #[test]
    fn test_pmon_channel_registers() {
        assert_eq!(pmon_shunt_register(0), 0x01);
        assert_eq!(pmon_bus_register(0), 0x02);
        assert_eq!(pmon_shunt_register(1), 0x03);
        assert_eq!(pmon_bus_register(1), 0x04);
        assert_eq!(pmon_shunt_register(2), 0x05);
        assert_eq!(pmon_bus_register(2), 0x06);
    }

    #[test]
    fn test_positive_decode_matches_magnitude() {
        for magnitude in [0u16, 1, 2, 100, 1000, 2048, 4095] {
            let bytes = encode_magnitude(magnitude);
            let shunt = decode_shunt_mv(bytes);
            let bus = decode_bus_volts(bytes);
            assert!((f64::from(shunt) - f64::from(magnitude) * 0.04).abs() < 1e-3);
            assert!((f64::from(bus) - f64::from(magnitude) * 0.008).abs() < 1e-4);
        }
    }

    #[test]
    fn test_positive_decode_ignores_padding_bits() {
        assert_eq!(decode_bus_volts([0x00, 0x0F]), decode_bus_volts([0x00, 0x08]));
        assert!((decode_shunt_mv([0x7F, 0xFF]) - 163.8).abs() < 1e-3);
    }

    #[test]
    fn test_negative_decode_reference_table() {
        // (input, magnitude after subtract/complement/mask/shift)
        let table: [([u8; 2], u32); 5] = [
            ([0xFF, 0xF8], 1),
            ([0xFF, 0xFF], 0),
            ([0xC0, 0x00], 2048),
            ([0x80, 0x08], 4095),
            ([0x80, 0x00], 0),
        ];

        for (bytes, magnitude) in table {
            let shunt = decode_shunt_mv(bytes);
            let bus = decode_bus_volts(bytes);
            let expected_shunt = -(magnitude as f64) * 0.04;
            let expected_bus = -(magnitude as f64) * 0.008;
            assert!(
                (f64::from(shunt) - expected_shunt).abs() < 1e-3,
                "shunt {:02X?}: got {}, expected {}",
                bytes,
                shunt,
                expected_shunt
            );
            assert!((f64::from(bus) - expected_bus).abs() < 1e-4);
        }
    }

    #[test]
    fn test_most_negative_pattern_decodes_to_negative_zero() {
        let value = decode_shunt_mv([0x80, 0x00]);
        assert_eq!(value, 0.0);
        assert!(value.is_sign_negative());
    }

    #[test]
    fn test_format_word_bytes() {
        assert_eq!(format_word_bytes([0x77, 0x27]), "0x7727");
        assert_eq!(format_word_bytes([0x54, 0x49]), "0x5449");
        assert_eq!(format_word_bytes([0x05, 0x07]), "0x57");
        assert_eq!(format_word_bytes([0x00, 0x00]), "0x00");
    }

    #[test]
    fn test_config_word_bytes() {
        assert_eq!(PMON_CONFIG_WORD.to_be_bytes(), [0x77, 0x27]);
    }
}
