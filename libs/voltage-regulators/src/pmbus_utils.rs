//! PMBus data formats and conversions

use std::fmt;

/// VOUT_MODE command code
pub const VOUT_MODE: u8 = 0x20;

/// VOUT_COMMAND command code
pub const VOUT_COMMAND: u8 = 0x21;

/// Data format of a sensor value read from a PMBus command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDataFormat {
    /// 5-bit two's complement exponent, 11-bit two's complement mantissa
    Linear11,
    /// 16-bit unsigned mantissa; exponent comes from VOUT_MODE
    Linear16,
}

impl SensorDataFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear_11" => Some(SensorDataFormat::Linear11),
            "linear_16" => Some(SensorDataFormat::Linear16),
            _ => None,
        }
    }
}

impl fmt::Display for SensorDataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SensorDataFormat::Linear11 => "linear_11",
            SensorDataFormat::Linear16 => "linear_16",
        })
    }
}

/// Data format of VOUT_COMMAND and related commands (VOUT_MODE bits 7:5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoutDataFormat {
    Linear,
    Vid,
    Direct,
    Ieee,
}

impl fmt::Display for VoutDataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VoutDataFormat::Linear => "linear",
            VoutDataFormat::Vid => "vid",
            VoutDataFormat::Direct => "direct",
            VoutDataFormat::Ieee => "ieee",
        })
    }
}

/// Split a VOUT_MODE byte into data format and parameter.
///
/// For linear format the parameter is the 5-bit two's complement exponent,
/// sign-extended. Returns `None` for the reserved mode values.
pub fn parse_vout_mode(vout_mode: u8) -> Option<(VoutDataFormat, i8)> {
    let mode = (vout_mode & 0b1110_0000) >> 5;
    let parameter = vout_mode & 0b0001_1111;

    let format = match mode {
        0b000 => VoutDataFormat::Linear,
        0b001 => VoutDataFormat::Vid,
        0b010 => VoutDataFormat::Direct,
        0b011 => VoutDataFormat::Ieee,
        _ => return None,
    };

    let parameter = if format == VoutDataFormat::Linear && parameter & 0x10 != 0 {
        (parameter | 0xE0) as i8
    } else {
        parameter as i8
    };
    Some((format, parameter))
}

/// Decode a linear_11 value.
pub fn convert_from_linear(value: u16) -> f64 {
    // Exponent is the high 5 bits, mantissa the low 11, both two's complement
    let exponent = ((value as i16) >> 11) as i32;
    let mantissa = (((value & 0x07FF) << 5) as i16 >> 5) as f64;
    mantissa * 2f64.powi(exponent)
}

/// Decode a linear_16 value using `exponent` from VOUT_MODE.
pub fn convert_from_vout_linear(value: u16, exponent: i8) -> f64 {
    f64::from(value) * 2f64.powi(i32::from(exponent))
}

/// Encode `volts` as a linear_16 mantissa, rounded to the nearest step.
pub fn convert_to_vout_linear(volts: f64, exponent: i8) -> u16 {
    let mantissa = volts / 2f64.powi(i32::from(exponent));
    mantissa.round().clamp(0.0, f64::from(u16::MAX)) as u16
}
