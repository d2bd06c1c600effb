//! I2C register actions
//!
//! All register access goes through the current device's I2C interface.
//! Transport failures are wrapped in an action error naming the action.

use std::fmt;

use super::{hex_byte, hex_bytes};
use crate::action_environment::ActionEnvironment;
use crate::error::{Error, Result};

fn check_bit_position(position: u8) -> Result<()> {
    if position > 7 {
        return Err(Error::Internal(format!("Invalid bit position: {}", position)));
    }
    Ok(())
}

fn check_bit_value(value: u8) -> Result<()> {
    if value > 1 {
        return Err(Error::Internal(format!("Invalid bit value: {}", value)));
    }
    Ok(())
}

/// Check a byte list is usable for a block transfer and expand missing masks
fn block_masks(values: &[u8], masks: Option<Vec<u8>>) -> Result<Vec<u8>> {
    if values.is_empty() || values.len() > usize::from(u8::MAX) {
        return Err(Error::Internal(format!(
            "Invalid number of elements in values: {}",
            values.len()
        )));
    }
    match masks {
        Some(masks) if masks.len() != values.len() => Err(Error::Internal(
            "Invalid number of elements in masks".to_string(),
        )),
        Some(masks) => Ok(masks),
        None => Ok(vec![0xFF; values.len()]),
    }
}

// ============================================================================
// Comparisons
// ============================================================================

/// Compares one bit of a register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cCompareBitAction {
    register: u8,
    position: u8,
    value: u8,
}

impl I2cCompareBitAction {
    pub fn new(register: u8, position: u8, value: u8) -> Result<Self> {
        check_bit_position(position)?;
        check_bit_value(value)?;
        Ok(Self {
            register,
            position,
            value,
        })
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let i2c = env.i2c()?;
        let actual = i2c
            .read_byte(self.register)
            .map_err(|e| Error::action(self, e))?;
        Ok((actual >> self.position) & 0x01 == self.value)
    }
}

impl fmt::Display for I2cCompareBitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i2c_compare_bit: {{ register: {}, position: {}, value: {} }}",
            hex_byte(self.register),
            self.position,
            self.value
        )
    }
}

/// Compares a register to a byte under an optional mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cCompareByteAction {
    register: u8,
    value: u8,
    mask: u8,
}

impl I2cCompareByteAction {
    pub fn new(register: u8, value: u8, mask: Option<u8>) -> Self {
        Self {
            register,
            value,
            mask: mask.unwrap_or(0xFF),
        }
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let i2c = env.i2c()?;
        let actual = i2c
            .read_byte(self.register)
            .map_err(|e| Error::action(self, e))?;
        Ok(actual & self.mask == self.value & self.mask)
    }
}

impl fmt::Display for I2cCompareByteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i2c_compare_byte: {{ register: {}, value: {}, mask: {} }}",
            hex_byte(self.register),
            hex_byte(self.value),
            hex_byte(self.mask)
        )
    }
}

/// Compares consecutive registers to a byte list, each under its own mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cCompareBytesAction {
    register: u8,
    values: Vec<u8>,
    masks: Vec<u8>,
}

impl I2cCompareBytesAction {
    pub fn new(register: u8, values: Vec<u8>, masks: Option<Vec<u8>>) -> Result<Self> {
        let masks = block_masks(&values, masks)?;
        Ok(Self {
            register,
            values,
            masks,
        })
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let i2c = env.i2c()?;
        let actual = i2c
            .read_bytes(self.register, self.values.len() as u8)
            .map_err(|e| Error::action(self, e))?;
        Ok(actual.len() == self.values.len()
            && actual
                .iter()
                .zip(self.values.iter().zip(&self.masks))
                .all(|(a, (v, m))| a & m == v & m))
    }
}

impl fmt::Display for I2cCompareBytesAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i2c_compare_bytes: {{ register: {}, values: {}, masks: {} }}",
            hex_byte(self.register),
            hex_bytes(&self.values),
            hex_bytes(&self.masks)
        )
    }
}

// ============================================================================
// Writes
// ============================================================================

/// Sets or clears one bit of a register (read-modify-write)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cWriteBitAction {
    register: u8,
    position: u8,
    value: u8,
}

impl I2cWriteBitAction {
    pub fn new(register: u8, position: u8, value: u8) -> Result<Self> {
        check_bit_position(position)?;
        check_bit_value(value)?;
        Ok(Self {
            register,
            position,
            value,
        })
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let i2c = env.i2c()?;
        let current = i2c
            .read_byte(self.register)
            .map_err(|e| Error::action(self, e))?;
        let updated = if self.value == 1 {
            current | (1 << self.position)
        } else {
            current & !(1 << self.position)
        };
        i2c.write_byte(self.register, updated)
            .map_err(|e| Error::action(self, e))?;
        Ok(true)
    }
}

impl fmt::Display for I2cWriteBitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i2c_write_bit: {{ register: {}, position: {}, value: {} }}",
            hex_byte(self.register),
            self.position,
            self.value
        )
    }
}

/// Writes a byte; bits outside `mask` keep their current value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cWriteByteAction {
    register: u8,
    value: u8,
    mask: u8,
}

impl I2cWriteByteAction {
    pub fn new(register: u8, value: u8, mask: Option<u8>) -> Self {
        Self {
            register,
            value,
            mask: mask.unwrap_or(0xFF),
        }
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let i2c = env.i2c()?;
        let value = if self.mask == 0xFF {
            self.value
        } else {
            let current = i2c
                .read_byte(self.register)
                .map_err(|e| Error::action(self, e))?;
            (self.value & self.mask) | (current & !self.mask)
        };
        i2c.write_byte(self.register, value)
            .map_err(|e| Error::action(self, e))?;
        Ok(true)
    }
}

impl fmt::Display for I2cWriteByteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i2c_write_byte: {{ register: {}, value: {}, mask: {} }}",
            hex_byte(self.register),
            hex_byte(self.value),
            hex_byte(self.mask)
        )
    }
}

/// Writes consecutive registers; masked bits keep their current value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cWriteBytesAction {
    register: u8,
    values: Vec<u8>,
    masks: Option<Vec<u8>>,
}

impl I2cWriteBytesAction {
    pub fn new(register: u8, values: Vec<u8>, masks: Option<Vec<u8>>) -> Result<Self> {
        block_masks(&values, masks.clone())?;
        Ok(Self {
            register,
            values,
            masks,
        })
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let i2c = env.i2c()?;
        let values = match &self.masks {
            None => self.values.clone(),
            Some(masks) => {
                let current = i2c
                    .read_bytes(self.register, self.values.len() as u8)
                    .map_err(|e| Error::action(self, e))?;
                if current.len() != self.values.len() {
                    return Err(Error::action(
                        self,
                        Error::Internal(format!(
                            "Read {} byte(s) from register {}, expected {}",
                            current.len(),
                            hex_byte(self.register),
                            self.values.len()
                        )),
                    ));
                }
                self.values
                    .iter()
                    .zip(masks)
                    .zip(current)
                    .map(|((v, m), c)| (v & m) | (c & !m))
                    .collect()
            },
        };
        i2c.write_bytes(self.register, &values)
            .map_err(|e| Error::action(self, e))?;
        Ok(true)
    }
}

impl fmt::Display for I2cWriteBytesAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i2c_write_bytes: {{ register: {}, values: {}",
            hex_byte(self.register),
            hex_bytes(&self.values)
        )?;
        if let Some(masks) = &self.masks {
            write!(f, ", masks: {}", hex_bytes(masks))?;
        }
        f.write_str(" }")
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Captures register contents into the environment's additional error data
///
/// The key is `<device>_register_0xNN`; repeated captures of the same register
/// get a `_2`, `_3`, ... suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cCaptureBytesAction {
    register: u8,
    count: u8,
}

impl I2cCaptureBytesAction {
    pub fn new(register: u8, count: u8) -> Result<Self> {
        if count < 1 {
            return Err(Error::Internal(format!("Invalid byte count: {}", count)));
        }
        Ok(Self { register, count })
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let i2c = env.i2c()?;
        let values = i2c
            .read_bytes(self.register, self.count)
            .map_err(|e| Error::action(self, e))?;

        let base = format!("{}_register_{}", env.device_id(), hex_byte(self.register));
        let mut key = base.clone();
        let mut n = 1;
        while env.additional_error_data().contains_key(&key) {
            n += 1;
            key = format!("{}_{}", base, n);
        }
        env.add_additional_error_data(key, hex_bytes(&values));
        Ok(true)
    }
}

impl fmt::Display for I2cCaptureBytesAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i2c_capture_bytes: {{ register: {}, count: {} }}",
            hex_byte(self.register),
            self.count
        )
    }
}
