//! I2C Transport Abstraction
//!
//! Devices only carry their bus and address; register access goes through an
//! [`I2cTransport`] supplied by the caller's [`crate::services::Services`].

use std::fmt;

use thiserror::Error;

/// Location of a device on the I2C topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct I2cInterface {
    pub bus: u8,
    pub address: u8,
}

impl I2cInterface {
    pub fn new(bus: u8, address: u8) -> Self {
        Self { bus, address }
    }
}

impl fmt::Display for I2cInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus {}, address 0x{:02X}", self.bus, self.address)
    }
}

/// I2C transport errors
#[derive(Debug, Clone, Error)]
pub enum I2cError {
    #[error("I2CException: Failed to read: bus {bus}, addr 0x{address:02X}, register 0x{register:02X}: {cause}")]
    Read {
        bus: u8,
        address: u8,
        register: u8,
        cause: String,
    },

    #[error("I2CException: Failed to write: bus {bus}, addr 0x{address:02X}, register 0x{register:02X}: {cause}")]
    Write {
        bus: u8,
        address: u8,
        register: u8,
        cause: String,
    },
}

impl I2cError {
    pub fn read(interface: &I2cInterface, register: u8, cause: impl Into<String>) -> Self {
        I2cError::Read {
            bus: interface.bus,
            address: interface.address,
            register,
            cause: cause.into(),
        }
    }

    pub fn write(interface: &I2cInterface, register: u8, cause: impl Into<String>) -> Self {
        I2cError::Write {
            bus: interface.bus,
            address: interface.address,
            register,
            cause: cause.into(),
        }
    }
}

/// Register-level I2C/SMBus access
///
/// Implementations own retries and timeouts; the engine never retries.
pub trait I2cTransport: Send + Sync {
    fn read_byte(&self, interface: &I2cInterface, register: u8) -> Result<u8, I2cError>;

    /// SMBus read word (little-endian)
    fn read_word(&self, interface: &I2cInterface, register: u8) -> Result<u16, I2cError>;

    /// I2C block read of `count` bytes starting at `register`
    fn read_bytes(
        &self,
        interface: &I2cInterface,
        register: u8,
        count: u8,
    ) -> Result<Vec<u8>, I2cError>;

    fn write_byte(&self, interface: &I2cInterface, register: u8, value: u8)
        -> Result<(), I2cError>;

    /// SMBus write word (little-endian)
    fn write_word(
        &self,
        interface: &I2cInterface,
        register: u8,
        value: u16,
    ) -> Result<(), I2cError>;

    /// I2C block write starting at `register`
    fn write_bytes(
        &self,
        interface: &I2cInterface,
        register: u8,
        values: &[u8],
    ) -> Result<(), I2cError>;
}

/// Transport bound to one device's interface
#[derive(Clone, Copy)]
pub struct DeviceI2c<'a> {
    transport: &'a dyn I2cTransport,
    interface: I2cInterface,
}

impl<'a> DeviceI2c<'a> {
    pub fn new(transport: &'a dyn I2cTransport, interface: I2cInterface) -> Self {
        Self {
            transport,
            interface,
        }
    }

    pub fn interface(&self) -> &I2cInterface {
        &self.interface
    }

    pub fn read_byte(&self, register: u8) -> Result<u8, I2cError> {
        self.transport.read_byte(&self.interface, register)
    }

    pub fn read_word(&self, register: u8) -> Result<u16, I2cError> {
        self.transport.read_word(&self.interface, register)
    }

    pub fn read_bytes(&self, register: u8, count: u8) -> Result<Vec<u8>, I2cError> {
        self.transport.read_bytes(&self.interface, register, count)
    }

    pub fn write_byte(&self, register: u8, value: u8) -> Result<(), I2cError> {
        self.transport.write_byte(&self.interface, register, value)
    }

    pub fn write_word(&self, register: u8, value: u16) -> Result<(), I2cError> {
        self.transport.write_word(&self.interface, register, value)
    }

    pub fn write_bytes(&self, register: u8, values: &[u8]) -> Result<(), I2cError> {
        self.transport.write_bytes(&self.interface, register, values)
    }
}
