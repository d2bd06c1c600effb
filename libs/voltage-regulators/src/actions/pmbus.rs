//! PMBus actions: pmbus_read_sensor, pmbus_write_vout_command

use std::fmt;

use tracing::debug;

use super::hex_byte;
use crate::action_environment::ActionEnvironment;
use crate::device::Device;
use crate::error::{Error, PmbusError, Result, WriteVerificationError};
use crate::i2c::DeviceI2c;
use crate::pmbus_utils::{
    self, SensorDataFormat, VoutDataFormat, VOUT_COMMAND, VOUT_MODE,
};
use crate::services::SensorType;

/// Read the linear exponent from VOUT_MODE
fn read_vout_exponent(
    action: &impl fmt::Display,
    i2c: &DeviceI2c<'_>,
    device: &Device,
    what: &str,
) -> Result<i8> {
    let vout_mode = i2c
        .read_byte(VOUT_MODE)
        .map_err(|e| Error::action(action, e))?;
    match pmbus_utils::parse_vout_mode(vout_mode) {
        Some((VoutDataFormat::Linear, exponent)) => Ok(exponent),
        _ => Err(Error::action(
            action,
            PmbusError::new(
                format!("{}: Device does not use linear format", what),
                device.id(),
                device.fru(),
            ),
        )),
    }
}

/// Reads a sensor value and publishes it for the current rail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmbusReadSensorAction {
    sensor_type: SensorType,
    command: u8,
    format: SensorDataFormat,
    exponent: Option<i8>,
}

impl PmbusReadSensorAction {
    pub fn new(
        sensor_type: SensorType,
        command: u8,
        format: SensorDataFormat,
        exponent: Option<i8>,
    ) -> Self {
        Self {
            sensor_type,
            command,
            format,
            exponent,
        }
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let device = env.device()?;
        let i2c = env.i2c()?;

        let raw = i2c
            .read_word(self.command)
            .map_err(|e| Error::action(self, e))?;
        let value = match self.format {
            SensorDataFormat::Linear11 => pmbus_utils::convert_from_linear(raw),
            SensorDataFormat::Linear16 => {
                let exponent = match self.exponent {
                    Some(exponent) => exponent,
                    None => read_vout_exponent(self, &i2c, device, "Unable to read sensor")?,
                };
                pmbus_utils::convert_from_vout_linear(raw, exponent)
            },
        };

        debug!("{} {} = {}", device.id(), self.sensor_type, value);
        env.services()
            .sensors()
            .set_value(self.sensor_type, value)
            .map_err(|e| Error::action(self, e))?;
        Ok(true)
    }
}

impl fmt::Display for PmbusReadSensorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pmbus_read_sensor: {{ type: {}, command: {}, format: {}",
            self.sensor_type,
            hex_byte(self.command),
            self.format
        )?;
        if let Some(exponent) = self.exponent {
            write!(f, ", exponent: {}", exponent)?;
        }
        f.write_str(" }")
    }
}

/// Writes VOUT_COMMAND in linear format
///
/// Volts come from the action or, when absent, from the environment. The
/// exponent comes from the action or, when absent, from VOUT_MODE.
#[derive(Debug, Clone, PartialEq)]
pub struct PmbusWriteVoutCommandAction {
    volts: Option<f64>,
    format: VoutDataFormat,
    exponent: Option<i8>,
    is_verified: bool,
}

impl PmbusWriteVoutCommandAction {
    pub fn new(
        volts: Option<f64>,
        format: VoutDataFormat,
        exponent: Option<i8>,
        is_verified: bool,
    ) -> Result<Self> {
        if format != VoutDataFormat::Linear {
            return Err(Error::Internal(format!("Unsupported data format specified: {}", format)));
        }
        Ok(Self {
            volts,
            format,
            exponent,
            is_verified,
        })
    }

    pub fn volts(&self) -> Option<f64> {
        self.volts
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let volts = self
            .volts
            .or_else(|| env.volts())
            .ok_or_else(|| Error::action(self, Error::Internal("No volts value defined".to_string())))?;

        let device = env.device()?;
        let i2c = env.i2c()?;

        let exponent = match self.exponent {
            Some(exponent) => exponent,
            None => read_vout_exponent(self, &i2c, device, "Unable to write VOUT_COMMAND")?,
        };

        let value = pmbus_utils::convert_to_vout_linear(volts, exponent);
        i2c.write_word(VOUT_COMMAND, value)
            .map_err(|e| Error::action(self, e))?;

        if self.is_verified {
            let read_back = i2c
                .read_word(VOUT_COMMAND)
                .map_err(|e| Error::action(self, e))?;
            if read_back != value {
                return Err(Error::action(
                    self,
                    WriteVerificationError::new(
                        format!(
                            "device: {}, register: VOUT_COMMAND, value_written: 0x{:X}, value_read: 0x{:X}",
                            device.id(),
                            value,
                            read_back
                        ),
                        device.id(),
                        device.fru(),
                    ),
                ));
            }
        }

        env.set_volts(volts);
        Ok(true)
    }
}

impl fmt::Display for PmbusWriteVoutCommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("pmbus_write_vout_command: {")?;
        if let Some(volts) = self.volts {
            write!(f, " volts: {},", volts)?;
        }
        write!(f, " format: {}", self.format)?;
        if let Some(exponent) = self.exponent {
            write!(f, ", exponent: {}", exponent)?;
        }
        write!(f, ", is_verified: {} }}", self.is_verified)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::error_history::ErrorType;
    use crate::exception_utils::get_messages;
    use crate::i2c::I2cInterface;
    use crate::id_map::IdMap;
    use crate::services::Sensors;
    use crate::test_utils::{device, MockServices};

    const IFACE: I2cInterface = I2cInterface { bus: 1, address: 0x70 };

    fn write_vout(volts: Option<f64>, exponent: Option<i8>, verified: bool) -> PmbusWriteVoutCommandAction {
        PmbusWriteVoutCommandAction::new(volts, VoutDataFormat::Linear, exponent, verified).unwrap()
    }

    #[test]
    fn test_write_vout_with_exponent() {
        let dev = device("vdd_reg", 1, 0x70);
        let mut map = IdMap::new();
        map.add_device(&dev);
        let services = MockServices::new();
        let mut env = ActionEnvironment::new(&map, "vdd_reg", &services);

        assert!(write_vout(Some(1.03), Some(-8), false).execute(&mut env).unwrap());
        assert_eq!(services.i2c.register(IFACE, VOUT_COMMAND), Some(264u16.to_le_bytes().to_vec()));
        assert_eq!(env.volts(), Some(1.03));
    }

    #[test]
    fn test_write_vout_volts_from_environment_and_exponent_from_vout_mode() {
        let dev = device("vdd_reg", 1, 0x70);
        let mut map = IdMap::new();
        map.add_device(&dev);
        let services = MockServices::new();
        services.i2c.set_byte(IFACE, VOUT_MODE, 0b0001_1000); // linear, exponent -8
        let mut env = ActionEnvironment::new(&map, "vdd_reg", &services);
        env.set_volts(2.0625);

        assert!(write_vout(None, None, true).execute(&mut env).unwrap());
        assert_eq!(services.i2c.register(IFACE, VOUT_COMMAND), Some(vec![0x10, 0x02]));
    }

    #[test]
    fn test_write_vout_without_volts_fails() {
        let dev = device("vdd_reg", 1, 0x70);
        let mut map = IdMap::new();
        map.add_device(&dev);
        let services = MockServices::new();
        let mut env = ActionEnvironment::new(&map, "vdd_reg", &services);

        let err = write_vout(None, Some(-8), false).execute(&mut env).unwrap_err();
        assert_eq!(
            get_messages(&err),
            vec![
                "No volts value defined",
                "ActionError: pmbus_write_vout_command: { format: linear, exponent: -8, is_verified: false }",
            ]
        );
        assert!(services.i2c.writes().is_empty());
    }

    #[test]
    fn test_write_vout_non_linear_mode() {
        let dev = device("vdd_reg", 1, 0x70);
        let mut map = IdMap::new();
        map.add_device(&dev);
        let services = MockServices::new();
        services.i2c.set_byte(IFACE, VOUT_MODE, 0b0010_0000); // vid
        let mut env = ActionEnvironment::new(&map, "vdd_reg", &services);

        let err = write_vout(Some(1.2), None, false).execute(&mut env).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Pmbus);
        assert_eq!(
            get_messages(&err)[0],
            "PMBusError: Unable to write VOUT_COMMAND: Device does not use linear format"
        );
    }

    #[test]
    fn test_write_vout_verification_mismatch() {
        let dev = device("vdd_reg", 1, 0x70);
        let mut map = IdMap::new();
        map.add_device(&dev);
        let services = MockServices::new();
        let mut env = ActionEnvironment::new(&map, "vdd_reg", &services);

        assert!(write_vout(Some(1.0), Some(-8), true).execute(&mut env).unwrap());

        // Register ignores writes and keeps 0x0100
        services.i2c.freeze_register(IFACE, VOUT_COMMAND);
        let err = write_vout(Some(1.3), Some(-8), true).execute(&mut env).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::WriteVerification);
        assert_eq!(
            get_messages(&err),
            vec![
                "WriteVerificationError: device: vdd_reg, register: VOUT_COMMAND, value_written: 0x14D, value_read: 0x100",
                "ActionError: pmbus_write_vout_command: { volts: 1.3, format: linear, exponent: -8, is_verified: true }",
            ]
        );
        assert_eq!(env.volts(), Some(1.0));
    }

    #[test]
    fn test_read_sensor_linear_11() {
        let dev = device("vdd_reg", 1, 0x70);
        let mut map = IdMap::new();
        map.add_device(&dev);
        let services = MockServices::new();
        services.i2c.set_word(IFACE, 0x8C, 0b1111_0000_0011_0010);
        let mut env = ActionEnvironment::new(&map, "vdd_reg", &services);

        services.sensors.start_rail("vdd", dev.fru());
        let action = PmbusReadSensorAction::new(SensorType::Iout, 0x8C, SensorDataFormat::Linear11, None);
        assert!(action.execute(&mut env).unwrap());

        let readings = services.sensors.readings();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].sensor_type, SensorType::Iout);
        assert_eq!(readings[0].value, 12.5);
        assert_eq!(
            action.to_string(),
            "pmbus_read_sensor: { type: iout, command: 0x8C, format: linear_11 }"
        );
    }

    #[test]
    fn test_read_sensor_linear_16_uses_vout_mode() {
        let dev = device("vdd_reg", 1, 0x70);
        let mut map = IdMap::new();
        map.add_device(&dev);
        let services = MockServices::new();
        services.i2c.set_word(IFACE, 0x8B, 0x0210);
        services.i2c.set_byte(IFACE, VOUT_MODE, 0b0001_1000);
        let mut env = ActionEnvironment::new(&map, "vdd_reg", &services);

        services.sensors.start_rail("vdd", dev.fru());
        PmbusReadSensorAction::new(SensorType::Vout, 0x8B, SensorDataFormat::Linear16, None)
            .execute(&mut env)
            .unwrap();
        assert_eq!(services.sensors.readings()[0].value, 2.0625);
    }

    #[test]
    fn test_read_sensor_i2c_error() {
        let dev = device("vdd_reg", 1, 0x70);
        let mut map = IdMap::new();
        map.add_device(&dev);
        let services = MockServices::new();
        let mut env = ActionEnvironment::new(&map, "vdd_reg", &services);

        let action = PmbusReadSensorAction::new(SensorType::Vout, 0x8B, SensorDataFormat::Linear16, Some(-8));
        let err = action.execute(&mut env).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::I2c);
        assert_eq!(
            err.to_string(),
            "ActionError: pmbus_read_sensor: { type: vout, command: 0x8B, format: linear_16, exponent: -8 }"
        );
    }
}
