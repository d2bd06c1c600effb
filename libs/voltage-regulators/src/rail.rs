//! Voltage rail produced by a regulator

use crate::configuration::Configuration;
use crate::sensor_monitoring::SensorMonitoring;

#[derive(Debug, PartialEq)]
pub struct Rail {
    id: String,
    configuration: Option<Configuration>,
    sensor_monitoring: Option<SensorMonitoring>,
}

impl Rail {
    pub fn new(
        id: impl Into<String>,
        configuration: Option<Configuration>,
        sensor_monitoring: Option<SensorMonitoring>,
    ) -> Self {
        Self {
            id: id.into(),
            configuration,
            sensor_monitoring,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    pub fn sensor_monitoring(&self) -> Option<&SensorMonitoring> {
        self.sensor_monitoring.as_ref()
    }
}
