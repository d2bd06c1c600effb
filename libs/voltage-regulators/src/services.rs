//! Collaborator Interfaces
//!
//! The engine never touches hardware, D-Bus or the journal directly. Everything
//! external is reached through the [`Services`] facade handed to each
//! [`crate::ActionEnvironment`].

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::i2c::I2cTransport;

/// System journal
pub trait Journal: Send + Sync {
    /// Log an error made of several messages, e.g. a flattened cause chain
    fn log_error(&self, messages: &[String]);

    fn log_info(&self, message: &str);

    fn log_debug(&self, message: &str);
}

/// Vital product data lookup
pub trait Vpd: Send + Sync {
    /// Value of `keyword` for the FRU at `inventory_path`
    fn get_value(&self, inventory_path: &str, keyword: &str) -> anyhow::Result<String>;

    /// Drop cached values; called when hardware may have changed
    fn clear_cache(&self) {}
}

/// Hardware presence lookup
pub trait PresenceService: Send + Sync {
    fn is_present(&self, inventory_path: &str) -> anyhow::Result<bool>;
}

/// Kind of sensor published for a rail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Iout,
    IoutPeak,
    IoutValley,
    Pout,
    Temperature,
    TemperaturePeak,
    Vout,
    VoutPeak,
    VoutValley,
}

impl SensorType {
    pub const ALL: [SensorType; 9] = [
        SensorType::Iout,
        SensorType::IoutPeak,
        SensorType::IoutValley,
        SensorType::Pout,
        SensorType::Temperature,
        SensorType::TemperaturePeak,
        SensorType::Vout,
        SensorType::VoutPeak,
        SensorType::VoutValley,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Iout => "iout",
            SensorType::IoutPeak => "iout_peak",
            SensorType::IoutValley => "iout_valley",
            SensorType::Pout => "pout",
            SensorType::Temperature => "temperature",
            SensorType::TemperaturePeak => "temperature_peak",
            SensorType::Vout => "vout",
            SensorType::VoutPeak => "vout_peak",
            SensorType::VoutValley => "vout_valley",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor publication for voltage rails
///
/// Values are published between `start_rail` and `end_rail` for one rail.
pub trait Sensors: Send + Sync {
    fn start_rail(&self, rail_id: &str, device_inventory_path: &str);

    fn set_value(&self, sensor_type: SensorType, value: f64) -> anyhow::Result<()>;

    /// Finish the current rail; `error_occurred` marks its sensors faulted
    fn end_rail(&self, error_occurred: bool);
}

/// Facade bundling every collaborator the engine uses
pub trait Services: Send + Sync {
    fn journal(&self) -> &dyn Journal;

    fn vpd(&self) -> &dyn Vpd;

    fn presence_service(&self) -> &dyn PresenceService;

    fn sensors(&self) -> &dyn Sensors;

    fn i2c(&self) -> &dyn I2cTransport;
}

// ============================================================================
// Provided implementations
// ============================================================================

/// Journal that forwards entries to `tracing` under the `journal` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingJournal;

impl Journal for TracingJournal {
    fn log_error(&self, messages: &[String]) {
        for message in messages {
            error!(target: "journal", "{}", message);
        }
    }

    fn log_info(&self, message: &str) {
        info!(target: "journal", "{}", message);
    }

    fn log_debug(&self, message: &str) {
        debug!(target: "journal", "{}", message);
    }
}

/// VPD lookup that caches values per FRU and keyword
///
/// VPD does not change while the system is powered on, so each keyword is read
/// from the wrapped lookup at most once until [`Vpd::clear_cache`].
pub struct CachedVpd<V> {
    inner: V,
    cache: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl<V: Vpd> CachedVpd<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }
}

impl<V: Vpd> Vpd for CachedVpd<V> {
    fn get_value(&self, inventory_path: &str, keyword: &str) -> anyhow::Result<String> {
        if let Some(value) = self
            .cache
            .lock()
            .get(inventory_path)
            .and_then(|keywords| keywords.get(keyword))
        {
            return Ok(value.clone());
        }

        // Not cached; lookup errors are not cached either
        let value = self.inner.get_value(inventory_path, keyword)?;
        self.cache
            .lock()
            .entry(inventory_path.to_string())
            .or_default()
            .insert(keyword.to_string(), value.clone());
        Ok(value)
    }

    fn clear_cache(&self) {
        self.cache.lock().clear();
        self.inner.clear_cache();
    }
}
