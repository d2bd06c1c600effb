//! Reads and publishes the sensors of a rail

use parking_lot::Mutex;

use crate::action_environment::ExecutionContext;
use crate::actions::{execute_actions, Action};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::error_history::ErrorHistory;
use crate::rail::Rail;

#[derive(Debug)]
pub struct SensorMonitoring {
    actions: Vec<Action>,
    error_history: Mutex<ErrorHistory>,
}

impl SensorMonitoring {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions,
            error_history: Mutex::new(ErrorHistory::new()),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Run the actions between `start_rail` and `end_rail` of the sensors
    /// service.
    pub fn execute(&self, ctx: &ExecutionContext<'_>, device: &Device, rail: &Rail) -> Result<()> {
        let sensors = ctx.services.sensors();
        sensors.start_rail(rail.id(), device.fru());

        let mut env = ctx.environment(device.id());
        let result = execute_actions(&self.actions, &mut env).map(|_| ());

        sensors.end_rail(result.is_err());
        result
    }

    /// Record `error`; returns false if its type was already reported.
    pub fn record_error(&self, error: &Error) -> bool {
        let mut history = self.error_history.lock();
        let error_type = error.error_type();
        if history.was_logged(error_type) {
            return false;
        }
        history.set_was_logged(error_type, true);
        true
    }

    pub fn clear_error_history(&self) {
        self.error_history.lock().clear();
    }
}

impl PartialEq for SensorMonitoring {
    fn eq(&self, other: &Self) -> bool {
        self.actions == other.actions
    }
}
