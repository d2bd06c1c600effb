//! Configuration changes applied to a device or rail, e.g. setting the output
//! voltage

use crate::action_environment::ExecutionContext;
use crate::actions::{execute_actions, Action};
use crate::device::Device;
use crate::error::Result;
use crate::rail::Rail;

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    volts: Option<f64>,
    actions: Vec<Action>,
}

impl Configuration {
    pub fn new(volts: Option<f64>, actions: Vec<Action>) -> Self {
        Self { volts, actions }
    }

    pub fn volts(&self) -> Option<f64> {
        self.volts
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Run the actions against `device`; `volts`, if set, is visible to them
    /// through the environment.
    pub fn execute(&self, ctx: &ExecutionContext<'_>, device: &Device, rail: Option<&Rail>) -> Result<()> {
        let target = rail.map(Rail::id).unwrap_or(device.id());
        let message = match self.volts {
            Some(volts) => format!("Configuring {}: volts={}", target, volts),
            None => format!("Configuring {}", target),
        };
        ctx.services.journal().log_debug(&message);

        let mut env = ctx.environment(device.id());
        if let Some(volts) = self.volts {
            env.set_volts(volts);
        }
        execute_actions(&self.actions, &mut env)?;
        Ok(())
    }
}
