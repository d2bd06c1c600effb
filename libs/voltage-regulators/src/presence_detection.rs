//! Determines whether a device is present
//!
//! The result is cached until [`PresenceDetection::clear_cache`], since
//! presence only changes when hardware is added or removed.

use parking_lot::Mutex;
use tracing::warn;

use crate::action_environment::ExecutionContext;
use crate::actions::{execute_actions, Action};
use crate::device::Device;
use crate::exception_utils::get_messages;

#[derive(Debug)]
pub struct PresenceDetection {
    actions: Vec<Action>,
    is_present: Mutex<Option<bool>>,
}

impl PresenceDetection {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions,
            is_present: Mutex::new(None),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn cached_presence(&self) -> Option<bool> {
        *self.is_present.lock()
    }

    pub fn clear_cache(&self) {
        *self.is_present.lock() = None;
    }

    /// Presence of `device`. If the actions fail the device is assumed present.
    pub fn execute(&self, ctx: &ExecutionContext<'_>, device: &Device) -> bool {
        if let Some(present) = self.cached_presence() {
            return present;
        }

        let mut env = ctx.environment(device.id());
        let present = match execute_actions(&self.actions, &mut env) {
            Ok(present) => present,
            Err(e) => {
                let mut messages = get_messages(&e);
                messages.push(format!("Unable to determine presence of {}", device.id()));
                warn!("Presence detection failed for {}: {}", device.id(), e);
                ctx.services.journal().log_error(&messages);
                true
            },
        };

        *self.is_present.lock() = Some(present);
        present
    }
}

impl PartialEq for PresenceDetection {
    fn eq(&self, other: &Self) -> bool {
        self.actions == other.actions
    }
}
