//! Detects redundant phase faults in a voltage regulator
//!
//! The actions report faults through `log_phase_fault`. A fault type must be
//! seen on [`REQUIRED_CONSECUTIVE_DETECTIONS`] consecutive runs before it is
//! reported, and is then reported once until the error history is cleared.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::Mutex;
use tracing::warn;

use crate::action_environment::ExecutionContext;
use crate::actions::{execute_actions, Action};
use crate::device::Device;
use crate::error_history::ErrorHistory;
use crate::phase_fault::PhaseFaultType;
use crate::report::{Fault, FaultKind, Operation};

/// Consecutive detections needed before a phase fault is reported
pub const REQUIRED_CONSECUTIVE_DETECTIONS: u32 = 2;

#[derive(Debug, Default)]
struct DetectionState {
    counts: BTreeMap<PhaseFaultType, u32>,
    reported: BTreeSet<PhaseFaultType>,
    error_history: ErrorHistory,
}

#[derive(Debug)]
pub struct PhaseFaultDetection {
    device_id: Option<String>,
    actions: Vec<Action>,
    state: Mutex<DetectionState>,
}

impl PhaseFaultDetection {
    pub fn new(device_id: Option<String>, actions: Vec<Action>) -> Self {
        Self {
            device_id,
            actions,
            state: Mutex::new(DetectionState::default()),
        }
    }

    /// Device the actions initially target, if not the regulator itself
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn clear_error_history(&self) {
        *self.state.lock() = DetectionState::default();
    }

    /// Run detection once for `regulator`; returns newly confirmed faults
    pub fn execute(&self, ctx: &ExecutionContext<'_>, regulator: &Device, chassis: u32) -> Vec<Fault> {
        let target = self.device_id.as_deref().unwrap_or(regulator.id());
        let mut env = ctx.environment(target);
        let result = execute_actions(&self.actions, &mut env);

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut faults = Vec::new();
        match result {
            Ok(_) => {
                for fault_type in PhaseFaultType::ALL {
                    if !env.phase_faults().contains(&fault_type) {
                        state.counts.remove(&fault_type);
                        continue;
                    }
                    let count = state.counts.entry(fault_type).or_insert(0);
                    *count = count.saturating_add(1);
                    if *count >= REQUIRED_CONSECUTIVE_DETECTIONS && state.reported.insert(fault_type) {
                        faults.push(Fault {
                            chassis,
                            device_id: regulator.id().to_string(),
                            rail_id: None,
                            operation: Operation::DetectPhaseFaults,
                            kind: FaultKind::PhaseFault {
                                fault_type,
                                additional_data: env.additional_error_data().clone(),
                            },
                        });
                    }
                }
            },
            Err(e) => {
                let error_type = e.error_type();
                if !state.error_history.was_logged(error_type) {
                    state.error_history.set_was_logged(error_type, true);
                    warn!("Phase fault detection failed for {}: {}", regulator.id(), e);
                    faults.push(Fault::from_error(
                        chassis,
                        regulator.id(),
                        None,
                        Operation::DetectPhaseFaults,
                        &e,
                    ));
                }
            },
        }

        for fault in &faults {
            ctx.services.journal().log_error(&fault.messages());
        }
        faults
    }
}

impl PartialEq for PhaseFaultDetection {
    fn eq(&self, other: &Self) -> bool {
        self.device_id == other.device_id && self.actions == other.actions
    }
}
