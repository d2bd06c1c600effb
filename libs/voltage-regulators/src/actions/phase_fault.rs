//! log_phase_fault

use std::fmt;

use crate::action_environment::ActionEnvironment;
use crate::error::Result;
use crate::phase_fault::PhaseFaultType;

/// Records a detected phase fault in the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPhaseFaultAction {
    fault_type: PhaseFaultType,
}

impl LogPhaseFaultAction {
    pub fn new(fault_type: PhaseFaultType) -> Self {
        Self { fault_type }
    }

    pub fn fault_type(&self) -> PhaseFaultType {
        self.fault_type
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        env.add_phase_fault(self.fault_type);
        Ok(true)
    }
}

impl fmt::Display for LogPhaseFaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "log_phase_fault: {{ type: {} }}", self.fault_type)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::id_map::IdMap;
    use crate::test_utils::MockServices;

    #[test]
    fn test_log_phase_fault() {
        let map = IdMap::new();
        let services = MockServices::new();
        let mut env = ActionEnvironment::new(&map, "reg1", &services);

        let action = LogPhaseFaultAction::new(PhaseFaultType::NPlus1);
        assert!(action.execute(&mut env).unwrap());
        assert!(action.execute(&mut env).unwrap());
        assert_eq!(env.phase_faults().len(), 1);
        assert!(env.phase_faults().contains(&PhaseFaultType::NPlus1));
        assert_eq!(action.to_string(), "log_phase_fault: { type: n+1 }");
    }
}
