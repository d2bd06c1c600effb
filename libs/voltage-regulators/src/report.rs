//! Faults reported by system-level operations

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::error_history::ErrorType;
use crate::exception_utils::get_messages;
use crate::phase_fault::PhaseFaultType;

/// System-level operation that produced a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Configure,
    MonitorSensors,
    DetectPhaseFaults,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Configure => "configure",
            Operation::MonitorSensors => "monitor_sensors",
            Operation::DetectPhaseFaults => "detect_phase_faults",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaultKind {
    /// Operation failed; `messages` is the cause chain, innermost first
    Error {
        error_type: ErrorType,
        messages: Vec<String>,
    },
    /// Regulator phase fault confirmed by consecutive detections
    PhaseFault {
        fault_type: PhaseFaultType,
        additional_data: BTreeMap<String, String>,
    },
}

/// One faulted device or rail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fault {
    pub chassis: u32,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rail_id: Option<String>,
    pub operation: Operation,
    #[serde(flatten)]
    pub kind: FaultKind,
}

impl Fault {
    pub fn from_error(
        chassis: u32,
        device_id: &str,
        rail_id: Option<&str>,
        operation: Operation,
        error: &Error,
    ) -> Self {
        Self {
            chassis,
            device_id: device_id.to_string(),
            rail_id: rail_id.map(str::to_string),
            operation,
            kind: FaultKind::Error {
                error_type: error.error_type(),
                messages: get_messages(error),
            },
        }
    }

    /// Messages for the journal
    pub fn messages(&self) -> Vec<String> {
        match &self.kind {
            FaultKind::Error { messages, .. } => messages.clone(),
            FaultKind::PhaseFault { fault_type, .. } => vec![format!(
                "{} phase fault detected in regulator {}",
                fault_type, self.device_id
            )],
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chassis {} device {}", self.chassis, self.device_id)?;
        if let Some(rail_id) = &self.rail_id {
            write!(f, " rail {}", rail_id)?;
        }
        write!(f, " {}: ", self.operation)?;
        match &self.kind {
            FaultKind::Error { messages, .. } => {
                f.write_str(messages.last().map(String::as_str).unwrap_or_default())
            },
            FaultKind::PhaseFault { fault_type, .. } => write!(f, "{} phase fault", fault_type),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_fault_from_error() {
        let err = Error::action(&"run_rule: r1", Error::MaxRuleDepth("r1".into()));
        let fault = Fault::from_error(1, "vdd_reg", Some("vdd"), Operation::Configure, &err);

        assert_eq!(
            fault.messages(),
            vec!["Maximum rule depth exceeded by rule r1.", "ActionError: run_rule: r1"]
        );
        assert_eq!(
            fault.to_string(),
            "chassis 1 device vdd_reg rail vdd configure: ActionError: run_rule: r1"
        );

        let json = serde_json::to_value(&fault).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["error_type"], "internal");
        assert_eq!(json["rail_id"], "vdd");
    }

    #[test]
    fn test_phase_fault_messages() {
        let fault = Fault {
            chassis: 2,
            device_id: "vdd_reg".to_string(),
            rail_id: None,
            operation: Operation::DetectPhaseFaults,
            kind: FaultKind::PhaseFault {
                fault_type: PhaseFaultType::N,
                additional_data: BTreeMap::new(),
            },
        };
        assert_eq!(fault.messages(), vec!["n phase fault detected in regulator vdd_reg"]);
        assert_eq!(fault.to_string(), "chassis 2 device vdd_reg detect_phase_faults: n phase fault");

        let json = serde_json::to_value(&fault).unwrap();
        assert_eq!(json["fault_type"], "n");
        assert!(json.get("rail_id").is_none());
    }
}
