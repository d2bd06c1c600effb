//! Phase fault types

use std::fmt;

use serde::Serialize;

/// Kind of phase fault detected in a regulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PhaseFaultType {
    /// Regulator lost redundancy; N phases remain
    #[serde(rename = "n")]
    N,
    /// Regulator has N+1 phases working
    #[serde(rename = "n+1")]
    NPlus1,
}

impl PhaseFaultType {
    pub const ALL: [PhaseFaultType; 2] = [PhaseFaultType::N, PhaseFaultType::NPlus1];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "n" => Some(PhaseFaultType::N),
            "n+1" => Some(PhaseFaultType::NPlus1),
            _ => None,
        }
    }
}

impl fmt::Display for PhaseFaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PhaseFaultType::N => "n",
            PhaseFaultType::NPlus1 => "n+1",
        })
    }
}
