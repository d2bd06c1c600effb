//! Tracks which error classes were already reported for a component

use serde::Serialize;

/// Error classes tracked by [`ErrorHistory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    ConfigFile = 0,
    DBus = 1,
    I2c = 2,
    Internal = 3,
    Pmbus = 4,
    WriteVerification = 5,
}

impl ErrorType {
    pub const COUNT: usize = 6;

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Bit set of error types that have been logged
///
/// Used to log a recurring error once instead of on every monitoring cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorHistory {
    history: u8,
}

impl ErrorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every error type as not logged
    pub fn clear(&mut self) {
        self.history = 0;
    }

    pub fn set_was_logged(&mut self, error_type: ErrorType, was_logged: bool) {
        if was_logged {
            self.history |= error_type.bit();
        } else {
            self.history &= !error_type.bit();
        }
    }

    pub fn was_logged(&self, error_type: ErrorType) -> bool {
        self.history & error_type.bit() != 0
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    const ALL: [ErrorType; ErrorType::COUNT] = [
        ErrorType::ConfigFile,
        ErrorType::DBus,
        ErrorType::I2c,
        ErrorType::Internal,
        ErrorType::Pmbus,
        ErrorType::WriteVerification,
    ];

    #[test]
    fn test_new_history_is_empty() {
        let history = ErrorHistory::new();
        assert!(ALL.iter().all(|t| !history.was_logged(*t)));
    }

    #[test]
    fn test_set_and_clear() {
        let mut history = ErrorHistory::new();
        history.set_was_logged(ErrorType::I2c, true);
        history.set_was_logged(ErrorType::Pmbus, true);
        assert!(history.was_logged(ErrorType::I2c));
        assert!(history.was_logged(ErrorType::Pmbus));
        assert!(!history.was_logged(ErrorType::DBus));

        history.set_was_logged(ErrorType::I2c, false);
        assert!(!history.was_logged(ErrorType::I2c));
        assert!(history.was_logged(ErrorType::Pmbus));

        history.clear();
        assert!(ALL.iter().all(|t| !history.was_logged(*t)));
    }
}
