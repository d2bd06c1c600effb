//! Inventory comparisons: compare_presence, compare_vpd

use std::fmt;

use crate::action_environment::ActionEnvironment;
use crate::error::{Error, Result};

/// Compares hardware presence of a FRU to an expected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparePresenceAction {
    fru: String,
    value: bool,
}

impl ComparePresenceAction {
    pub fn new(fru: impl Into<String>, value: bool) -> Self {
        Self {
            fru: fru.into(),
            value,
        }
    }

    pub fn fru(&self) -> &str {
        &self.fru
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let present = env
            .services()
            .presence_service()
            .is_present(&self.fru)
            .map_err(|e| Error::action(self, e))?;
        Ok(present == self.value)
    }
}

impl fmt::Display for ComparePresenceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compare_presence: {{ fru: {}, value: {} }}",
            self.fru, self.value
        )
    }
}

/// Compares a VPD keyword of a FRU to an expected value (case-sensitive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareVpdAction {
    fru: String,
    keyword: String,
    value: String,
}

impl CompareVpdAction {
    pub fn new(fru: impl Into<String>, keyword: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            fru: fru.into(),
            keyword: keyword.into(),
            value: value.into(),
        }
    }

    pub fn fru(&self) -> &str {
        &self.fru
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        let actual = env
            .services()
            .vpd()
            .get_value(&self.fru, &self.keyword)
            .map_err(|e| Error::action(self, e))?;
        Ok(actual == self.value)
    }
}

impl fmt::Display for CompareVpdAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compare_vpd: {{ fru: {}, keyword: {}, value: {} }}",
            self.fru, self.keyword, self.value
        )
    }
}
