//! Parsed configuration and the system-level operations on it

use std::path::Path;

use tracing::{debug, info};

use crate::action_environment::{ExecutionContext, DEFAULT_MAX_RULE_DEPTH};
use crate::chassis::Chassis;
use crate::config_file_parser::{self, ConfigFileParserError};
use crate::id_map::IdMap;
use crate::report::Fault;
use crate::rule::Rule;
use crate::services::Services;

/// Rules and chassis of one configuration file
///
/// Read-only once built; operations may run from several threads as long as
/// the caller serializes access to the same physical device.
#[derive(Debug, PartialEq)]
pub struct System {
    rules: Vec<Rule>,
    chassis: Vec<Chassis>,
    max_rule_depth: usize,
}

impl System {
    pub fn new(rules: Vec<Rule>, chassis: Vec<Chassis>) -> Self {
        Self {
            rules,
            chassis,
            max_rule_depth: DEFAULT_MAX_RULE_DEPTH,
        }
    }

    /// Parse a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileParserError> {
        let (rules, chassis) = config_file_parser::parse(path)?;
        Ok(Self::new(rules, chassis))
    }

    pub fn with_max_rule_depth(mut self, max_rule_depth: usize) -> Self {
        self.max_rule_depth = max_rule_depth;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn chassis(&self) -> &[Chassis] {
        &self.chassis
    }

    pub fn max_rule_depth(&self) -> usize {
        self.max_rule_depth
    }

    pub fn id_map(&self) -> IdMap<'_> {
        IdMap::build(&self.rules, &self.chassis)
    }

    /// Configure every device; returns the faults of devices that failed
    pub fn configure(&self, services: &dyn Services) -> Vec<Fault> {
        info!("Configuring {} chassis", self.chassis.len());
        let faults = self.run(services, Chassis::configure);
        info!("Configuration finished with {} fault(s)", faults.len());
        faults
    }

    pub fn monitor_sensors(&self, services: &dyn Services) -> Vec<Fault> {
        debug!("Monitoring sensors");
        self.run(services, Chassis::monitor_sensors)
    }

    pub fn detect_phase_faults(&self, services: &dyn Services) -> Vec<Fault> {
        debug!("Detecting phase faults");
        self.run(services, Chassis::detect_phase_faults)
    }

    /// Forget cached hardware state, e.g. after a power cycle
    pub fn clear_cache(&self, services: &dyn Services) {
        self.chassis.iter().for_each(Chassis::clear_cache);
        services.vpd().clear_cache();
    }

    pub fn clear_error_history(&self) {
        self.chassis.iter().for_each(Chassis::clear_error_history);
    }

    fn run<F>(&self, services: &dyn Services, operation: F) -> Vec<Fault>
    where
        F: Fn(&Chassis, &ExecutionContext<'_>) -> Vec<Fault>,
    {
        let id_map = self.id_map();
        let mut ctx = ExecutionContext::new(&id_map, services);
        ctx.max_rule_depth = self.max_rule_depth;
        self.chassis
            .iter()
            .flat_map(|chassis| operation(chassis, &ctx))
            .collect()
    }
}
