//! Named, reusable action sequence

use crate::action_environment::ActionEnvironment;
use crate::actions::{execute_actions, Action};
use crate::error::Result;

/// Rules are referenced by ID through `run_rule` and `rule_id` properties,
/// so they may be shared by many devices and refer to each other.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    id: String,
    actions: Vec<Action>,
}

impl Rule {
    pub fn new(id: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            id: id.into(),
            actions,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Execute the actions in order; returns the result of the last one
    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        execute_actions(&self.actions, env)
    }
}
