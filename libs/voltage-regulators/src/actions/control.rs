//! Control-flow actions: and, or, not, if, run_rule, set_device

use std::fmt;

use tracing::debug;

use super::{execute_actions, Action};
use crate::action_environment::ActionEnvironment;
use crate::error::Result;

/// Executes actions until one returns false
#[derive(Debug, Clone, PartialEq)]
pub struct AndAction {
    actions: Vec<Action>,
}

impl AndAction {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        for action in &self.actions {
            if !action.execute(env)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Display for AndAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("and: [ ... ]")
    }
}

/// Executes actions until one returns true
#[derive(Debug, Clone, PartialEq)]
pub struct OrAction {
    actions: Vec<Action>,
}

impl OrAction {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        for action in &self.actions {
            if action.execute(env)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl fmt::Display for OrAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("or: [ ... ]")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotAction {
    action: Box<Action>,
}

impl NotAction {
    pub fn new(action: Action) -> Self {
        Self {
            action: Box::new(action),
        }
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        Ok(!self.action.execute(env)?)
    }
}

impl fmt::Display for NotAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("not: { ... }")
    }
}

/// Runs `then_actions` or `else_actions` depending on `condition`
///
/// Returns the result of the branch that ran, or false when the condition is
/// false and there is no else branch.
#[derive(Debug, Clone, PartialEq)]
pub struct IfAction {
    condition: Box<Action>,
    then_actions: Vec<Action>,
    else_actions: Vec<Action>,
}

impl IfAction {
    pub fn new(condition: Action, then_actions: Vec<Action>, else_actions: Vec<Action>) -> Self {
        Self {
            condition: Box::new(condition),
            then_actions,
            else_actions,
        }
    }

    pub fn condition(&self) -> &Action {
        &self.condition
    }

    pub fn then_actions(&self) -> &[Action] {
        &self.then_actions
    }

    pub fn else_actions(&self) -> &[Action] {
        &self.else_actions
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        if self.condition.execute(env)? {
            execute_actions(&self.then_actions, env)
        } else if !self.else_actions.is_empty() {
            execute_actions(&self.else_actions, env)
        } else {
            Ok(false)
        }
    }
}

impl fmt::Display for IfAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("if: { condition: { ... }, then: [ ... ]")?;
        if !self.else_actions.is_empty() {
            f.write_str(", else: [ ... ]")?;
        }
        f.write_str(" }")
    }
}

/// Runs the actions of another rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRuleAction {
    rule_id: String,
}

impl RunRuleAction {
    pub fn new(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
        }
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        env.increment_rule_depth(&self.rule_id)?;
        debug!("Entering rule {} at depth {}", self.rule_id, env.rule_depth());

        // Depth must be restored whether or not the rule succeeds
        let result = match env.rule(&self.rule_id) {
            Ok(rule) => rule.execute(env),
            Err(e) => Err(e),
        };
        env.decrement_rule_depth();
        result
    }
}

impl fmt::Display for RunRuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run_rule: {}", self.rule_id)
    }
}

/// Points subsequent actions at another device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDeviceAction {
    device_id: String,
}

impl SetDeviceAction {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        env.set_device_id(self.device_id.clone());
        Ok(true)
    }
}

impl fmt::Display for SetDeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "set_device: {}", self.device_id)
    }
}
