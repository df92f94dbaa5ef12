use serde::{Deserialize, Serialize};

use crate::backend::error::{BridgeError, Result};

/// Control API operation bound to an action
///
/// String parameters may contain `{userinput}` / `{username}` placeholders and
/// are rendered right before the request is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlAction {
    /// Look up a map by key
    Query { map_key: String },
    /// Add a map to the request queue on behalf of a user
    AddKey {
        map_key: String,
        user: String,
        #[serde(default)]
        prepend: bool,
    },
    /// Report the queue length
    ShowQueue,
    /// Report how many songs a user has queued
    CheckQueueOf { user: String },
    /// Empty the queue
    ClearQueue,
    /// Open or close the queue
    SetQueueOpen { open: bool },
    /// Move an entry; positions are parsed after rendering
    MoveInQueue { from: String, to: String },
    /// Shuffle the queue
    ShuffleQueue,
    /// Report the last played map; limit is parsed after rendering
    History {
        #[serde(default = "default_history_limit")]
        limit: String,
    },
}

fn default_history_limit() -> String {
    "5".to_string()
}

impl ControlAction {
    /// Short operation name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ControlAction::Query { .. } => "Query",
            ControlAction::AddKey { .. } => "AddKey",
            ControlAction::ShowQueue => "ShowQueue",
            ControlAction::CheckQueueOf { .. } => "CheckQueueOf",
            ControlAction::ClearQueue => "ClearQueue",
            ControlAction::SetQueueOpen { .. } => "SetQueueOpen",
            ControlAction::MoveInQueue { .. } => "MoveInQueue",
            ControlAction::ShuffleQueue => "ShuffleQueue",
            ControlAction::History { .. } => "History",
        }
    }
}

/// A trigger with its chat responses and optional control API operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Literal prefix that activates the action
    pub trigger: String,
    /// Chat lines sent when the action matches, in order
    #[serde(default)]
    pub responses: Vec<String>,
    /// Whether the control API operation should run
    #[serde(default)]
    pub use_control_api: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_action: Option<ControlAction>,
}

impl Action {
    /// Create a plain chat-response action
    pub fn new(trigger: impl Into<String>, responses: Vec<String>) -> Self {
        Self {
            trigger: trigger.into(),
            responses,
            use_control_api: false,
            control_action: None,
        }
    }

    /// Builder method to attach a control API operation
    pub fn with_control_action(mut self, action: ControlAction) -> Self {
        self.use_control_api = true;
        self.control_action = Some(action);
        self
    }

    /// The control operation to run, if this action uses the control API
    pub fn control(&self) -> Option<&ControlAction> {
        if self.use_control_api {
            self.control_action.as_ref()
        } else {
            None
        }
    }

    /// Check the trigger/responses/control invariants
    pub fn validate(&self) -> Result<()> {
        if self.trigger.is_empty() {
            return Err(BridgeError::ConfigError(
                "action trigger must not be empty".to_string(),
            ));
        }

        if self.use_control_api {
            if self.control_action.is_none() {
                return Err(BridgeError::ConfigError(format!(
                    "action '{}' uses the control API but has no control action",
                    self.trigger
                )));
            }
        } else if self.responses.is_empty() {
            return Err(BridgeError::ConfigError(format!(
                "action '{}' needs at least one response",
                self.trigger
            )));
        }

        Ok(())
    }
}
