mod action;
mod matcher;
mod template;

pub use action::{Action, ControlAction};
pub use matcher::{match_actions, TriggerMatch};
pub use template::{render, Bindings};
