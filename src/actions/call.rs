//! The action-call wire format.
//!
//! The model requests an action by replying with exactly one JSON object and
//! nothing else:
//!
//! ```text
//! {"function": "get_showtimes", "parameters": {"title": "Inception", "location": "New York"}}
//! ```
//!
//! Parsing is whole-text-or-nothing. Prose around the object, partial JSON,
//! or JSON missing either key all mean "no action call", which is the normal
//! outcome for a plain answer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured request from the model to run a named action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    #[serde(rename = "function")]
    pub name: String,
    pub parameters: Value,
}

impl ActionCall {
    pub fn new(name: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// Serializes the call back into its single-line wire format.
    pub fn to_wire(&self) -> String {
        serde_json::json!({
            "function": self.name,
            "parameters": self.parameters,
        })
        .to_string()
    }
}

/// Returns the action call if `text` is exactly one wire-format object.
///
/// Leading and trailing whitespace is tolerated, as any JSON parser would.
/// A `function` value that is not a string is not a call. A `parameters`
/// value of the wrong shape is still a call; dispatch reports it as a
/// parameter mismatch.
pub fn parse_action_call(text: &str) -> Option<ActionCall> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;
    let name = object.get("function")?.as_str()?;
    let parameters = object.get("parameters")?;
    Some(ActionCall::new(name, parameters.clone()))
}
