//! Structured commands: the typed form of one oracle reply.
//!
//! The oracle is asked for a JSON object with three fields:
//!
//! ```json
//! {"response_text": "I have moved to (0, 8)", "action": "move", "parameters": {"x": 0, "y": 8}}
//! ```
//!
//! Decoding is lenient about everything except framing: the text must be a
//! JSON object, but missing fields default, unknown action tags become
//! [`Action::None`], and absent or non-numeric parameters become `None`.

use serde_json::{Map, Value};
use thiserror::Error;

/// What the drone should do after speaking.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Move the drone to `(x, y)`.
    Move { x: Option<f64>, y: Option<f64> },
    /// Update where the drone believes the user is.
    UpdateUserPosition {
        user_x: Option<f64>,
        user_y: Option<f64>,
    },
    /// Just talk.
    None,
}

impl Action {
    /// The wire tag for this action.
    pub fn tag(&self) -> &'static str {
        match self {
            Action::Move { .. } => "move",
            Action::UpdateUserPosition { .. } => "update_user_position",
            Action::None => "none",
        }
    }

    fn from_wire(tag: Option<&Value>, parameters: &Map<String, Value>) -> Self {
        let tag = match tag {
            Some(Value::String(s)) => s.trim().to_ascii_lowercase(),
            _ => return Action::None,
        };

        match tag.as_str() {
            "move" => Action::Move {
                x: number(parameters, "x"),
                y: number(parameters, "y"),
            },
            "update_user_position" => Action::UpdateUserPosition {
                user_x: number(parameters, "user_x"),
                user_y: number(parameters, "user_y"),
            },
            other => {
                if !other.is_empty() && other != "none" && other != "null" {
                    tracing::debug!(action = %other, "Unrecognized action tag, treating as none");
                }
                Action::None
            }
        }
    }
}

/// Read a parameter as a finite number. Numeric strings are accepted.
fn number(parameters: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match parameters.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// The normalized result of one input.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredCommand {
    /// What the drone says
    pub response_text: String,

    /// What the drone does
    pub action: Action,
}

impl StructuredCommand {
    /// A plain message with no action.
    pub fn say(text: impl Into<String>) -> Self {
        Self {
            response_text: text.into(),
            action: Action::None,
        }
    }

    /// The command used when the oracle's text cannot be repaired into JSON:
    /// speak the text as-is and do nothing.
    pub fn fallback(text: impl Into<String>) -> Self {
        Self::say(text)
    }

    /// Decode a cleaned oracle reply.
    pub fn from_json(text: &str) -> Result<Self, MalformedReply> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| MalformedReply::NotJson(e.to_string()))?;

        let Value::Object(object) = value else {
            return Err(MalformedReply::NotAnObject(json_kind(&value).into()));
        };

        let response_text = match object.get("response_text") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let empty = Map::new();
        let parameters = match object.get("parameters") {
            Some(Value::Object(map)) => map,
            _ => &empty,
        };

        Ok(Self {
            response_text,
            action: Action::from_wire(object.get("action"), parameters),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Why an oracle reply could not be read as a structured command.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MalformedReply {
    #[error("reply is not valid JSON: {0}")]
    NotJson(String),

    #[error("reply is JSON but not an object (got {0})")]
    NotAnObject(String),
}
