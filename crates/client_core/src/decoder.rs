//! Narrows raw coordinator frames into [`SessionEvent`]s.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::{
    domain::{Artifact, LogEntry},
    error::ErrorPayload,
    protocol::{AgentUpdatePayload, CompletePayload},
};

use crate::error::DecodeError;

/// The closed set of events the reducer understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    AgentUpdate(AgentUpdatePayload),
    Artifact(Artifact),
    Log(LogEntry),
    Complete,
    Error { message: String },
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentUpdate(_) => "agent_update",
            Self::Artifact(_) => "artifact",
            Self::Log(_) => "log",
            Self::Complete => "complete",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error { .. })
    }
}

pub fn decode(raw: &str) -> Result<SessionEvent, DecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| DecodeError::Malformed(err.to_string()))?;
    let Value::Object(frame) = value else {
        return Err(DecodeError::Malformed(
            "frame is not a JSON object".to_string(),
        ));
    };

    // An explicit error indicator outranks whatever the discriminant says.
    if let Some(error) = frame.get("error").filter(|error| !error.is_null()) {
        return Ok(SessionEvent::Error {
            message: error_message(error),
        });
    }

    let kind = match frame.get("type") {
        Some(Value::String(kind)) => kind.as_str(),
        Some(_) => {
            return Err(DecodeError::Malformed(
                "`type` discriminant is not a string".to_string(),
            ))
        }
        None => {
            return Err(DecodeError::Malformed(
                "missing `type` discriminant".to_string(),
            ))
        }
    };

    match kind {
        "agent_update" => payload(&frame, kind).map(SessionEvent::AgentUpdate),
        "artifact" => payload(&frame, kind).map(SessionEvent::Artifact),
        "log" => payload(&frame, kind).map(SessionEvent::Log),
        "complete" => {
            // Only the shape is checked; `success` carries nothing the client tracks.
            match frame.get("data") {
                None | Some(Value::Null) => {}
                Some(_) => {
                    payload::<CompletePayload>(&frame, kind)?;
                }
            }
            Ok(SessionEvent::Complete)
        }
        "error" => {
            let message = match frame.get("data") {
                Some(Value::String(message)) => message.clone(),
                _ => payload::<ErrorPayload>(&frame, kind)?.message,
            };
            Ok(SessionEvent::Error { message })
        }
        other => Err(DecodeError::UnknownEventType(other.to_string())),
    }
}

fn payload<T: DeserializeOwned>(frame: &Map<String, Value>, kind: &str) -> Result<T, DecodeError> {
    let data = frame
        .get("data")
        .cloned()
        .ok_or_else(|| DecodeError::Malformed(format!("`{kind}` frame has no data")))?;
    serde_json::from_value(data)
        .map_err(|err| DecodeError::Malformed(format!("invalid `{kind}` payload: {err}")))
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => error.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/decoder_tests.rs"]
mod tests;
