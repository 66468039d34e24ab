use serde::{Deserialize, Serialize};

use crate::{
    domain::{AgentStatus, Artifact, LogEntry},
    error::ErrorPayload,
};

/// The single command a client sends, immediately after the socket opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSprint {
    pub goal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentUpdatePayload {
    pub agent_id: String,
    #[serde(default)]
    pub name: String,
    pub status: AgentStatus,
    #[serde(default)]
    pub thought: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

/// Frames pushed by the coordinator. Serialized as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    AgentUpdate(AgentUpdatePayload),
    Artifact(Artifact),
    Log(LogEntry),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

impl ServerFrame {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentUpdate(_) => "agent_update",
            Self::Artifact(_) => "artifact",
            Self::Log(_) => "log",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
