//! # Swarm Events
//!
//! Wire frames exchanged with the ideation backend.
//!
//! Inbound frames are JSON objects tagged by `type`:
//!
//! ```text
//! {"type": "status",       "payload": "Starting ideation pipeline..."}
//! {"type": "agent_update", "payload": {"agent_name": "researcher", "message": "..."}}
//! {"type": "final_result", "payload": {"ideas": [...]}}
//! {"type": "error",        "payload": "LLM quota exceeded"}
//! ```
//!
//! Outbound frames carry the bare request body, plus `request_id` when
//! correlation is enabled.

use crate::models::{AgentId, FinalResult, IdeationRequest, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Progress report for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentUpdate {
    pub agent_name: AgentId,
    #[serde(default)]
    pub message: String,
}

/// A decoded server message
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Informational, logged only
    Status(String),
    /// Agent started or reported progress
    AgentUpdate(AgentUpdate),
    /// Terminal success
    FinalResult(FinalResult),
    /// Terminal failure reported by the backend
    Error(String),
}

impl ServerMessage {
    /// Wire tag of this message
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Status(_) => "status",
            ServerMessage::AgentUpdate(_) => "agent_update",
            ServerMessage::FinalResult(_) => "final_result",
            ServerMessage::Error(_) => "error",
        }
    }

    /// Whether this message ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerMessage::FinalResult(_) | ServerMessage::Error(_))
    }
}

/// A server message together with the request it answers, if the backend said
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub request_id: Option<RequestId>,
    pub message: ServerMessage,
}

impl From<ServerMessage> for InboundFrame {
    fn from(message: ServerMessage) -> Self {
        Self {
            request_id: None,
            message,
        }
    }
}

/// Why an inbound frame was dropped
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("unknown frame type '{0}'")]
    UnknownType(String),
    #[error("'{0}' frame has no payload")]
    MissingPayload(&'static str),
    #[error("'{kind}' payload is malformed: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<Value>,
    /// The backend's status frames use `message` instead of `payload`
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    request_id: Option<RequestId>,
}

/// Decode one inbound text frame
pub fn parse_frame(text: &str) -> Result<InboundFrame, FrameError> {
    let raw: RawFrame = serde_json::from_str(text).map_err(FrameError::Json)?;

    let message = match raw.kind.as_str() {
        "status" => {
            let payload = raw
                .payload
                .or(raw.message)
                .ok_or(FrameError::MissingPayload("status"))?;
            ServerMessage::Status(text_payload(payload))
        }
        "agent_update" => {
            let payload = raw.payload.ok_or(FrameError::MissingPayload("agent_update"))?;
            let update = serde_json::from_value(payload).map_err(|source| {
                FrameError::InvalidPayload {
                    kind: "agent_update",
                    source,
                }
            })?;
            ServerMessage::AgentUpdate(update)
        }
        "final_result" => {
            let payload = raw.payload.ok_or(FrameError::MissingPayload("final_result"))?;
            let result = serde_json::from_value(payload).map_err(|source| {
                FrameError::InvalidPayload {
                    kind: "final_result",
                    source,
                }
            })?;
            ServerMessage::FinalResult(result)
        }
        "error" => {
            let payload = raw
                .payload
                .or(raw.message)
                .ok_or(FrameError::MissingPayload("error"))?;
            ServerMessage::Error(text_payload(payload))
        }
        other => return Err(FrameError::UnknownType(other.to_string())),
    };

    Ok(InboundFrame {
        request_id: raw.request_id,
        message,
    })
}

fn text_payload(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Serialize)]
struct ClientFrame<'a> {
    #[serde(flatten)]
    request: &'a IdeationRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a RequestId>,
}

/// Encode an outbound request frame
pub fn encode_request(
    request: &IdeationRequest,
    request_id: Option<&RequestId>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ClientFrame {
        request,
        request_id,
    })
}
