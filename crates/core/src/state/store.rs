//! # Ideation State
//!
//! All client-side state in one value, changed only through
//! [`IdeationState::apply`]. Connection events, server frames and
//! user-originated actions all flow through the same reducer, so there is a
//! single ordering of updates.
//!
//! Pipeline rules, applied in order for every action:
//!
//! 1. `agent_update` for A: A starts, any other running agent completes.
//! 2. `final_result`: running agents complete, active agent cleared.
//! 3. `error` (backend, socket, cancel, timeout): running agents error,
//!    active agent cleared.
//! 4. No active agent, no result, no error: every agent back to pending.

use crate::connection::{ConnectionEvent, ConnectionStatus};
use crate::error::NOT_CONNECTED_MESSAGE;
use crate::models::{AgentId, FinalResult, RequestId};
use crate::swarm::events::{InboundFrame, ServerMessage};
use crate::swarm::pipeline::PipelineState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const CONNECTION_FAILED_MESSAGE: &str = "WebSocket connection failed.";
pub const TIMED_OUT_MESSAGE: &str =
    "Connection timed out. The process is taking longer than expected.";
pub const CANCELLED_MESSAGE: &str = "Ideation was cancelled.";

/// Activity log entries kept in memory
pub const ACTIVITY_LIMIT: usize = 50;

/// Anything that can change client state
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Reported by the connection manager
    Connection(ConnectionEvent),
    /// A request frame was handed to the socket. `correlated` is set when
    /// the frame carried `request_id`; only then are mismatched frames stale.
    Submitted { request_id: RequestId, correlated: bool },
    /// Submit attempted while the socket was not open
    SubmitRejected,
    /// User cancelled the in-flight run
    Cancelled,
    /// No frame arrived within the run timeout
    TimedOut,
}

impl From<ConnectionEvent> for Action {
    fn from(event: ConnectionEvent) -> Self {
        Action::Connection(event)
    }
}

impl From<ServerMessage> for Action {
    fn from(message: ServerMessage) -> Self {
        Action::Connection(ConnectionEvent::Frame(message.into()))
    }
}

/// What the reducer did with an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    /// Frame tagged with a request other than the in-flight one
    Stale,
    /// Run frame arriving with no request in flight, or a cancel/timeout with nothing to stop
    Unsolicited,
}

/// One agent message from the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentActivity {
    pub agent: AgentId,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdeationState {
    connection: ConnectionStatus,
    pipeline: PipelineState,
    active_agent: Option<AgentId>,
    final_result: Option<FinalResult>,
    error: Option<String>,
    in_flight: Option<RequestId>,
    correlated: bool,
    activity: VecDeque<AgentActivity>,
}

impl Default for IdeationState {
    fn default() -> Self {
        Self {
            connection: ConnectionStatus::Connecting,
            pipeline: PipelineState::new(),
            active_agent: None,
            final_result: None,
            error: None,
            in_flight: None,
            correlated: false,
            activity: VecDeque::new(),
        }
    }
}

impl IdeationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Open
    }

    pub fn pipeline(&self) -> &PipelineState {
        &self.pipeline
    }

    pub fn active_agent(&self) -> Option<AgentId> {
        self.active_agent
    }

    pub fn final_result(&self) -> Option<&FinalResult> {
        self.final_result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn in_flight(&self) -> Option<&RequestId> {
        self.in_flight.as_ref()
    }

    /// A request was sent and has not reached a terminal state
    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Agent messages of the current run, oldest first
    pub fn activity(&self) -> impl Iterator<Item = &AgentActivity> {
        self.activity.iter()
    }

    pub fn apply(&mut self, action: Action) -> Disposition {
        let disposition = match action {
            Action::Connection(event) => self.on_connection(event),
            Action::Submitted {
                request_id,
                correlated,
            } => {
                self.active_agent = None;
                self.final_result = None;
                self.error = None;
                self.activity.clear();
                self.pipeline.reset();
                self.in_flight = Some(request_id);
                self.correlated = correlated;
                Disposition::Applied
            }
            Action::SubmitRejected => {
                self.final_result = None;
                self.error = Some(NOT_CONNECTED_MESSAGE.to_string());
                Disposition::Applied
            }
            Action::Cancelled => self.abort_run(CANCELLED_MESSAGE),
            Action::TimedOut => self.abort_run(TIMED_OUT_MESSAGE),
        };

        if self.active_agent.is_none() && self.final_result.is_none() && self.error.is_none() {
            self.pipeline.reset();
        }
        disposition
    }

    fn on_connection(&mut self, event: ConnectionEvent) -> Disposition {
        match event {
            ConnectionEvent::Connecting { .. } | ConnectionEvent::Reconnecting { .. } => {
                self.connection = ConnectionStatus::Connecting;
            }
            ConnectionEvent::Opened => {
                self.connection = ConnectionStatus::Open;
                if !self.is_running() && self.error.as_deref() == Some(CONNECTION_FAILED_MESSAGE) {
                    self.error = None;
                }
            }
            ConnectionEvent::Failed { error } => {
                tracing::warn!(error = %error, "Connection failed");
                if self.is_running() {
                    self.fail_run(CONNECTION_FAILED_MESSAGE.to_string());
                } else if self.final_result.is_none() {
                    self.error = Some(CONNECTION_FAILED_MESSAGE.to_string());
                }
            }
            ConnectionEvent::Closed { reason } => {
                self.connection = ConnectionStatus::Closed;
                if self.is_running() {
                    let reason = reason.unwrap_or_else(|| "connection closed".to_string());
                    self.fail_run(format!("Connection to server was lost: {}", reason));
                }
            }
            ConnectionEvent::Frame(frame) => return self.on_frame(frame),
        }
        Disposition::Applied
    }

    fn on_frame(&mut self, frame: InboundFrame) -> Disposition {
        if let Some(tagged) = frame.request_id.as_ref().filter(|_| self.correlated) {
            if self.in_flight.as_ref() != Some(tagged) {
                tracing::debug!(request_id = %tagged, "Ignoring frame for a superseded request");
                return Disposition::Stale;
            }
        }

        match frame.message {
            ServerMessage::Status(status) => {
                tracing::info!(status = %status, "Backend status");
                return Disposition::Applied;
            }
            ref message if self.in_flight.is_none() => {
                tracing::debug!(kind = message.kind(), "Ignoring frame with no request in flight");
                return Disposition::Unsolicited;
            }
            ServerMessage::AgentUpdate(update) => {
                tracing::info!(agent = %update.agent_name, "Agent update");
                self.active_agent = Some(update.agent_name);
                self.pipeline.start(update.agent_name);
                if self.activity.len() == ACTIVITY_LIMIT {
                    self.activity.pop_front();
                }
                self.activity.push_back(AgentActivity {
                    agent: update.agent_name,
                    message: update.message,
                    received_at: Utc::now(),
                });
            }
            ServerMessage::FinalResult(result) => {
                tracing::info!(ideas = result.ideas.len(), "Ideation completed");
                self.final_result = Some(result);
                self.error = None;
                self.active_agent = None;
                self.in_flight = None;
                self.pipeline.complete_running();
            }
            ServerMessage::Error(error) => {
                tracing::warn!(error = %error, "Backend reported an error");
                self.fail_run(error);
            }
        }
        Disposition::Applied
    }

    fn abort_run(&mut self, message: &str) -> Disposition {
        if !self.is_running() {
            return Disposition::Unsolicited;
        }
        tracing::warn!(reason = message, "Ending run");
        self.fail_run(message.to_string());
        Disposition::Applied
    }

    fn fail_run(&mut self, error: String) {
        self.error = Some(error);
        self.final_result = None;
        self.active_agent = None;
        self.in_flight = None;
        self.pipeline.fail_running();
    }
}
