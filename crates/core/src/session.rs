//! # Ideation Session
//!
//! Couples one [`ConnectionManager`] with the [`IdeationState`] reducer.
//! Every connection event, submit, cancel and timeout becomes an [`Action`]
//! applied in arrival order, so the view only ever reads a single state
//! value.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ideation_core::{ClientConfig, IdeationForm, IdeationSession};
//!
//! let config = ClientConfig::load().await?;
//! let mut session = IdeationSession::start(&config)?;
//! session.wait_until_open(config.connect_timeout()).await?;
//! session.submit(&IdeationForm::new("Fitness", "Gen Z creators"))?;
//! session.run_until_settled(|state| println!("{}", render_pipeline(state.pipeline()))).await;
//! ```

use crate::config::ClientConfig;
use crate::connection::{ConnectionEvent, ConnectionManager};
use crate::error::{IdeationError, Result};
use crate::models::RequestId;
use crate::state::{Action, Disposition, IdeationForm, IdeationState};
use crate::swarm::events::encode_request;
use std::time::Duration;
use tokio::sync::mpsc;

/// Outcome of waiting for the next event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// A connection event was applied
    Event(Disposition),
    /// The running request saw no frame within the run timeout
    TimedOut,
    /// The socket task finished; no further events will arrive
    Ended,
}

pub struct IdeationSession {
    connection: ConnectionManager,
    events: mpsc::Receiver<ConnectionEvent>,
    state: IdeationState,
    run_timeout: Option<Duration>,
    correlate: bool,
}

impl IdeationSession {
    /// Start connecting with `config`. Must be called inside a tokio runtime.
    pub fn start(config: &ClientConfig) -> Result<Self> {
        let url = config.endpoint()?;
        let (connection, events) = ConnectionManager::connect(url, config.reconnect.clone())?;
        Ok(Self {
            connection,
            events,
            state: IdeationState::new(),
            run_timeout: config.run_timeout(),
            correlate: config.correlate_requests,
        })
    }

    /// Override the run inactivity timeout (`None` waits forever)
    pub fn with_run_timeout(mut self, run_timeout: Option<Duration>) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn state(&self) -> &IdeationState {
        &self.state
    }

    /// Apply events until the socket opens, the task ends, or `limit` passes
    pub async fn wait_until_open(&mut self, limit: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + limit;
        while !self.state.is_connected() {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(event)) => {
                    self.state.apply(Action::Connection(event));
                }
                Ok(None) | Err(_) => return Err(IdeationError::NotConnected),
            }
        }
        Ok(())
    }

    /// Validate the form and send one request.
    ///
    /// Invalid forms and submits during a running request change nothing.
    /// A submit while the socket is closed records the "not connected" error.
    pub fn submit(&mut self, form: &IdeationForm) -> Result<RequestId> {
        let request = form.validate()?;
        if self.state.is_running() {
            tracing::debug!("Submit ignored, a request is already running");
            return Err(IdeationError::Busy);
        }

        let request_id = RequestId::generate();
        let frame = encode_request(&request, self.correlate.then_some(&request_id))?;
        if let Err(e) = self.connection.send(frame) {
            tracing::error!("WebSocket is not connected.");
            self.state.apply(Action::SubmitRejected);
            return Err(e);
        }

        tracing::info!(
            request_id = %request_id,
            industry = %request.industry,
            formats = request.content_types.len(),
            "Ideation request sent"
        );
        self.state.apply(Action::Submitted {
            request_id: request_id.clone(),
            correlated: self.correlate,
        });
        Ok(request_id)
    }

    /// End the running request. Returns false when nothing was running.
    pub fn cancel(&mut self) -> bool {
        self.state.apply(Action::Cancelled) == Disposition::Applied
    }

    /// Wait for the next event and apply it
    pub async fn next(&mut self) -> SessionStep {
        let event = match self.run_timeout {
            Some(limit) if self.state.is_running() => {
                match tokio::time::timeout(limit, self.events.recv()).await {
                    Ok(event) => event,
                    Err(_) => {
                        self.state.apply(Action::TimedOut);
                        return SessionStep::TimedOut;
                    }
                }
            }
            _ => self.events.recv().await,
        };

        match event {
            Some(event) => SessionStep::Event(self.state.apply(Action::Connection(event))),
            None => SessionStep::Ended,
        }
    }

    /// Process events until the running request settles, calling
    /// `on_change` after every step
    pub async fn run_until_settled(&mut self, mut on_change: impl FnMut(&IdeationState)) {
        while self.state.is_running() {
            let step = self.next().await;
            on_change(&self.state);
            if step == SessionStep::Ended {
                break;
            }
        }
    }

    /// Close the socket and wait for it to finish
    pub async fn close(self) {
        self.connection.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ReconnectPolicy;
    use crate::error::NOT_CONNECTED_MESSAGE;
    use crate::models::{AgentId, ContentFormat};
    use crate::state::store::TIMED_OUT_MESSAGE;
    use crate::swarm::pipeline::AgentStatus;
    use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
    use axum::routing::get;
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::Arc;

    type Script = Arc<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

    async fn scripted(mut socket: WebSocket, script: Script, seen: mpsc::UnboundedSender<String>) {
        while let Some(Ok(message)) = socket.recv().await {
            if let Message::Text(text) = message {
                let request: Value = serde_json::from_str(&text).unwrap_or_default();
                let _ = seen.send(text);
                for frame in script(&request) {
                    if socket.send(Message::Text(frame.to_string())).await.is_err() {
                        return;
                    }
                }
            }
        }
    }

    async fn spawn_backend(script: Script) -> (String, mpsc::UnboundedReceiver<String>) {
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/ws/ideate",
            get(move |ws: WebSocketUpgrade| {
                let script = script.clone();
                let seen = seen_tx.clone();
                async move { ws.on_upgrade(move |socket| scripted(socket, script, seen)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("ws://{}/ws/ideate", addr), seen_rx)
    }

    fn config_for(ws_url: String) -> ClientConfig {
        ClientConfig {
            ws_url,
            reconnect: ReconnectPolicy::disabled(),
            ..ClientConfig::default()
        }
    }

    fn agent_update(agent: &str) -> Value {
        json!({
            "type": "agent_update",
            "payload": { "agent_name": agent, "message": format!("{} working", agent) }
        })
    }

    fn final_result() -> Value {
        json!({
            "type": "final_result",
            "payload": { "ideas": [
                { "id": "1", "format": "blog", "title": "30-day mobility challenge",
                  "description": "Daily stretches", "structure": "Intro, plan, CTA",
                  "keywords": ["mobility"], "confidence": 88, "trending": true,
                  "estimated_engagement": "High" },
                { "id": "2", "format": "video", "title": "Gym myths", "description": "Debunks",
                  "structure": "Hook, myths, recap", "keywords": [], "confidence": 71,
                  "trending": false, "estimated_engagement": "Medium" }
            ]}
        })
    }

    #[tokio::test]
    async fn test_fitness_scenario_end_to_end() {
        let script: Script = Arc::new(|_| {
            vec![
                json!({ "type": "status", "message": "Starting ideation pipeline..." }),
                agent_update("researcher"),
                json!("not a frame"),
                agent_update("writer"),
                final_result(),
            ]
        });
        let (url, mut seen) = spawn_backend(script).await;
        let config = config_for(url);
        let mut session = IdeationSession::start(&config).unwrap();
        session.wait_until_open(Duration::from_secs(5)).await.unwrap();

        let form = IdeationForm::new("Fitness", "Gen Z creators")
            .with_formats(&[ContentFormat::Blog, ContentFormat::Video]);
        session.submit(&form).unwrap();
        assert!(matches!(session.submit(&form), Err(IdeationError::Busy)));

        let mut snapshots = Vec::new();
        session
            .run_until_settled(|state| snapshots.push(*state.pipeline()))
            .await;

        assert_eq!(
            seen.recv().await.unwrap(),
            r#"{"industry":"Fitness","target_audience":"Gen Z creators","content_types":["blog","video"]}"#
        );

        let state = session.state();
        assert_eq!(state.pipeline().status(AgentId::Researcher), AgentStatus::Completed);
        assert_eq!(state.pipeline().status(AgentId::Analyst), AgentStatus::Pending);
        assert_eq!(state.pipeline().status(AgentId::Writer), AgentStatus::Completed);
        assert_eq!(state.final_result().unwrap().ideas.len(), 2);
        assert!(state.error().is_none());
        assert!(snapshots
            .iter()
            .any(|p| p.status(AgentId::Researcher) == AgentStatus::Running));

        session.close().await;
        assert!(seen.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_backend_error_marks_running_agent() {
        let script: Script = Arc::new(|_| {
            vec![
                agent_update("researcher"),
                agent_update("Audience Analyst"),
                json!({ "type": "error", "payload": "LLM quota exceeded" }),
            ]
        });
        let (url, _seen) = spawn_backend(script).await;
        let mut session = IdeationSession::start(&config_for(url)).unwrap();
        session.wait_until_open(Duration::from_secs(5)).await.unwrap();

        session
            .submit(&IdeationForm::new("Finance", "B2B Founders"))
            .unwrap();
        session.run_until_settled(|_| {}).await;

        let state = session.state();
        assert_eq!(state.error(), Some("LLM quota exceeded"));
        assert_eq!(state.pipeline().status(AgentId::Researcher), AgentStatus::Completed);
        assert_eq!(state.pipeline().status(AgentId::Analyst), AgentStatus::Error);
        assert!(state.final_result().is_none());
        session.close().await;
    }

    #[tokio::test]
    async fn test_submit_without_connection_sends_nothing() {
        let mut session =
            IdeationSession::start(&config_for("ws://127.0.0.1:9/ws/ideate".to_string())).unwrap();
        let opened = session.wait_until_open(Duration::from_secs(5)).await;
        assert!(matches!(opened, Err(IdeationError::NotConnected)));

        let result = session.submit(&IdeationForm::new("Finance", "Founders"));
        assert!(matches!(result, Err(IdeationError::NotConnected)));
        assert_eq!(session.state().error(), Some(NOT_CONNECTED_MESSAGE));
        assert!(!session.state().is_running());
        session.close().await;
    }

    #[tokio::test]
    async fn test_invalid_form_changes_nothing() {
        let (url, _seen) = spawn_backend(Arc::new(|_| Vec::new())).await;
        let mut session = IdeationSession::start(&config_for(url)).unwrap();
        session.wait_until_open(Duration::from_secs(5)).await.unwrap();

        let before = session.state().clone();
        let result = session.submit(&IdeationForm::new("", "Founders"));
        assert!(matches!(result, Err(IdeationError::Validation(_))));
        assert_eq!(session.state(), &before);
        session.close().await;
    }

    #[tokio::test]
    async fn test_stalled_run_times_out() {
        let script: Script = Arc::new(|_| vec![agent_update("researcher")]);
        let (url, _seen) = spawn_backend(script).await;
        let mut session = IdeationSession::start(&config_for(url))
            .unwrap()
            .with_run_timeout(Some(Duration::from_millis(300)));
        session.wait_until_open(Duration::from_secs(5)).await.unwrap();

        session
            .submit(&IdeationForm::new("Travel", "Backpackers"))
            .unwrap();
        let mut steps = Vec::new();
        while session.state().is_running() {
            steps.push(session.next().await);
        }

        assert_eq!(steps.last(), Some(&SessionStep::TimedOut));
        assert_eq!(session.state().error(), Some(TIMED_OUT_MESSAGE));
        assert_eq!(
            session.state().pipeline().status(AgentId::Researcher),
            AgentStatus::Error
        );
        session.close().await;
    }

    #[tokio::test]
    async fn test_cancel_then_stale_frames_are_dropped() {
        let script: Script = Arc::new(|request| {
            let id = request["request_id"].clone();
            vec![
                json!({ "type": "error", "request_id": "req-old", "payload": "old run" }),
                json!({ "type": "agent_update", "request_id": id,
                        "payload": { "agent_name": "researcher", "message": "go" } }),
                json!({ "type": "final_result", "request_id": id, "payload": { "ideas": [] } }),
            ]
        });
        let (url, mut seen) = spawn_backend(script).await;
        let mut config = config_for(url);
        config.correlate_requests = true;
        let mut session = IdeationSession::start(&config).unwrap();
        session.wait_until_open(Duration::from_secs(5)).await.unwrap();

        let request_id = session
            .submit(&IdeationForm::new("Gaming", "Streamers"))
            .unwrap();
        let sent: Value = serde_json::from_str(&seen.recv().await.unwrap()).unwrap();
        assert_eq!(sent["request_id"], request_id.as_str());

        let mut dispositions = Vec::new();
        while session.state().is_running() {
            if let SessionStep::Event(d) = session.next().await {
                dispositions.push(d);
            }
        }
        assert!(dispositions.contains(&Disposition::Stale));
        assert!(session.state().error().is_none());
        assert_eq!(
            session.state().pipeline().status(AgentId::Researcher),
            AgentStatus::Completed
        );

        assert!(!session.cancel());
        session.close().await;
    }

    #[tokio::test]
    async fn test_backend_tagged_frames_complete_uncorrelated_run() {
        let script: Script = Arc::new(|_| {
            vec![
                json!({ "type": "agent_update", "request_id": "3f2a-server",
                        "payload": { "agent_name": "Trend Researcher", "message": "scanning" } }),
                json!({ "type": "final_result", "request_id": "3f2a-server",
                        "payload": { "ideas": [] } }),
            ]
        });
        let (url, mut seen) = spawn_backend(script).await;
        let mut session = IdeationSession::start(&config_for(url)).unwrap();
        session.wait_until_open(Duration::from_secs(5)).await.unwrap();

        session
            .submit(&IdeationForm::new("Beauty", "Skincare fans"))
            .unwrap();
        let sent: Value = serde_json::from_str(&seen.recv().await.unwrap()).unwrap();
        assert!(sent.get("request_id").is_none());

        session.run_until_settled(|_| {}).await;
        assert!(session.state().error().is_none());
        assert!(session.state().final_result().is_some());
        assert_eq!(
            session.state().pipeline().status(AgentId::Researcher),
            AgentStatus::Completed
        );
        session.close().await;
    }

    #[tokio::test]
    async fn test_cancel_running_request() {
        let script: Script = Arc::new(|_| vec![agent_update("writer")]);
        let (url, _seen) = spawn_backend(script).await;
        let mut session = IdeationSession::start(&config_for(url)).unwrap();
        session.wait_until_open(Duration::from_secs(5)).await.unwrap();

        session
            .submit(&IdeationForm::new("Food", "Home cooks"))
            .unwrap();
        while session.state().active_agent().is_none() {
            session.next().await;
        }
        assert!(session.cancel());
        assert!(!session.state().is_running());
        assert_eq!(
            session.state().pipeline().status(AgentId::Writer),
            AgentStatus::Error
        );
        session.close().await;
    }
}
