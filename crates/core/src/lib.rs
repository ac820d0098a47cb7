//! # Ideation Core
//!
//! Client library for the multi-agent content ideation backend. Holds the
//! WebSocket connection, the agent pipeline state machine and the text
//! rendering of results.
//!
//! ## Architecture
//!
//! - `connection/` - WebSocket lifecycle, reconnect backoff, health probe
//! - `swarm/` - Wire frames and the researcher → analyst → writer pipeline
//! - `state/` - Form validation, the single reducer, runtime files
//! - `session` - Connection + reducer glue with submit, cancel and timeout
//! - `view` - Plain-text dashboard and idea cards
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
//! session.run_until_settled(|_| {}).await;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod session;
pub mod state;
pub mod swarm;
pub mod view;

pub use config::ClientConfig;
pub use error::{IdeationError, Result};
pub use session::{IdeationSession, SessionStep};
pub use state::{IdeationForm, IdeationState};
