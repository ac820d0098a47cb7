//! # Connection
//!
//! The single WebSocket to the backend, its reconnect policy, and the HTTP
//! health probe that shares its host.

pub mod backoff;
pub mod health;
pub mod manager;

pub use backoff::ReconnectPolicy;
pub use health::{check_health, health_url, HealthStatus};
pub use manager::{ConnectionEvent, ConnectionManager, ConnectionStatus};
