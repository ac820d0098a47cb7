//! # Swarm Protocol
//!
//! What the client knows about the remote agent pipeline.
//!
//! ## Pipeline Flow
//!
//! ```text
//! Trend Researcher → Audience Analyst → Creative Writer → final_result | error
//! ```

pub mod events;
pub mod pipeline;

pub use events::{
    encode_request, parse_frame, AgentUpdate, FrameError, InboundFrame, ServerMessage,
};
pub use pipeline::{AgentStatus, PipelineState, StatusGlyph};
