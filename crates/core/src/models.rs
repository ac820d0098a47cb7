//! # Ideation Models
//!
//! Domain types shared by the wire protocol, the reducer and the view:
//! the three fixed pipeline agents, the request a user submits, and the
//! idea cards that come back in a final result.

use crate::error::UnknownFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named stage of the external ideation pipeline.
///
/// The backend reports agents by id (`researcher`) and, in older builds, by
/// display name (`Trend Researcher`); both spellings decode to the same agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    #[serde(alias = "Trend Researcher")]
    Researcher,
    #[serde(alias = "Audience Analyst")]
    Analyst,
    #[serde(alias = "Creative Writer")]
    Writer,
}

impl AgentId {
    /// All agents in pipeline order
    pub const ALL: [AgentId; 3] = [AgentId::Researcher, AgentId::Analyst, AgentId::Writer];

    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Researcher => "researcher",
            AgentId::Analyst => "analyst",
            AgentId::Writer => "writer",
        }
    }

    /// Display name for the UI
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentId::Researcher => "Trend Researcher",
            AgentId::Analyst => "Audience Analyst",
            AgentId::Writer => "Creative Writer",
        }
    }

    /// 1-based position in the pipeline
    pub fn ordinal(&self) -> usize {
        match self {
            AgentId::Researcher => 1,
            AgentId::Analyst => 2,
            AgentId::Writer => 3,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.ordinal() - 1
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content format a user can ask ideas for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Blog,
    Video,
    Social,
}

impl ContentFormat {
    pub const ALL: [ContentFormat; 3] = [
        ContentFormat::Blog,
        ContentFormat::Video,
        ContentFormat::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Blog => "blog",
            ContentFormat::Video => "video",
            ContentFormat::Social => "social",
        }
    }
}

impl FromStr for ContentFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blog" => Ok(ContentFormat::Blog),
            "video" => Ok(ContentFormat::Video),
            "social" => Ok(ContentFormat::Social),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job parameters sent to the backend. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeationRequest {
    pub industry: String,
    pub target_audience: String,
    pub content_types: Vec<ContentFormat>,
    /// Free-text hints for the agents; omitted from the frame when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// One generated content idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaCard {
    pub id: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub title: String,
    pub description: String,
    pub structure: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Score in the 0–100 range, rendered verbatim
    pub confidence: f64,
    #[serde(default)]
    pub trending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_engagement: Option<String>,
}

/// Terminal success payload of a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinalResult {
    #[serde(default)]
    pub ideas: Vec<IdeaCard>,
}

/// Client-minted identifier for one submitted request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Mint a fresh id
    pub fn generate() -> Self {
        use std::time::{Duration, SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_nanos();
        Self(format!("req-{:x}-{:x}", nanos, rand_u32()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Simple random number (not cryptographic)
pub(crate) fn rand_u32() -> u32 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    RandomState::new().build_hasher().finish() as u32
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
