//! # Pipeline Stages
//!
//! Per-agent status for the three fixed pipeline stages.
//!
//! The backend never says "agent N is done". Completion is inferred: the
//! agents run strictly in sequence, so an update from one agent implies that
//! whichever agent was running before it has finished.

use crate::models::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Not started in this run
    #[default]
    Pending,
    /// Most recently reported agent
    Running,
    /// Finished successfully
    Completed,
    /// Run failed while this agent was working
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Badge glyph, nothing while pending
    pub fn glyph(&self) -> Option<StatusGlyph> {
        match self {
            Self::Pending => None,
            Self::Running => Some(StatusGlyph::Spinner),
            Self::Completed => Some(StatusGlyph::Check),
            Self::Error => Some(StatusGlyph::ErrorMarker),
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual marker drawn next to an agent badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGlyph {
    Spinner,
    Check,
    ErrorMarker,
}

impl StatusGlyph {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Spinner => "⏳",
            Self::Check => "✅",
            Self::ErrorMarker => "❌ Error!",
        }
    }
}

/// Status of every agent in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineState {
    statuses: [AgentStatus; 3],
}

impl PipelineState {
    /// All agents pending
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, agent: AgentId) -> AgentStatus {
        self.statuses[agent.index()]
    }

    /// Agents with their status, in pipeline order
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, AgentStatus)> + '_ {
        AgentId::ALL.into_iter().map(|agent| (agent, self.status(agent)))
    }

    /// An update from `agent` arrived.
    ///
    /// Any other running agent is promoted to completed. `agent` itself only
    /// moves from pending to running; terminal statuses never regress.
    pub fn start(&mut self, agent: AgentId) {
        for other in AgentId::ALL {
            if other != agent && self.status(other) == AgentStatus::Running {
                self.set(other, AgentStatus::Completed);
            }
        }
        if self.status(agent) == AgentStatus::Pending {
            self.set(agent, AgentStatus::Running);
        }
    }

    /// Final result arrived: running agents completed
    pub fn complete_running(&mut self) {
        self.settle_running(AgentStatus::Completed);
    }

    /// Run failed: running agents errored
    pub fn fail_running(&mut self) {
        self.settle_running(AgentStatus::Error);
    }

    /// Back to all-pending
    pub fn reset(&mut self) {
        self.statuses = [AgentStatus::Pending; 3];
    }

    pub fn any_running(&self) -> bool {
        self.statuses.contains(&AgentStatus::Running)
    }

    pub fn is_idle(&self) -> bool {
        self.statuses.iter().all(|s| *s == AgentStatus::Pending)
    }

    fn settle_running(&mut self, to: AgentStatus) {
        for status in self.statuses.iter_mut() {
            if *status == AgentStatus::Running {
                *status = to;
            }
        }
    }

    fn set(&mut self, agent: AgentId, status: AgentStatus) {
        self.statuses[agent.index()] = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_updates_complete_previous_agents() {
        let mut pipeline = PipelineState::new();
        pipeline.start(AgentId::Researcher);
        assert_eq!(pipeline.status(AgentId::Researcher), AgentStatus::Running);

        pipeline.start(AgentId::Analyst);
        assert_eq!(pipeline.status(AgentId::Researcher), AgentStatus::Completed);
        assert_eq!(pipeline.status(AgentId::Analyst), AgentStatus::Running);

        pipeline.start(AgentId::Writer);
        assert_eq!(pipeline.status(AgentId::Researcher), AgentStatus::Completed);
        assert_eq!(pipeline.status(AgentId::Analyst), AgentStatus::Completed);
        assert_eq!(pipeline.status(AgentId::Writer), AgentStatus::Running);
    }

    #[test]
    fn test_repeated_update_keeps_agent_running() {
        let mut pipeline = PipelineState::new();
        pipeline.start(AgentId::Analyst);
        pipeline.start(AgentId::Analyst);
        assert_eq!(pipeline.status(AgentId::Analyst), AgentStatus::Running);
        assert_eq!(pipeline.status(AgentId::Researcher), AgentStatus::Pending);
    }

    #[test]
    fn test_completed_agent_never_regresses() {
        let mut pipeline = PipelineState::new();
        pipeline.start(AgentId::Researcher);
        pipeline.start(AgentId::Analyst);
        pipeline.start(AgentId::Researcher);

        assert_eq!(pipeline.status(AgentId::Researcher), AgentStatus::Completed);
        assert_eq!(pipeline.status(AgentId::Analyst), AgentStatus::Completed);
        assert!(!pipeline.any_running());
    }

    #[test]
    fn test_final_result_leaves_untouched_agents_pending() {
        let mut pipeline = PipelineState::new();
        pipeline.start(AgentId::Researcher);
        pipeline.start(AgentId::Writer);
        pipeline.complete_running();

        assert_eq!(pipeline.status(AgentId::Researcher), AgentStatus::Completed);
        assert_eq!(pipeline.status(AgentId::Analyst), AgentStatus::Pending);
        assert_eq!(pipeline.status(AgentId::Writer), AgentStatus::Completed);
    }

    #[test]
    fn test_error_marks_running_agent() {
        let mut pipeline = PipelineState::new();
        pipeline.start(AgentId::Researcher);
        pipeline.start(AgentId::Analyst);
        pipeline.fail_running();

        assert_eq!(pipeline.status(AgentId::Researcher), AgentStatus::Completed);
        assert_eq!(pipeline.status(AgentId::Analyst), AgentStatus::Error);
        assert_eq!(pipeline.status(AgentId::Writer), AgentStatus::Pending);
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(AgentStatus::Pending.glyph(), None);
        assert_eq!(AgentStatus::Running.glyph(), Some(StatusGlyph::Spinner));
        assert_eq!(AgentStatus::Completed.glyph(), Some(StatusGlyph::Check));
        assert_eq!(AgentStatus::Error.glyph(), Some(StatusGlyph::ErrorMarker));
    }
}
