//! # Pipeline View
//!
//! Plain-text rendering of the client state: agent badges, the results
//! panel, the activity log and the submit label.

use crate::connection::ConnectionStatus;
use crate::models::{FinalResult, IdeaCard};
use crate::state::{AgentActivity, IdeationState};
use crate::swarm::pipeline::PipelineState;
use std::fmt::Write;

/// Cells in a confidence bar
pub const BAR_WIDTH: usize = 20;

/// What the results panel shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultPanel<'a> {
    Ideas(&'a FinalResult),
    Error(&'a str),
    Placeholder,
}

impl<'a> ResultPanel<'a> {
    /// Ideas win over an error; an empty result falls through.
    pub fn from_state(state: &'a IdeationState) -> Self {
        match (state.final_result(), state.error()) {
            (Some(result), _) if !result.ideas.is_empty() => ResultPanel::Ideas(result),
            (_, Some(error)) => ResultPanel::Error(error),
            _ => ResultPanel::Placeholder,
        }
    }
}

pub fn submit_label(connected: bool, running: bool) -> &'static str {
    if running {
        "Processing..."
    } else if connected {
        "Generate Ideas"
    } else {
        "Connecting..."
    }
}

pub fn connection_line(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Open => "● connected",
        ConnectionStatus::Connecting => "○ connecting...",
        ConnectionStatus::Closed => "○ not connected",
    }
}

/// One line per agent, in pipeline order
pub fn render_pipeline(pipeline: &PipelineState) -> String {
    let mut out = String::from("Agent Pipeline\n");
    for (agent, status) in pipeline.iter() {
        let glyph = status.glyph().map(|g| g.symbol()).unwrap_or("");
        let line = format!(
            "  Agent {}  {:<18} {:<10} {}",
            agent.ordinal(),
            agent.display_name(),
            status.as_str(),
            glyph
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Confidence exactly as received, e.g. `87%` or `72.5%`
pub fn confidence_label(confidence: f64) -> String {
    format!("{}%", confidence)
}

/// Filled cells for `confidence` on a bar of `width` cells
pub fn filled_cells(confidence: f64, width: usize) -> usize {
    let ratio = if confidence.is_finite() {
        confidence.clamp(0.0, 100.0) / 100.0
    } else {
        0.0
    };
    (ratio * width as f64).round() as usize
}

pub fn confidence_bar(confidence: f64, width: usize) -> String {
    let filled = filled_cells(confidence, width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn render_card(card: &IdeaCard) -> String {
    let mut out = String::new();

    let mut header = String::new();
    if let Some(icon) = &card.icon {
        header.push_str(icon);
        header.push(' ');
    }
    header.push_str(&card.format);
    if card.trending {
        header.push_str("  🔥 Trending");
    }
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{}", card.title);
    let _ = writeln!(out, "{}", card.description);
    let _ = writeln!(out, "Structure: {}", card.structure);
    if !card.keywords.is_empty() {
        let _ = writeln!(out, "Keywords: {}", card.keywords.join(", "));
    }
    if let Some(engagement) = &card.estimated_engagement {
        let _ = writeln!(out, "Estimated engagement: {}", engagement);
    }
    let _ = writeln!(
        out,
        "{} {}",
        confidence_bar(card.confidence, BAR_WIDTH),
        confidence_label(card.confidence)
    );
    out
}

/// One rendered card per idea, in order
pub fn render_cards(result: &FinalResult) -> Vec<String> {
    result.ideas.iter().map(render_card).collect()
}

pub fn render_results(state: &IdeationState) -> String {
    match ResultPanel::from_state(state) {
        ResultPanel::Ideas(result) => {
            let mut out = format!(
                "Generated Content Ideas ({} ideas)\n",
                result.ideas.len()
            );
            for card in render_cards(result) {
                out.push('\n');
                out.push_str(&card);
            }
            out
        }
        ResultPanel::Error(error) => format!("Error during ideation:\n{}\n", error),
        ResultPanel::Placeholder => "Ready to Generate Ideas\nConfigure your parameters and click \"Generate Ideas\" to start the multi-agent pipeline\n".to_string(),
    }
}

/// One activity line, without trailing newline
pub fn render_activity_entry(entry: &AgentActivity) -> String {
    format!(
        "[{}] {}: {}",
        entry.received_at.format("%H:%M:%S"),
        entry.agent.display_name(),
        entry.message
    )
}

/// Agent messages of the current run
pub fn render_activity(state: &IdeationState) -> String {
    let mut out = String::new();
    for entry in state.activity() {
        let _ = writeln!(out, "{}", render_activity_entry(entry));
    }
    out
}

/// Full screen: connection, pipeline, results
pub fn render_dashboard(state: &IdeationState) -> String {
    format!(
        "{}  [{}]\n\n{}\n{}",
        connection_line(state.connection()),
        submit_label(state.is_connected(), state.is_running()),
        render_pipeline(state.pipeline()),
        render_results(state)
    )
}
