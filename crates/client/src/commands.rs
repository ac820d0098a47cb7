//! Subcommand handlers.

use anyhow::{bail, Context, Result};
use ideation_core::config::{PersistedConfig, CONFIG_FILE};
use ideation_core::connection::check_health;
use ideation_core::session::SessionStep;
use ideation_core::state::{io, AgentActivity};
use ideation_core::swarm::PipelineState;
use ideation_core::view;
use ideation_core::{ClientConfig, IdeationError, IdeationForm, IdeationSession};
use std::path::Path;

pub async fn run(config: &ClientConfig, form: IdeationForm, json: bool) -> Result<()> {
    // Reject bad input before opening a socket
    form.validate()?;

    let mut session = IdeationSession::start(config)?;
    eprintln!("{}", view::connection_line(session.state().connection()));
    if let Err(e) = session.wait_until_open(config.connect_timeout()).await {
        tracing::warn!(url = %config.ws_url, "Backend unreachable: {}", e);
    }

    match session.submit(&form) {
        Ok(request_id) => tracing::debug!(request_id = %request_id, "Submitted"),
        Err(IdeationError::NotConnected) => {}
        Err(e) => return Err(e.into()),
    }

    let mut shown_pipeline: Option<PipelineState> = None;
    let mut shown_activity: Option<AgentActivity> = None;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while session.state().is_running() {
        tokio::select! {
            step = session.next() => {
                if step == SessionStep::TimedOut {
                    tracing::warn!("No progress within the run timeout");
                }
                if step == SessionStep::Ended && session.state().is_running() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                eprintln!("Cancelling...");
                session.cancel();
            }
        }

        let state = session.state();
        if shown_pipeline.as_ref() != Some(state.pipeline()) {
            eprint!("{}", view::render_pipeline(state.pipeline()));
            shown_pipeline = Some(*state.pipeline());
        }
        let latest = state.activity().last().cloned();
        if latest.is_some() && latest != shown_activity {
            if let Some(entry) = &latest {
                eprintln!("  {}", view::render_activity_entry(entry));
            }
            shown_activity = latest;
        }
    }

    let state = session.state().clone();
    session.close().await;

    if json {
        if let Some(result) = state.final_result() {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    } else {
        print!("{}", view::render_dashboard(&state));
    }

    if let Some(error) = state.error() {
        bail!("{}", error);
    }
    Ok(())
}

pub async fn health(config: &ClientConfig) -> Result<()> {
    let endpoint = config.endpoint()?;
    let status = check_health(&endpoint, config.connect_timeout())
        .await
        .with_context(|| format!("Backend at {} did not answer", endpoint))?;

    println!(
        "{} ({})",
        status.status,
        status.service.as_deref().unwrap_or("unknown service")
    );
    if !status.is_healthy() {
        bail!("backend reported status '{}'", status.status);
    }
    Ok(())
}

pub fn show_config(config: &ClientConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

pub async fn init(root: &Path, config: &ClientConfig, force: bool) -> Result<()> {
    if io::file_exists(root, CONFIG_FILE).await && !force {
        println!(
            "{} already exists (use --force to overwrite)",
            root.join(CONFIG_FILE).display()
        );
        return Ok(());
    }

    let persisted = PersistedConfig {
        ws_url: Some(config.ws_url.clone()),
        connect_timeout_secs: Some(config.connect_timeout_secs),
        run_timeout_secs: Some(config.run_timeout_secs),
        correlate_requests: Some(config.correlate_requests),
        reconnect: Some(config.reconnect.clone()),
        reconnect_attempts: None,
    };
    let path = persisted.save(root).await?;
    println!("Wrote {}", path.display());
    Ok(())
}
