//! Ideate
//!
//! Terminal front-end for the content ideation backend. Connects over
//! WebSocket, submits one request and streams the agent pipeline.

mod commands;

use clap::{Parser, Subcommand};
use ideation_core::config::PersistedConfig;
use ideation_core::models::ContentFormat;
use ideation_core::state::io;
use ideation_core::{ClientConfig, IdeationForm};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone)]
#[command(author, version, about = "Ideate - Multi-agent content ideation client")]
struct Args {
    /// WebSocket endpoint (overrides config and environment)
    #[arg(long, global = true)]
    url: Option<String>,
    /// Seconds a run may go without a frame before timing out (0 = never)
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Generate content ideas
    Run {
        /// Industry or niche, e.g. "Fitness"
        #[arg(short, long)]
        industry: String,
        /// Target audience, e.g. "Gen Z creators"
        #[arg(short, long)]
        audience: String,
        /// Comma-separated formats (blog, video, social); all when omitted
        #[arg(short, long, value_delimiter = ',')]
        formats: Vec<ContentFormat>,
        /// Extra guidance for the agents
        #[arg(short, long)]
        context: Option<String>,
        /// Print the final result as JSON instead of cards
        #[arg(long)]
        json: bool,
    },
    /// Check the backend health endpoint
    Health,
    /// Print the effective configuration
    Config,
    /// Write a default config file to the runtime directory
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ideation_core=debug,ideate=debug"
    } else {
        "ideation_core=info,ideate=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    let root = io::get_runtime_path();
    let mut config = ClientConfig::load().await?;
    config.apply(PersistedConfig {
        ws_url: args.url.clone(),
        run_timeout_secs: args.timeout,
        ..PersistedConfig::default()
    });
    tracing::debug!(url = %config.ws_url, root = ?root, "Configuration loaded");

    match args.command {
        CliCommand::Run {
            industry,
            audience,
            formats,
            context,
            json,
        } => {
            let mut form = IdeationForm::new(industry, audience);
            if !formats.is_empty() {
                form = form.with_formats(&formats);
            }
            if let Some(context) = context {
                form = form.with_context(context);
            }
            commands::run(&config, form, json).await
        }
        CliCommand::Health => commands::health(&config).await,
        CliCommand::Config => commands::show_config(&config),
        CliCommand::Init { force } => commands::init(&root, &config, force).await,
    }
}
