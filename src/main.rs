use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use cx_loadtest::config::RunConfig;
use cx_loadtest::core::{
    DialogflowCaller, Dispatcher, QueryInput, RequestBuilder, TargetMode,
};
use cx_loadtest::utils::load_linear16_wav;

/// cx-loadtest - Concurrent load-testing harness for Dialogflow CX agents
#[derive(Parser, Debug)]
#[command(name = "cx-loadtest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: RunArgs,

    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI overrides applied on top of file/environment configuration
#[derive(Args, Debug)]
struct RunArgs {
    /// Total number of requests to send
    #[arg(long)]
    num_requests: Option<usize>,

    /// Maximum number of concurrent requests
    #[arg(long)]
    concurrency_limit: Option<usize>,

    /// Two Google Cloud project IDs (one per target)
    #[arg(long, num_args = 1..)]
    project_ids: Option<Vec<String>>,

    /// Two Dialogflow CX agent IDs (one per target)
    #[arg(long, num_args = 1..)]
    agent_ids: Option<Vec<String>>,

    /// GCP region where the agents are hosted
    #[arg(long)]
    location: Option<String>,

    /// Synthesis voice tags, one per target
    #[arg(long, num_args = 1..)]
    voice_tags: Option<Vec<String>>,

    /// Target selection mode: alternate or fixed
    #[arg(long)]
    mode: Option<String>,

    /// Target index used with --mode fixed
    #[arg(long)]
    target_index: Option<usize>,

    /// Text utterance to send
    #[arg(long)]
    text: Option<String>,

    /// WAV file to send instead of text (16 kHz mono LINEAR16)
    #[arg(long, value_name = "FILE")]
    audio: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all agents in a project and location
    ListAgents {
        /// Google Cloud project ID
        #[arg(long)]
        project_id: String,

        /// GCP region (defaults to the configured location)
        #[arg(long)]
        location: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let mut config = if let Some(ref config_path) = cli.config {
        println!("Loading configuration from {}", config_path.display());
        RunConfig::from_file(config_path)?
    } else {
        RunConfig::from_env()?
    };
    apply_overrides(&mut config, &cli.overrides)?;

    // Handle subcommands
    if let Some(command) = cli.command {
        match command {
            Commands::ListAgents {
                project_id,
                location,
            } => {
                let location = location.unwrap_or_else(|| config.location.clone());
                let caller = DialogflowCaller::connect(&location).await?;
                let agents = caller
                    .list_agents(&project_id, &location)
                    .await
                    .map_err(|e| anyhow!("failed to list agents: {e}"))?;

                if agents.is_empty() {
                    println!("No agents found in projects/{project_id}/locations/{location}");
                } else {
                    for agent in agents {
                        println!("{},{}", agent.name, agent.display_name);
                    }
                }
                return Ok(());
            }
        }
    }

    // Fail fast before any unit is scheduled
    config.validate()?;

    // Resolve the query input: audio file wins over text
    let input = match config.audio_path {
        Some(ref path) => load_linear16_wav(path)?,
        None => QueryInput::Text(config.text.clone()),
    };

    let targets = config.build_targets()?;
    for target in targets.targets() {
        info!(
            project = %target.project_id,
            agent = %target.agent_id,
            session = %target.session_id,
            voice = target.voice_tag.as_deref().unwrap_or("-"),
            "target ready"
        );
    }

    println!(
        "Preparing {} requests with a concurrency limit of {}.",
        config.num_requests, config.concurrency_limit
    );

    let caller = Arc::new(DialogflowCaller::connect(&config.location).await?);
    let dispatcher = Dispatcher::new(
        caller,
        targets,
        RequestBuilder::new(&config.language),
        config.concurrency_limit,
    )?;

    let summary = dispatcher.run(config.num_requests, input).await?;

    println!("{summary}");

    // Exit status reflects the dispatch mechanism, not request-level failure
    // rates; those are data in the summary above.
    Ok(())
}

/// Apply CLI flags on top of the loaded configuration
fn apply_overrides(config: &mut RunConfig, args: &RunArgs) -> anyhow::Result<()> {
    if let Some(value) = args.num_requests {
        config.num_requests = value;
    }
    if let Some(value) = args.concurrency_limit {
        config.concurrency_limit = value;
    }
    if let Some(ref value) = args.project_ids {
        config.project_ids = value.clone();
    }
    if let Some(ref value) = args.agent_ids {
        config.agent_ids = value.clone();
    }
    if let Some(ref value) = args.location {
        config.location = value.clone();
    }
    if let Some(ref value) = args.voice_tags {
        config.voice_tags = value.clone();
    }
    if let Some(ref mode) = args.mode {
        config.mode = mode.parse()?;
    }
    if let Some(index) = args.target_index {
        // --target-index only makes sense for fixed selection; promote the
        // mode rather than silently ignoring the flag.
        config.mode = TargetMode::Fixed(index);
    }
    if let Some(ref value) = args.text {
        config.text = value.clone();
    }
    if let Some(ref value) = args.audio {
        config.audio_path = Some(value.clone());
    }
    Ok(())
}
