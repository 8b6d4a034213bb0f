use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ideaforge_application::ForgeApp;
use ideaforge_execution::tracing_layer::JobEventLayer;
use ideaforge_infrastructure::ConfigLoader;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

#[derive(Parser)]
#[command(name = "ideaforge")]
#[command(about = "Ideaforge CLI - classify posts, mine pain points and generate product ideas", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/ideaforge/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Stream job lifecycle events to stderr as JSON lines
    #[arg(long, global = true)]
    events: bool,

    /// Log as JSON instead of plain text
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a single post describes a pain point
    Classify {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Classify every post in a JSON array file
    ClassifyBatch {
        /// JSON file with an array of posts
        posts: PathBuf,
    },
    /// Extract pain points from a JSON array of posts
    Extract {
        posts: PathBuf,
    },
    /// Generate business ideas from a JSON array of pain points
    Ideas {
        pain_points: PathBuf,
    },
    /// Generate a landing page from a JSON landing page spec
    Generate {
        spec: PathBuf,
        /// Ask for a JSON content spec instead of React code
        #[arg(long)]
        structured: bool,
        /// Also write generated React code to this file
        #[arg(long)]
        code_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let event_receiver = init_tracing(cli.events, cli.json_logs);

    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("Failed to load configuration")?;

    let mut app = ForgeApp::build(&config)?;
    app.start_session_sweeper()?;

    let cancel = app.cancellation_token();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling running jobs");
            interrupt.cancel();
        }
    });

    let printer = event_receiver.map(commands::events::spawn_printer);

    let outcome = match cli.command {
        Commands::Classify { title, body } => commands::classify::single(&app, &title, &body, &cancel).await,
        Commands::ClassifyBatch { posts } => commands::classify::batch(&app, &posts, &cancel).await,
        Commands::Extract { posts } => commands::research::extract(&app, &posts, &cancel).await,
        Commands::Ideas { pain_points } => commands::research::ideas(&app, &pain_points, &cancel).await,
        Commands::Generate {
            spec,
            structured,
            code_out,
        } => commands::generate::run(&app, &spec, structured, code_out.as_deref(), &cancel).await,
    };

    app.shutdown().await;
    if let Some(printer) = printer {
        printer.finish().await;
    }

    outcome
}

/// Installs the global subscriber. Returns the job event stream when
/// `events` is set.
fn init_tracing(
    events: bool,
    json_logs: bool,
) -> Option<tokio::sync::mpsc::UnboundedReceiver<ideaforge_execution::tracing_layer::JobEvent>> {
    let (event_layer, receiver) = if events {
        let (layer, receiver) = JobEventLayer::channel();
        (Some(layer), Some(receiver))
    } else {
        (None, None)
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(event_layer);
    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_filter(filter),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(filter),
            )
            .init();
    }

    receiver
}
