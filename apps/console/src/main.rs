use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use client_core::{
    export::ArtifactBundle, health::probe_health, load_settings, SessionController,
    SessionPhase, SessionState, WsTransportFactory,
};
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;

use render::Renderer;

/// Runs one sprint against a coordinator and prints its progress.
#[derive(Parser, Debug)]
#[command(name = "sprint")]
struct Args {
    /// What the team should build.
    #[arg(long, required_unless_present = "check_health")]
    goal: Option<String>,
    /// Overrides `coordinator_url` from sprint.toml and the environment.
    #[arg(long)]
    coordinator_url: Option<String>,
    /// Writes the artifacts of a completed sprint under this directory.
    #[arg(long)]
    export_dir: Option<PathBuf>,
    /// Probe the coordinator's health endpoint first.
    #[arg(long)]
    check_health: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.coordinator_url {
        settings.coordinator_url = url;
    }
    let factory = WsTransportFactory::from_settings(&settings)?;

    if args.check_health {
        let health = probe_health(&reqwest::Client::new(), factory.base_url())
            .await
            .with_context(|| format!("coordinator at {} is not healthy", settings.coordinator_url))?;
        println!("coordinator {} (version {})", health.status, health.version);
    }

    let Some(goal) = args.goal else {
        return Ok(());
    };

    let state = run_sprint(factory, goal).await?;

    if let Some(dir) = args.export_dir {
        export(&state, &dir)?;
    }

    match state.phase() {
        SessionPhase::Complete => Ok(()),
        SessionPhase::Cancelled => bail!("sprint cancelled"),
        _ => bail!(
            "sprint did not complete: {}",
            state.error.as_deref().unwrap_or("no outcome reported")
        ),
    }
}

async fn run_sprint(factory: WsTransportFactory, goal: String) -> Result<SessionState> {
    let mut controller = SessionController::new(factory);
    let mut snapshots = WatchStream::new(controller.subscribe());

    let driver = tokio::spawn(async move {
        controller.set_goal(goal);
        let interrupted = tokio::select! {
            _ = drive(&mut controller) => false,
            _ = tokio::signal::ctrl_c() => true,
        };
        if interrupted {
            info!("sprint: interrupted");
            controller.stop();
        }
        controller.state().clone()
    });

    let mut renderer = Renderer::default();
    while let Some(snapshot) = snapshots.next().await {
        for line in renderer.render(&snapshot) {
            println!("{line}");
        }
    }

    driver.await.context("sprint driver panicked")
}

/// Connects and then follows the session until its transport closes.
async fn drive(controller: &mut SessionController<WsTransportFactory>) {
    if let Err(err) = controller.start_sprint().await {
        warn!(error = %err, "sprint: could not start");
        return;
    }
    controller.run_until_settled().await;
}

fn export(state: &SessionState, dir: &Path) -> Result<()> {
    if state.artifacts.is_empty() {
        warn!("sprint: nothing to export");
        return Ok(());
    }
    let bundle = ArtifactBundle::build(&state.goal, &state.artifacts, Utc::now())?;
    let root = bundle.write_to(dir)?;
    println!("exported {} files to {}", bundle.files.len(), root.display());
    Ok(())
}
