#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Candy Quest session over stdin and stdout.
//!
//! Each stdin line is a JSON action request. Rejections are reported on
//! stderr and every published snapshot is written to stdout as one JSON line.

use std::{
    io::Write as _,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use candy_quest_core::{ActionRequest, ContentTables, SessionSnapshot, UserId};
use candy_quest_engine::{Session, SessionConfig};
use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Runs a turn-based trick-or-treat session driven by JSON lines.
#[derive(Debug, Parser)]
#[command(name = "candy-quest", version)]
struct Cli {
    /// Session configuration in TOML; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Encounter and item tables in JSON.
    #[arg(long)]
    content: PathBuf,
    /// Participant joining the session; repeat once per player.
    #[arg(long = "player", required = true)]
    players: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "candy_quest=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let content = load_content(&cli.content)?;
    let players: Vec<UserId> = cli.players.into_iter().map(UserId::new).collect();

    let session =
        Session::new(config, Arc::new(content), &players).context("failed to start session")?;
    print_snapshot(&session.snapshot().await)?;

    let mut snapshots = session.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match snapshots.recv().await {
                Ok(snapshot) => {
                    if let Err(error) = print_snapshot(&snapshot) {
                        tracing::error!(error = ?error, "stopped printing snapshots");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "snapshot printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
    let worker = session.spawn_worker();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let request: ActionRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(error) => {
                eprintln!("invalid request: {error}");
                continue;
            }
        };
        let user = request.user.clone();
        match session.submit(request).await {
            Ok(ticket) => tracing::debug!(user = %user, ticket = ticket.get(), "request queued"),
            Err(rejection) => eprintln!("rejected request from {user}: {rejection}"),
        }
    }

    session.close();
    worker.await.context("queue worker panicked")?;
    drop(session);
    printer.await.context("snapshot printer panicked")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session config {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse session config {}", path.display()))
}

fn load_content(path: &Path) -> anyhow::Result<ContentTables> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read content tables {}", path.display()))?;
    ContentTables::from_json_str(&contents)
        .with_context(|| format!("failed to load content tables {}", path.display()))
}

fn print_snapshot(snapshot: &SessionSnapshot) -> anyhow::Result<()> {
    let line = serde_json::to_string(snapshot).context("failed to encode snapshot")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}").context("failed to write snapshot")?;
    stdout.flush().context("failed to flush stdout")
}
