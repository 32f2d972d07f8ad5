// SPDX-License-Identifier: Apache-2.0

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use fantail::{BoxError, Selection, Tailer, TailerConfig};
use tokio::select;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::metadata::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fantail")]
#[command(bin_name = "fantail")]
#[command(version, about = "Tail files with checkpointed, restart-safe delivery")]
#[command(group(ArgGroup::new("selection").required(true).args(["glob", "root"])))]
struct Arguments {
    /// Glob pattern selecting the files to tail
    #[arg(long, env = "FANTAIL_GLOB")]
    glob: Option<String>,

    /// Directory to walk recursively for files to tail
    #[arg(long, env = "FANTAIL_ROOT")]
    root: Option<PathBuf>,

    /// Where checkpoint snapshots are persisted
    #[arg(
        long,
        env = "FANTAIL_SNAPSHOT_PATH",
        default_value = "/var/lib/fantail/checkpoints.json"
    )]
    snapshot_path: PathBuf,

    /// Milliseconds between checkpoint snapshots
    #[arg(long, env = "FANTAIL_SNAPSHOT_INTERVAL_MS", default_value = "30000")]
    snapshot_interval_ms: u64,

    /// Milliseconds between file discovery refreshes
    #[arg(long, env = "FANTAIL_REFRESH_INTERVAL_MS", default_value = "10000")]
    refresh_interval_ms: u64,

    /// Maximum bytes read from one file per pass
    #[arg(long, env = "FANTAIL_MAX_READ_BYTES", default_value = "10485760")]
    max_read_bytes: u64,

    /// Milliseconds to pause between passes
    #[arg(long, env = "FANTAIL_PAUSE_MS", default_value = "1000")]
    pause_ms: u64,
}

impl Arguments {
    fn build_config(&self) -> Result<TailerConfig, fantail::Error> {
        let selection = match (&self.glob, &self.root) {
            (Some(pattern), None) => Selection::Glob(pattern.clone()),
            (None, Some(root)) => Selection::Walk(root.clone()),
            _ => {
                return Err(fantail::Error::Config(
                    "exactly one of --glob or --root is required".to_string(),
                ));
            }
        };

        Ok(TailerConfig {
            selection,
            snapshot_path: self.snapshot_path.clone(),
            snapshot_interval: Duration::from_millis(self.snapshot_interval_ms),
            refresh_interval: Duration::from_millis(self.refresh_interval_ms),
            max_read_size: self.max_read_bytes,
            pause: Duration::from_millis(self.pause_ms),
        })
    }
}

fn main() -> ExitCode {
    let args = Arguments::parse();

    if let Err(e) = setup_logging() {
        eprintln!("ERROR: failed to setup logging: {}", e);
        return ExitCode::from(1);
    }

    match run_tailer(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Tailer exited with an error.");
            ExitCode::from(1)
        }
    }
}

#[tokio::main]
async fn run_tailer(args: Arguments) -> Result<(), BoxError> {
    let config = args.build_config()?;
    let tailer = Tailer::new(config)?;

    let cancel_token = CancellationToken::new();
    let mut join_set = JoinSet::new();
    {
        let token = cancel_token.clone();
        join_set.spawn(async move {
            tailer
                .follow(token, |path, line| {
                    println!("{}: {}", path.display(), line);
                    Ok(())
                })
                .await
        });
    }

    loop {
        select! {
            _ = signal_wait() => {
                info!("Shutdown signal received.");
                cancel_token.cancel();
            },
            joined = join_set.join_next() => {
                return match joined {
                    Some(Ok(result)) => result.map_err(Into::into),
                    Some(Err(e)) => Err(e.into()),
                    None => Ok(()),
                };
            },
        }
    }
}

fn setup_logging() -> Result<(), BoxError> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;

    // Skip color codes when not in a terminal
    let use_ansi = std::io::stdout().is_terminal();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(use_ansi)
        .compact()
        .init();

    Ok(())
}

async fn signal_wait() {
    let mut sig_term = sig(SignalKind::terminate());
    let mut sig_int = sig(SignalKind::interrupt());

    select! {
        _ = sig_term.recv() => {},
        _ = sig_int.recv() => {},
    }
}

fn sig(kind: SignalKind) -> tokio::signal::unix::Signal {
    signal(kind).unwrap()
}
