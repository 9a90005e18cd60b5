use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

use modelgate::config::{GateConfig, LogFormat};
use modelgate::ratelimit::{ModelKey, RateLimiter};

/// Per-model sliding-window admission control.
#[derive(Debug, Parser)]
#[command(name = "modelgate", version, about)]
struct Cli {
    /// Path to a settings file (YAML)
    #[arg(short, long)]
    config: Option<String>,

    /// Log output format, overriding the settings file
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the limit that applies to each key
    Limits {
        /// Raw model keys
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Acquire admission for each key and report when each call got through
    Run {
        /// Concurrent acquisitions per key
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Raw model keys
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = GateConfig::load(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    init_tracing(&config);

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let table = config.limit_table()?;
    info!(
        default_limit = table.default_limit(),
        window_secs = table.window().as_secs(),
        "Limit table loaded"
    );

    let limiter = Arc::new(RateLimiter::new(table));

    match cli.command {
        Command::Limits { keys } => {
            for key in keys {
                let canonical = ModelKey::canonical(&key, limiter.table().suffixes());
                println!("{}\t{}\t{}", key, canonical, limiter.resolve_limit(&key));
            }
        }
        Command::Run { count, keys } => {
            tokio::select! {
                _ = run(limiter, keys, count) => {}
                _ = shutdown_signal() => {}
            }
        }
    }

    Ok(())
}

/// Acquire `count` admissions per key concurrently, printing each as it lands.
async fn run(limiter: Arc<RateLimiter>, keys: Vec<String>, count: usize) {
    let mut tasks = JoinSet::new();

    for key in keys {
        for n in 0..count {
            let limiter = limiter.clone();
            let key = key.clone();
            tasks.spawn(async move {
                limiter.acquire(&key).await;
                println!(
                    "{}\t{}\t#{}",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    key,
                    n + 1
                );
            });
        }
    }

    while tasks.join_next().await.is_some() {}
}

fn init_tracing(config: &GateConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, abandoning pending acquisitions");
        }
        _ = terminate => {
            info!("Received SIGTERM, abandoning pending acquisitions");
        }
    }
}
