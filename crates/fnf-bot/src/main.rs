// fnfbot — autoplay bridge for rhythm-game state streams.
//
// `serve` listens for the game and answers each snapshot with a full action
// line; `connect` dials the game's socket server and sends
// latency-compensated input events.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use fnf_bot::config::BotConfig;
use fnf_bot::observer::{SnapshotObserver, StateTraceObserver};
use fnf_bot::session;

#[derive(Parser, Debug)]
#[command(name = "fnfbot", about = "Autoplay bridge for Friday Night Funkin' state streams")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Estimated one-way latency (ms) subtracted from scheduled press times.
    #[arg(long, default_value_t = 30.0)]
    latency_comp_ms: f64,

    /// Seconds to wait per read attempt before retrying.
    #[arg(long, default_value_t = 5)]
    read_timeout_secs: u64,

    /// Log per-note decisions.
    #[arg(long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Listen for the game and answer snapshots with action lines.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: String,
    },
    /// Connect to the game's socket server and send input events.
    Connect {
        #[arg(long, default_value = "localhost")]
        host: String,

        #[arg(long, default_value_t = 8765)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if args.verbose { "debug" } else { "info" })
            }),
        )
        .init();

    let config = BotConfig {
        read_timeout: Duration::from_secs(args.read_timeout_secs),
        latency_compensation_ms: args.latency_comp_ms,
    };

    match args.command {
        Command::Serve { bind } => serve(&bind, &config).await,
        Command::Connect { host, port } => connect(&host, port, &config).await,
    }
}

async fn serve(bind: &str, config: &BotConfig) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("listening on {bind}");

    // One client at a time; sessions share nothing, so a finished or failed
    // session simply frees the line for the next accept.
    loop {
        let (stream, peer) = listener.accept().await?;
        stream.set_nodelay(true)?;
        info!(%peer, "client connected");
        match session::run_immediate(stream, config, observers()).await {
            Ok(()) => info!(%peer, "session ended"),
            Err(e) => warn!(%peer, "session failed: {e}"),
        }
    }
}

async fn connect(host: &str, port: u16, config: &BotConfig) -> Result<()> {
    let addr = format!("{host}:{port}");
    info!("connecting to {addr}");
    let stream = TcpStream::connect(&addr).await?;
    stream.set_nodelay(true)?;
    info!("connected");

    session::run_deferred(stream, config, observers()).await?;
    Ok(())
}

fn observers() -> Vec<Box<dyn SnapshotObserver>> {
    vec![Box::new(StateTraceObserver::default())]
}
