/// Cadence Host - background playback over a line-oriented JSON interface
use anyhow::Context;
use cadence_host::{config::HostConfig, session, SimulatedEngine};
use cadence_playback::{engine_channel, PlaybackService};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence-host")]
#[command(about = "Background playback coordinator speaking JSON lines on stdin/stdout", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./cadence.toml when present)
    #[arg(short, long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the state broadcast period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays a clean event stream
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_host=info,cadence_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = HostConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(interval_ms) = cli.interval_ms {
        config.playback.broadcast_interval_ms = interval_ms;
    }
    config.validate()?;

    tracing::info!("Starting Cadence host");
    tracing::info!("Broadcast interval: {} ms", config.playback.broadcast_interval_ms);
    tracing::info!("Simulated track length: {} ms", config.engine.track_ms);

    let (events_tx, events_rx) = engine_channel();
    let engine = SimulatedEngine::new(&config.engine, events_tx).context("starting engine")?;
    let mut service = PlaybackService::start(Box::new(engine), events_rx, &config.playback)?;

    let printer = session::spawn_event_printer(service.subscribe(), io::stdout())?;

    let stats = session::run_commands(service.coordinator(), io::stdin().lock(), io::stdout())?;
    tracing::info!(
        "Input closed after {} accepted and {} rejected commands",
        stats.accepted,
        stats.rejected
    );

    service.shutdown();
    // Dropping the service drops the event hub, which ends the printer
    drop(service);
    if printer.join().is_err() {
        tracing::error!("Event printer panicked");
    }

    Ok(())
}
