//! # Padlink
//!
//! Stream gamepad input to a remote listener under operator-chosen names.
//!
//! The bridge samples the first gamepad it finds, renames every button and
//! axis through the current mapping, and sends one frame per tick. The mapping
//! is edited on the console and saved to a remote endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use padlink::config::{Config, LoggingConfig};
use padlink::controller::{GamepadDevice, SnapshotSource};
use padlink::mapping::{MappingEditor, MappingSlot};
use padlink::persistence::HttpMappingStore;
use padlink::sampler::{stop_channel, Sampler, SamplerExit, SamplerStats};
use padlink::transport::WebSocketTransport;
use padlink::ui::{ConsoleForm, Reply};

/// Log file name prefix inside `logging.log_dir`
const LOG_FILE_PREFIX: &str = "padlink.log";

/// Gamepad input mapping bridge
#[derive(Parser, Debug)]
#[command(name = "padlink", version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Event device to open instead of auto-detecting (e.g. /dev/input/event5)
    #[arg(short, long)]
    device: Option<String>,

    /// Listener WebSocket URL (e.g. ws://127.0.0.1:8000/ws)
    #[arg(short, long)]
    url: Option<String>,
}

/// How one device session ended.
enum Session {
    /// The device stopped answering; wait for another.
    DeviceLost,
    /// Ctrl+C or `quit`.
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let _log_guard = init_logging(&config.logging)?;

    info!("Padlink v{} starting...", env!("CARGO_PKG_VERSION"));

    let transport = WebSocketTransport::connect(
        &config.transport.url,
        config.transport.queue_capacity,
        Duration::from_millis(config.transport.reconnect_interval_ms),
    )
    .await
    .context("Failed to connect to listener")?;

    let store = HttpMappingStore::new(
        config.persistence.endpoint.clone(),
        Duration::from_millis(config.persistence.timeout_ms),
    )?;
    info!("Mappings will be saved to {}", store.endpoint());

    let mut editor = MappingEditor::new(MappingSlot::new(), store);
    let mut sampler = Sampler::new(
        editor.view(),
        transport,
        &config.sampler,
        config.transport.event_name.clone(),
    );
    info!("Sampler frame period: {:?}", sampler.frame_period());

    let mut form = ConsoleForm::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let retry_interval = Duration::from_millis(config.controller.reconnect_interval_ms);

    loop {
        let gamepad = tokio::select! {
            gamepad = GamepadDevice::wait_for(&config.controller.device_path, retry_interval) => gamepad,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        };

        editor.seed(gamepad.layout());
        form.reset(editor.layout());
        println!("{}", form.banner());

        sampler.bind(Box::new(gamepad));
        let (returned, session) = run_session(sampler, &editor, &mut form, &mut lines, &mut stdin_open).await?;
        sampler = returned;

        match session {
            Session::DeviceLost => {
                warn!("Gamepad lost, waiting for a new one");
            }
            Session::Shutdown => break,
        }
    }

    log_final_stats(sampler.stats());
    Ok(())
}

/// Runs the sampler for one bound device while serving the console form.
async fn run_session<R>(
    sampler: Sampler<WebSocketTransport>,
    editor: &MappingEditor<HttpMappingStore>,
    form: &mut ConsoleForm,
    lines: &mut tokio::io::Lines<R>,
    stdin_open: &mut bool,
) -> Result<(Sampler<WebSocketTransport>, Session)>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let (stop, signal) = stop_channel();
    let mut task = sampler.spawn(signal);

    loop {
        tokio::select! {
            joined = &mut task => {
                let (sampler, exit) = joined.context("Sampler task failed")?;
                let session = match exit {
                    SamplerExit::Idle => Session::DeviceLost,
                    SamplerExit::Stopped => Session::Shutdown,
                };
                return Ok((sampler, session));
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                stop.stop();
            }

            line = lines.next_line(), if *stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        // Ctrl+C must still stop the bridge while a save is in flight
                        let reply = unless_interrupted(form.handle(&line, editor), tokio::signal::ctrl_c()).await;
                        match reply {
                            Some(Reply::Silent) => {}
                            Some(Reply::Text(text)) => println!("{}", text),
                            Some(Reply::Quit) => {
                                info!("Quit requested, shutting down...");
                                stop.stop();
                            }
                            None => {
                                info!("Received Ctrl+C, shutting down...");
                                stop.stop();
                            }
                        }
                    }
                    Ok(None) => {
                        info!("Console input closed, mapping form disabled");
                        *stdin_open = false;
                    }
                    Err(e) => {
                        warn!("Failed to read console input: {}", e);
                        *stdin_open = false;
                    }
                }
            }
        }
    }
}

/// Awaits `work` unless `interrupt` resolves first, in which case `work` is dropped.
async fn unless_interrupted<T, I>(work: impl std::future::Future<Output = T>, interrupt: I) -> Option<T>
where
    I: std::future::Future,
{
    tokio::select! {
        out = work => Some(out),
        _ = interrupt => None,
    }
}

/// Loads the config file (or defaults) and applies command line overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(device) = &args.device {
        config.controller.device_path = device.clone();
    }
    if let Some(url) = &args.url {
        config.transport.url = url.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Sets up the tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level`. With `logging.log_dir` set, output goes
/// to a daily-rolling file and the returned guard must be held until exit.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    if logging.log_dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(&logging.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

fn log_final_stats(stats: SamplerStats) {
    info!(
        "Total ticks: {} ({} emitted, {} skipped, {} dropped)",
        stats.ticks, stats.emitted, stats.skipped, stats.dropped
    );
}
