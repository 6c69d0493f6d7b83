use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use trackloop_core::StreamConfig;

mod modes;

#[derive(Debug, Parser)]
#[command(name = "trackloop-cli")]
struct Args {
    #[clap(long, short)]
    mode: modes::Mode,

    /// Address to listen on (server) or connect to (client)
    #[clap(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    #[clap(long, default_value = "640")]
    width: u32,

    #[clap(long, default_value = "480")]
    height: u32,

    #[clap(long, default_value = "30")]
    fps: u32,

    #[clap(long, default_value = "20")]
    ball_radius: u32,

    /// Initial vertical velocity in pixels per tick
    #[clap(long, default_value = "10")]
    velocity: i32,

    /// Stop after this many seconds instead of waiting for ctrl-c
    #[clap(long)]
    duration: Option<u64>,

    #[clap(long, default_value = "info")]
    log_level: String,

    #[clap(long, default_value = "auto")]
    log_file: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up log file
    let log_file_path = if args.log_file != "auto" {
        let path = PathBuf::from(args.log_file.clone());
        if path.exists() {
            eprintln!("Log file already exists: {}", path.display());
            std::process::exit(1);
        }
        path
    } else {
        let time = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let filename = format!("trackloop-{time}.log");
        let path = dirs::data_local_dir()
            .map(|p| p.join("trackloop").join(&filename))
            .unwrap_or_else(|| PathBuf::from(&filename));
        let dir = path.parent().unwrap();
        std::fs::create_dir_all(dir)
            .unwrap_or_else(|_| panic!("Failed to create log directory: {}", dir.display()));
        path
    };

    // Create log file appender
    let appender = tracing_appender::rolling::never(
        log_file_path.parent().unwrap(),
        log_file_path.file_name().unwrap(),
    );
    let (non_blocking_appender, _guard) = tracing_appender::non_blocking(appender);

    // Set up tracing
    let log_level = match tracing::Level::from_str(&args.log_level) {
        Ok(level) => level,
        Err(_) => {
            eprintln!("Invalid log level: {}", args.log_level);
            std::process::exit(1);
        }
    };
    let stdout_layer = fmt::Subscriber::builder()
        .with_max_level(log_level)
        .without_time()
        .finish();
    let logfile_layer = fmt::Layer::default()
        .json()
        .with_ansi(false)
        .with_writer(non_blocking_appender);
    tracing::subscriber::set_global_default(stdout_layer.with(logfile_layer))
        .expect("Unable to set global tracing subscriber");

    tracing::info!("Saving logs to {}", log_file_path.display());

    let config = StreamConfig {
        width: args.width,
        height: args.height,
        fps: args.fps,
        ball_radius: args.ball_radius,
        initial_velocity_y: args.velocity,
    };

    let (stop_tx, stop_rx) = broadcast::channel(1);
    let main_task = tokio::spawn(async move {
        let result = match args.mode {
            modes::Mode::Server => modes::run_server(config, args.addr, stop_rx).await,
            modes::Mode::Client => modes::run_client(args.addr, stop_rx).await,
        };
        if let Err(err) = result {
            tracing::error!("Session failed: {err:#}");
        }
    });

    match args.duration {
        Some(secs) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
            }
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
        }
    }

    tracing::info!("Shutting down");
    stop_tx.send(()).ok();
    main_task.await.expect("Session task failed");

    Ok(())
}
