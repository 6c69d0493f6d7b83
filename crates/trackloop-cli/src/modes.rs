use std::net::SocketAddr;

use anyhow::Result;
use clap::ValueEnum;
use tokio::sync::broadcast;
use trackloop_core::StreamConfig;
use trackloop_link::{tcp_accept_one, tcp_connect, PeerLink};
use trackloop_session::{ClientSession, ServerSession};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Mode {
    /// Generate the bouncing ball and measure the estimation error
    Server,
    /// Receive frames, run detection and send the estimates back
    Client,
}

pub async fn run_server(
    config: StreamConfig,
    addr: SocketAddr,
    mut stop_rx: broadcast::Receiver<()>,
) -> Result<()> {
    // The accept can outlive the stop signal, so keep it cancellable
    let stream = tokio::select! {
        res = tcp_accept_one(addr) => res?,
        _ = stop_rx.recv() => return Ok(()),
    };
    let link = PeerLink::offer(stream, &config).await?;
    let session = ServerSession::new(config, link);
    let handle = session.handle();

    let mut task = tokio::spawn(session.run());
    tokio::select! {
        res = &mut task => return res?,
        _ = stop_rx.recv() => handle.stop(),
    }
    task.await?
}

pub async fn run_client(addr: SocketAddr, mut stop_rx: broadcast::Receiver<()>) -> Result<()> {
    let stream = tokio::select! {
        res = tcp_connect(addr) => res?,
        _ = stop_rx.recv() => return Ok(()),
    };
    let (link, params) = PeerLink::answer(stream).await?;
    tracing::info!(
        "receiving {}x{} stream at {} fps",
        params.width,
        params.height,
        params.fps
    );
    let session = ClientSession::new(link, params);
    let handle = session.handle();

    let mut task = tokio::spawn(session.run());
    tokio::select! {
        res = &mut task => return res?,
        _ = stop_rx.recv() => handle.stop(),
    }
    task.await?
}
