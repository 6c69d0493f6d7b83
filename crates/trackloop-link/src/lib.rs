mod framing;
mod link;
mod state;

pub use link::{LinkEvent, LinkReceiver, LinkSender, PeerLink, StreamParams};
pub use state::LinkState;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::io::DuplexStream;
use tokio::net::{TcpListener, TcpStream};

/// Buffer size of the in-memory link pair: room for a full frame plus
/// control traffic.
const MEMORY_LINK_CAPACITY: usize = 2 * 1024 * 1024;

/// An in-process byte stream pair, for tests and single-process demos.
pub fn memory_pair() -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(MEMORY_LINK_CAPACITY)
}

/// Connect to a listening peer over TCP.
pub async fn tcp_connect(addr: SocketAddr) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)
        .await
        .context(format!("failed to connect to {addr}"))?;
    stream.set_nodelay(true).context("failed to set TCP_NODELAY")?;
    Ok(stream)
}

/// Bind and accept a single inbound peer over TCP.
pub async fn tcp_accept_one(addr: SocketAddr) -> Result<TcpStream> {
    let listener = TcpListener::bind(addr)
        .await
        .context(format!("failed to bind to {addr}"))?;
    log::info!("listening on {addr}");
    let (stream, peer) = listener
        .accept()
        .await
        .context("failed to accept connection")?;
    log::info!("accepted connection from {peer}");
    stream.set_nodelay(true).context("failed to set TCP_NODELAY")?;
    Ok(stream)
}
