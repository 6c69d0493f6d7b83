use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use trackloop_core::{Frame, StreamConfig};

use crate::framing::{read_message, write_message, Tag};
use crate::state::SharedLinkState;
use crate::LinkState;

/// Stream parameters negotiated during the handshake. Stands in for the
/// media description of a full offer/answer exchange: the client needs the
/// dimensions to validate and reshape incoming frame buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamParams {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl From<&StreamConfig> for StreamParams {
    fn from(config: &StreamConfig) -> StreamParams {
        StreamParams {
            width: config.width,
            height: config.height,
            fps: config.fps,
        }
    }
}

/// An inbound message from the peer.
#[derive(Debug)]
pub enum LinkEvent {
    /// A raw frame buffer from the video channel.
    Frame(Vec<u8>),
    /// A short text message from the control channel.
    Control(String),
    /// The peer said goodbye or went away.
    Closed,
}

/// A connected duplex peer link, generic over the underlying byte stream
/// (TCP in production, an in-memory pair in tests).
///
/// Constructed through the handshake (`offer` on the streaming side,
/// `answer` on the receiving side), after which both halves can be used
/// independently from separate select branches or tasks.
pub struct PeerLink<S> {
    pub sender: LinkSender<S>,
    pub receiver: LinkReceiver<S>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> PeerLink<S> {
    /// Server side of the handshake: send the stream parameters, wait for
    /// the echo. Drives `Idle -> Negotiating -> Connected`.
    pub async fn offer(io: S, config: &StreamConfig) -> Result<PeerLink<S>> {
        let state = SharedLinkState::new();
        state.advance(LinkState::Negotiating)?;
        let (mut read_half, mut write_half) = tokio::io::split(io);

        let params = StreamParams::from(config);
        let payload = serde_json::to_vec(&params).context("failed to encode hello")?;
        write_message(&mut write_half, Tag::Hello, &payload)
            .await
            .context("failed to send hello")?;

        match read_message(&mut read_half).await? {
            Some((Tag::Welcome, payload)) => {
                let echo: StreamParams =
                    serde_json::from_slice(&payload).context("failed to decode welcome")?;
                if echo != params {
                    bail!("peer acknowledged different stream parameters: {echo:?}");
                }
            }
            Some((tag, _)) => bail!("expected welcome, got {tag:?}"),
            None => bail!("peer closed the link during negotiation"),
        }

        state.advance(LinkState::Connected)?;
        log::debug!("link established, streaming {params:?}");
        Ok(PeerLink::assemble(read_half, write_half, state))
    }

    /// Client side of the handshake: wait for the stream parameters, echo
    /// them back. Returns the negotiated parameters alongside the link.
    pub async fn answer(io: S) -> Result<(PeerLink<S>, StreamParams)> {
        let state = SharedLinkState::new();
        state.advance(LinkState::Negotiating)?;
        let (mut read_half, mut write_half) = tokio::io::split(io);

        let params = match read_message(&mut read_half).await? {
            Some((Tag::Hello, payload)) => {
                serde_json::from_slice::<StreamParams>(&payload).context("failed to decode hello")?
            }
            Some((tag, _)) => bail!("expected hello, got {tag:?}"),
            None => bail!("peer closed the link during negotiation"),
        };

        let payload = serde_json::to_vec(&params).context("failed to encode welcome")?;
        write_message(&mut write_half, Tag::Welcome, &payload)
            .await
            .context("failed to send welcome")?;

        state.advance(LinkState::Connected)?;
        log::debug!("link established, receiving {params:?}");
        Ok((PeerLink::assemble(read_half, write_half, state), params))
    }

    fn assemble(
        read_half: ReadHalf<S>,
        write_half: WriteHalf<S>,
        state: SharedLinkState,
    ) -> PeerLink<S> {
        PeerLink {
            sender: LinkSender {
                io: write_half,
                state: state.clone(),
            },
            receiver: LinkReceiver {
                io: read_half,
                state,
            },
        }
    }

    pub fn state(&self) -> LinkState {
        self.sender.state.get()
    }
}

/// The outbound half of a link.
pub struct LinkSender<S> {
    io: WriteHalf<S>,
    state: SharedLinkState,
}

impl<S: AsyncWrite> LinkSender<S> {
    /// Announce that media is about to flow (`Connected -> Streaming`).
    pub fn begin_streaming(&mut self) -> Result<()> {
        self.state.advance(LinkState::Streaming)
    }

    pub fn state(&self) -> LinkState {
        self.state.get()
    }

    /// Transmit one frame buffer as a discrete message on the video channel.
    pub async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        self.state.require(&[LinkState::Streaming])?;
        write_message(&mut self.io, Tag::Frame, frame.as_bytes())
            .await
            .context("failed to send frame")
    }

    /// Transmit a short text message on the control channel.
    pub async fn send_control(&mut self, msg: &str) -> Result<()> {
        self.state
            .require(&[LinkState::Connected, LinkState::Streaming])?;
        write_message(&mut self.io, Tag::Control, msg.as_bytes())
            .await
            .context("failed to send control message")
    }

    /// Say goodbye and close this side of the link.
    pub async fn close(&mut self) -> Result<()> {
        if self.state.get() == LinkState::Closed {
            return Ok(());
        }
        write_message(&mut self.io, Tag::Bye, b"")
            .await
            .context("failed to send goodbye")?;
        self.state.advance(LinkState::Closed)
    }
}

/// The inbound half of a link.
pub struct LinkReceiver<S> {
    io: ReadHalf<S>,
    state: SharedLinkState,
}

impl<S: AsyncRead> LinkReceiver<S> {
    /// Receive the next inbound message, preserving arrival order. Returns
    /// `LinkEvent::Closed` on a goodbye or a clean EOF.
    pub async fn recv(&mut self) -> Result<LinkEvent> {
        if self.state.get() == LinkState::Closed {
            return Ok(LinkEvent::Closed);
        }
        match read_message(&mut self.io).await? {
            Some((Tag::Frame, payload)) => {
                // The first media frame moves the receiving side to Streaming
                if self.state.get() == LinkState::Connected {
                    self.state.advance(LinkState::Streaming)?;
                }
                Ok(LinkEvent::Frame(payload))
            }
            Some((Tag::Control, payload)) => {
                Ok(LinkEvent::Control(String::from_utf8_lossy(&payload).into_owned()))
            }
            Some((Tag::Bye, _)) | None => {
                self.state.advance(LinkState::Closed)?;
                Ok(LinkEvent::Closed)
            }
            Some((tag @ (Tag::Hello | Tag::Welcome), _)) => {
                bail!("unexpected handshake message {tag:?} on an established link")
            }
        }
    }

    pub fn state(&self) -> LinkState {
        self.state.get()
    }
}

impl<S: AsyncRead + Send + 'static> LinkReceiver<S> {
    /// Move the receiver onto its own task and get events through a
    /// channel. A partially read message must never be abandoned, so
    /// session loops select on the returned channel rather than racing
    /// `recv` against other branches.
    pub fn spawn_event_loop(mut self) -> mpsc::UnboundedReceiver<Result<LinkEvent>> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                match self.recv().await {
                    Ok(LinkEvent::Closed) => {
                        event_tx.send(Ok(LinkEvent::Closed)).ok();
                        break;
                    }
                    Ok(event) => {
                        if event_tx.send(Ok(event)).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        event_tx.send(Err(err)).ok();
                        break;
                    }
                }
            }
        });
        event_rx
    }
}
