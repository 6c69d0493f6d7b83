use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use trackloop_core::{encode_coordinates, Frame};
use trackloop_link::{LinkEvent, LinkSender, PeerLink, StreamParams};
use trackloop_vision::{DetectionHandle, DetectionPipeline, FrameQueue};

use crate::{ControlMsg, SessionHandle};

/// Frames the detection worker may fall behind by before the oldest are
/// dropped (~a quarter second at 30 fps).
const FRAME_QUEUE_CAPACITY: usize = 8;

/// The receiving side of the loop: validates incoming frame buffers against
/// the negotiated dimensions, hands them to the detection pipeline through
/// the bounded queue, and returns each located centroid to the server as a
/// coordinate message.
pub struct ClientSession<S> {
    params: StreamParams,
    sender: LinkSender<S>,
    events: mpsc::UnboundedReceiver<Result<LinkEvent>>,
    queue: FrameQueue,
    detection: DetectionHandle,
    control_tx: mpsc::UnboundedSender<ControlMsg>,
    control_rx: mpsc::UnboundedReceiver<ControlMsg>,
    frames_received: u64,
}

impl<S: AsyncRead + AsyncWrite + Send + 'static> ClientSession<S> {
    /// Create a session on an established (post-handshake) link with the
    /// parameters negotiated during the handshake.
    pub fn new(link: PeerLink<S>, params: StreamParams) -> ClientSession<S> {
        let PeerLink { sender, receiver } = link;
        let events = receiver.spawn_event_loop();

        let queue = FrameQueue::new(FRAME_QUEUE_CAPACITY);
        let detection = DetectionPipeline::spawn(queue.clone());

        let (control_tx, control_rx) = mpsc::unbounded_channel();

        ClientSession {
            params,
            sender,
            events,
            queue,
            detection,
            control_tx,
            control_rx,
            frames_received: 0,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.control_tx.clone())
    }

    pub async fn run(mut self) -> Result<()> {
        self.stream_loop().await;

        // Teardown: stop feeding the worker, let it drain, then say goodbye
        self.queue.close();
        self.detection.join().await;
        self.sender.close().await.ok();
        log::info!(
            "client session ended after {} frames ({} dropped)",
            self.frames_received,
            self.queue.dropped()
        );
        Ok(())
    }

    /// Runs until stopped, the peer goes away, or the transport fails.
    /// Transport errors are logged and end the session; they are not
    /// retried here.
    async fn stream_loop(&mut self) {
        loop {
            tokio::select! {
                Some(msg) = self.control_rx.recv() => match msg {
                    ControlMsg::Stop => break,
                },
                event = self.events.recv() => match event {
                    Some(Ok(LinkEvent::Frame(bytes))) => self.enqueue_frame(bytes),
                    Some(Ok(LinkEvent::Control(msg))) => {
                        log::warn!("unexpected control message from the server: {msg:?}");
                    }
                    Some(Ok(LinkEvent::Closed)) | None => {
                        log::info!("peer closed the link");
                        break;
                    }
                    Some(Err(err)) => {
                        log::error!("transport failure: {err:#}");
                        break;
                    }
                },
                Some(coord) = self.detection.recv() => {
                    let msg = encode_coordinates(coord);
                    log::debug!("sending estimate: {msg:?}");
                    if let Err(err) = self.sender.send_control(&msg).await {
                        log::error!("failed to send estimate: {err:#}");
                        break;
                    }
                }
            }
        }
    }

    fn enqueue_frame(&mut self, bytes: Vec<u8>) {
        self.frames_received += 1;
        match Frame::from_bytes(bytes, self.params.width, self.params.height) {
            Ok(frame) => {
                if !self.queue.push(frame) {
                    log::debug!(
                        "detection backlog full, dropped oldest frame (depth {}, dropped {})",
                        self.queue.len(),
                        self.queue.dropped()
                    );
                }
            }
            Err(err) => log::warn!("discarding frame: {err}"),
        }
    }
}
