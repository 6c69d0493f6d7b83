use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, mpsc};
use trackloop_core::{ErrorSample, GroundTruth, StreamConfig};
use trackloop_link::{LinkEvent, LinkSender, PeerLink};
use trackloop_simulator::BallSimulation;

use crate::{ControlMsg, ErrorEstimator, SessionHandle};

/// The streaming side of the loop: steps the ball simulation once per frame
/// period, pushes each rendered frame over the link, and measures the
/// estimation error of every coordinate message coming back. Error samples
/// are logged and published on a broadcast channel.
pub struct ServerSession<S> {
    config: StreamConfig,
    simulation: BallSimulation,
    estimator: ErrorEstimator,
    sender: LinkSender<S>,
    events: mpsc::UnboundedReceiver<Result<LinkEvent>>,
    control_tx: mpsc::UnboundedSender<ControlMsg>,
    control_rx: mpsc::UnboundedReceiver<ControlMsg>,
    error_tx: broadcast::Sender<ErrorSample>,
}

impl<S: AsyncRead + AsyncWrite + Send + 'static> ServerSession<S> {
    /// Create a session on an established (post-handshake) link.
    pub fn new(config: StreamConfig, link: PeerLink<S>) -> ServerSession<S> {
        let PeerLink { sender, receiver } = link;
        let events = receiver.spawn_event_loop();

        let ground_truth = GroundTruth::new();
        let simulation = BallSimulation::new(config.clone(), ground_truth.clone());
        let estimator = ErrorEstimator::new(ground_truth);

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (error_tx, _) = broadcast::channel(64);

        ServerSession {
            config,
            simulation,
            estimator,
            sender,
            events,
            control_tx,
            control_rx,
            error_tx,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.control_tx.clone())
    }

    /// Subscribe to the error samples produced by the estimator.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<ErrorSample> {
        self.error_tx.subscribe()
    }

    pub async fn run(mut self) -> Result<()> {
        self.sender.begin_streaming()?;
        self.stream_loop().await;
        self.sender.close().await.ok();
        log::info!(
            "server session ended after {} frames",
            self.simulation.tick()
        );
        Ok(())
    }

    /// Runs until stopped, the peer goes away, or the transport fails.
    /// Transport errors are logged and end the session; they are not
    /// retried here.
    async fn stream_loop(&mut self) {
        let mut frame_interval = tokio::time::interval(self.config.frame_period());
        loop {
            tokio::select! {
                Some(msg) = self.control_rx.recv() => match msg {
                    ControlMsg::Stop => break,
                },
                _ = frame_interval.tick() => {
                    let frame = self.simulation.step();
                    if let Err(err) = self.sender.send_frame(&frame).await {
                        log::error!("failed to stream frame: {err:#}");
                        break;
                    }
                }
                event = self.events.recv() => match event {
                    Some(Ok(LinkEvent::Control(msg))) => self.handle_coordinates(&msg),
                    Some(Ok(LinkEvent::Frame(_))) => {
                        log::warn!("unexpected video payload from the client");
                    }
                    Some(Ok(LinkEvent::Closed)) | None => {
                        log::info!("peer closed the link");
                        break;
                    }
                    Some(Err(err)) => {
                        log::error!("transport failure: {err:#}");
                        break;
                    }
                }
            }
        }
    }

    fn handle_coordinates(&mut self, msg: &str) {
        log::debug!("received coordinate message: {msg:?}");
        match self.estimator.handle_message(msg) {
            Ok(sample) => {
                log::info!(
                    "estimation error: {:.2} px (actual ({}, {}), estimated ({}, {}))",
                    sample.distance,
                    sample.actual.x,
                    sample.actual.y,
                    sample.estimated.x,
                    sample.estimated.y,
                );
                self.error_tx.send(sample).ok();
            }
            Err(err) => log::warn!("discarding control message: {err}"),
        }
    }
}
