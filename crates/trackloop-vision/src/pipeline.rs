use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use trackloop_core::PixelCoord;

use crate::{locate_blobs, FrameQueue};

/// The client-side detection stage.
///
/// A single worker drains the hand-off queue in arrival order, locates the
/// ball in each frame and emits the first centroid. Frames in which no blob
/// is found are skipped (the ball is never expected to be fully occluded,
/// but an empty result must not index out of bounds). Coordinates leave in
/// detection order.
pub struct DetectionPipeline {
    queue: FrameQueue,
    coord_tx: mpsc::UnboundedSender<PixelCoord>,
}

impl DetectionPipeline {
    /// Spawn the detection worker on the given queue.
    pub fn spawn(queue: FrameQueue) -> DetectionHandle {
        let (coord_tx, coord_rx) = mpsc::unbounded_channel();
        let pipeline = DetectionPipeline { queue, coord_tx };
        let task = tokio::spawn(pipeline.run());
        DetectionHandle { coord_rx, task }
    }

    async fn run(self) {
        while let Some(frame) = self.queue.pop().await {
            let backlog = self.queue.len();
            if backlog > 0 {
                log::debug!("detection backlog: {backlog} frames");
            }
            match locate_blobs(&frame).first() {
                Some(&coord) => {
                    if self.coord_tx.send(coord).is_err() {
                        // Receiver gone, the session is shutting down
                        break;
                    }
                }
                None => log::warn!("no blob located in frame, skipping"),
            }
        }
        log::debug!("detection worker stopped");
    }
}

/// Handle to a running detection worker.
pub struct DetectionHandle {
    coord_rx: mpsc::UnboundedReceiver<PixelCoord>,
    task: JoinHandle<()>,
}

impl DetectionHandle {
    /// Receive the next located coordinate. Returns `None` when the worker
    /// has stopped.
    pub async fn recv(&mut self) -> Option<PixelCoord> {
        self.coord_rx.recv().await
    }

    /// Wait for the worker to finish. Close the queue first.
    pub async fn join(self) {
        self.task.await.ok();
    }
}
