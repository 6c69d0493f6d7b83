mod locator;
mod pipeline;
mod queue;

pub use locator::locate_blobs;
pub use pipeline::{DetectionHandle, DetectionPipeline};
pub use queue::FrameQueue;
