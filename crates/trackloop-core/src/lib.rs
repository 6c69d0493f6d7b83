mod config;
mod error;
mod frame;
mod ground_truth;
mod sample;
mod wire;

pub use config::StreamConfig;
pub use error::ProtocolError;
pub use frame::Frame;
pub use ground_truth::{BallState, GroundTruth};
pub use sample::{compute_error, ErrorSample};
pub use wire::{encode_coordinates, parse_coordinates};

use serde::{Deserialize, Serialize};

/// A position in a frame, in pixels. The origin is the top-left corner, with
/// `y` growing downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelCoord {
    pub x: i32,
    pub y: i32,
}

impl PixelCoord {
    pub fn new(x: i32, y: i32) -> PixelCoord {
        PixelCoord { x, y }
    }
}
