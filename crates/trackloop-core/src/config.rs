use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parameters of the generated video stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame rate in frames per second
    pub fps: u32,
    /// Radius of the rendered ball in pixels
    pub ball_radius: u32,
    /// Initial vertical velocity of the ball in pixels per tick
    pub initial_velocity_y: i32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            width: 640,
            height: 480,
            fps: 30,
            ball_radius: 20,
            initial_velocity_y: 10,
        }
    }
}

impl StreamConfig {
    /// The size of a raw frame buffer in bytes (3 bytes per pixel, BGR).
    pub fn frame_len(&self) -> usize {
        (self.width * self.height * 3) as usize
    }

    /// Time between two consecutive frames.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }
}
