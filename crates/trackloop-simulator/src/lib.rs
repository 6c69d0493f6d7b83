mod render;

pub use render::draw_ball;

use trackloop_core::{BallState, Frame, GroundTruth, StreamConfig};

/// Deterministic bouncing-ball simulation.
///
/// The ball starts at the frame center and bounces elastically off the top
/// and bottom edges; x is constant by design. `step` advances the state by
/// one tick and renders a fresh frame -- pacing between ticks belongs to the
/// caller (the server session runs one step per frame period).
pub struct BallSimulation {
    config: StreamConfig,
    ground_truth: GroundTruth,
    tick: u64,
    center_x: i32,
    center_y: i32,
    velocity_y: i32,
}

impl BallSimulation {
    /// Create a new simulation publishing its state to `ground_truth`.
    pub fn new(config: StreamConfig, ground_truth: GroundTruth) -> BallSimulation {
        let center_x = (config.width / 2) as i32;
        let center_y = (config.height / 2) as i32;
        let velocity_y = config.initial_velocity_y;
        ground_truth.store(BallState {
            x: center_x,
            y: center_y,
            velocity_y,
        });
        BallSimulation {
            config,
            ground_truth,
            tick: 0,
            center_x,
            center_y,
            velocity_y,
        }
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn state(&self) -> BallState {
        BallState {
            x: self.center_x,
            y: self.center_y,
            velocity_y: self.velocity_y,
        }
    }

    /// Advance the ball by one tick, publish the new ground truth and render
    /// the frame.
    ///
    /// After reflecting off an edge the center is clamped into
    /// `[radius, height - radius]`, so the rendered center never leaves the
    /// image and a ball with `radius >= height / 2` cannot oscillate.
    pub fn step(&mut self) -> Frame {
        let radius = self.config.ball_radius as i32;
        let min_y = radius;
        let max_y = self.config.height as i32 - radius;

        self.center_y += self.velocity_y;
        if max_y < min_y {
            // Degenerate: the ball straddles both bounds. Pin it.
            self.center_y = (self.config.height / 2) as i32;
            self.velocity_y = 0;
        } else if self.center_y < min_y || self.center_y > max_y {
            self.velocity_y = -self.velocity_y;
            self.center_y = self.center_y.clamp(min_y, max_y);
            log::debug!(
                "tick {}: ball bounced, center_y={} velocity_y={}",
                self.tick,
                self.center_y,
                self.velocity_y
            );
        }

        self.tick += 1;
        self.ground_truth.store(self.state());

        draw_ball(&self.config, self.center_x, self.center_y)
    }
}
