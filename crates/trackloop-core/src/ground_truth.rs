use std::sync::{Arc, Mutex};

use crate::PixelCoord;

/// The authoritative ball state maintained by the generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BallState {
    pub x: i32,
    pub y: i32,
    pub velocity_y: i32,
}

impl BallState {
    pub fn position(&self) -> PixelCoord {
        PixelCoord::new(self.x, self.y)
    }
}

/// Shared handle to the ground-truth ball state. The generator writes it once
/// per tick, the error estimator reads it once per round-trip. All access
/// goes through a single mutex; the critical section covers only the three
/// scalar fields, never I/O or detection.
#[derive(Clone, Debug, Default)]
pub struct GroundTruth {
    inner: Arc<Mutex<BallState>>,
}

impl GroundTruth {
    pub fn new() -> GroundTruth {
        GroundTruth::default()
    }

    /// Replace the ball state. Called by the generator each tick.
    pub fn store(&self, state: BallState) {
        *self.inner.lock().unwrap() = state;
    }

    /// Read a consistent copy of the ball state.
    pub fn snapshot(&self) -> BallState {
        *self.inner.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_snapshot() {
        let truth = GroundTruth::new();
        assert_eq!(truth.snapshot(), BallState::default());

        let state = BallState {
            x: 320,
            y: 250,
            velocity_y: 10,
        };
        truth.store(state);
        assert_eq!(truth.snapshot(), state);
    }

    /// Concurrent writes and reads must never produce a torn state: every
    /// snapshot is one of the values a writer actually stored.
    #[test]
    fn test_no_torn_reads_under_contention() {
        let truth = GroundTruth::new();
        truth.store(BallState {
            x: 0,
            y: 0,
            velocity_y: 10,
        });

        let writer_truth = truth.clone();
        let writer = std::thread::spawn(move || {
            for y in 0..5000 {
                writer_truth.store(BallState {
                    x: y,
                    y,
                    velocity_y: 10,
                });
            }
        });

        for _ in 0..5000 {
            let state = truth.snapshot();
            // x always mirrors y in this test, a torn read would break it
            assert_eq!(state.x, state.y);
            assert_eq!(state.velocity_y, 10);
        }

        writer.join().unwrap();
    }
}
