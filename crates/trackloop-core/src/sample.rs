use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::{BallState, PixelCoord};

/// The instantaneous estimation error for one round-trip: the distance
/// between the generator's ground truth and the client's estimate at the
/// moment the estimate arrived. Derived, never persisted.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ErrorSample {
    pub actual: PixelCoord,
    pub estimated: PixelCoord,
    pub distance: f64,
}

impl ErrorSample {
    pub fn new(actual: BallState, estimated: PixelCoord) -> ErrorSample {
        let actual = actual.position();
        ErrorSample {
            actual,
            estimated,
            distance: compute_error(actual, estimated),
        }
    }
}

/// Euclidean distance between two pixel positions.
pub fn compute_error(actual: PixelCoord, estimated: PixelCoord) -> f64 {
    let actual = Vector2::new(actual.x as f64, actual.y as f64);
    let estimated = Vector2::new(estimated.x as f64, estimated.y as f64);
    (actual - estimated).norm()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_unit_offset() {
        let d = compute_error(PixelCoord::new(1, 1), PixelCoord::new(1, 2));
        assert_abs_diff_eq!(d, 1.0);
    }

    #[test]
    fn test_pythagorean_triple() {
        let d = compute_error(PixelCoord::new(0, 0), PixelCoord::new(3, 4));
        assert_abs_diff_eq!(d, 5.0);
    }

    #[test]
    fn test_zero_for_exact_estimate() {
        let d = compute_error(PixelCoord::new(320, 240), PixelCoord::new(320, 240));
        assert_abs_diff_eq!(d, 0.0);
    }

    #[test]
    fn test_sample_carries_both_positions() {
        let state = BallState {
            x: 320,
            y: 240,
            velocity_y: 10,
        };
        let sample = ErrorSample::new(state, PixelCoord::new(317, 236));
        assert_eq!(sample.actual, PixelCoord::new(320, 240));
        assert_eq!(sample.estimated, PixelCoord::new(317, 236));
        assert_abs_diff_eq!(sample.distance, 5.0);
    }
}
