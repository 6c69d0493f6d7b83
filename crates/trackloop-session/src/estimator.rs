use trackloop_core::{parse_coordinates, ErrorSample, GroundTruth, ProtocolError};

/// Turns incoming coordinate messages into error samples.
///
/// For each message: parse the estimate, snapshot the ground truth under its
/// lock, compute the Euclidean distance. A malformed message is a
/// [`ProtocolError`] and leaves the estimator ready for the next one.
#[derive(Debug)]
pub struct ErrorEstimator {
    ground_truth: GroundTruth,
}

impl ErrorEstimator {
    pub fn new(ground_truth: GroundTruth) -> ErrorEstimator {
        ErrorEstimator { ground_truth }
    }

    pub fn handle_message(&self, msg: &str) -> Result<ErrorSample, ProtocolError> {
        let estimated = parse_coordinates(msg)?;
        let actual = self.ground_truth.snapshot();
        Ok(ErrorSample::new(actual, estimated))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use trackloop_core::BallState;

    use super::*;

    fn estimator_at(x: i32, y: i32) -> ErrorEstimator {
        let truth = GroundTruth::new();
        truth.store(BallState {
            x,
            y,
            velocity_y: 10,
        });
        ErrorEstimator::new(truth)
    }

    #[test]
    fn test_distance_for_valid_message() {
        let estimator = estimator_at(1, 1);
        let sample = estimator.handle_message("Coordinates: 1, 2").unwrap();
        assert_abs_diff_eq!(sample.distance, 1.0);

        let estimator = estimator_at(0, 0);
        let sample = estimator.handle_message("Coordinates: 3, 4").unwrap();
        assert_abs_diff_eq!(sample.distance, 5.0);
    }

    #[test]
    fn test_malformed_message_is_recoverable() {
        let estimator = estimator_at(320, 240);

        assert!(estimator.handle_message("bad data").is_err());
        assert!(estimator.handle_message("Coordinates: 5").is_err());

        // The next valid message still goes through
        let sample = estimator.handle_message("Coordinates: 320, 240").unwrap();
        assert_abs_diff_eq!(sample.distance, 0.0);
    }

    #[test]
    fn test_snapshot_tracks_generator_updates() {
        let truth = GroundTruth::new();
        let estimator = ErrorEstimator::new(truth.clone());

        truth.store(BallState {
            x: 320,
            y: 100,
            velocity_y: 10,
        });
        let sample = estimator.handle_message("Coordinates: 320, 100").unwrap();
        assert_abs_diff_eq!(sample.distance, 0.0);

        truth.store(BallState {
            x: 320,
            y: 110,
            velocity_y: 10,
        });
        let sample = estimator.handle_message("Coordinates: 320, 100").unwrap();
        assert_abs_diff_eq!(sample.distance, 10.0);
    }
}
