use trackloop_core::{Frame, StreamConfig};

/// Ball color in BGR order (red).
const BALL_COLOR: [u8; 3] = [0, 0, 255];

/// Render an all-black frame with a filled circle of the configured radius
/// at `(cx, cy)`. Pixels falling outside the image are skipped.
pub fn draw_ball(config: &StreamConfig, cx: i32, cy: i32) -> Frame {
    let mut frame = Frame::black(config.width, config.height);
    let radius = config.ball_radius as i32;
    let r_sq = radius * radius;
    for dy in -radius..=radius {
        // Horizontal half-span of the disk at this row
        let span = ((r_sq - dy * dy) as f64).sqrt() as i32;
        for dx in -span..=span {
            frame.put_bgr(cx + dx, cy + dy, BALL_COLOR);
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StreamConfig {
        StreamConfig::default()
    }

    #[test]
    fn test_center_is_lit_background_is_black() {
        let frame = draw_ball(&config(), 320, 240);
        assert_eq!(frame.bgr_at(320, 240), BALL_COLOR);
        assert_eq!(frame.bgr_at(0, 0), [0, 0, 0]);
        assert_eq!(frame.bgr_at(320, 240 + 21), [0, 0, 0]);
    }

    #[test]
    fn test_disk_extent() {
        let frame = draw_ball(&config(), 320, 240);
        // Points on the vertical and horizontal diameters are inside
        assert_eq!(frame.bgr_at(320, 220), BALL_COLOR);
        assert_eq!(frame.bgr_at(320, 260), BALL_COLOR);
        assert_eq!(frame.bgr_at(300, 240), BALL_COLOR);
        assert_eq!(frame.bgr_at(340, 240), BALL_COLOR);
    }

    #[test]
    fn test_ball_at_edge_is_cropped_not_panicking() {
        let frame = draw_ball(&config(), 0, 0);
        assert_eq!(frame.bgr_at(0, 0), BALL_COLOR);
    }
}
