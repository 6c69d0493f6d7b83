use std::collections::VecDeque;

use trackloop_core::{Frame, PixelCoord};

/// Grayscale values strictly above this are foreground. The stream renders
/// a bright ball on a pure black background, so anything non-black counts.
const LUMA_THRESHOLD: u8 = 1;

/// Locate bright blobs in a frame.
///
/// Thresholds the frame to a binary mask, labels 4-connected components and
/// returns the centroid of each component's bounding box, in row-major
/// discovery order. Deterministic for a given frame; an empty result is
/// permitted (no bright pixels).
pub fn locate_blobs(frame: &Frame) -> Vec<PixelCoord> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;

    let mask: Vec<bool> = (0..width * height)
        .map(|i| {
            let bgr = frame.bgr_at((i % width) as u32, (i / width) as u32);
            luma(bgr) > LUMA_THRESHOLD
        })
        .collect();

    let mut visited = vec![false; width * height];
    let mut centroids = Vec::new();

    for start in 0..width * height {
        if !mask[start] || visited[start] {
            continue;
        }
        centroids.push(grow_component(start, &mask, &mut visited, width, height));
    }

    centroids
}

/// Integer BT.601 luma approximation of a BGR sample.
fn luma([b, g, r]: [u8; 3]) -> u8 {
    ((29 * b as u32 + 150 * g as u32 + 77 * r as u32) >> 8) as u8
}

/// Flood-fill one connected component and return the centroid of its
/// bounding box.
fn grow_component(
    start: usize,
    mask: &[bool],
    visited: &mut [bool],
    width: usize,
    height: usize,
) -> PixelCoord {
    let mut queue = VecDeque::new();
    queue.push_back(start);
    visited[start] = true;

    let (mut min_x, mut max_x) = (width, 0usize);
    let (mut min_y, mut max_y) = (height, 0usize);

    while let Some(idx) = queue.pop_front() {
        let x = idx % width;
        let y = idx / width;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        for (dx, dy) in [(0i32, 1i32), (0, -1), (1, 0), (-1, 0)] {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                continue;
            }
            let nidx = ny as usize * width + nx as usize;
            if mask[nidx] && !visited[nidx] {
                visited[nidx] = true;
                queue.push_back(nidx);
            }
        }
    }

    // Bounding-box centroid, `x + w / 2` in integer arithmetic
    let w = max_x - min_x + 1;
    let h = max_y - min_y + 1;
    PixelCoord::new((min_x + w / 2) as i32, (min_y + h / 2) as i32)
}

#[cfg(test)]
mod tests {
    use trackloop_core::StreamConfig;
    use trackloop_simulator::draw_ball;

    use super::*;

    #[test]
    fn test_empty_frame_has_no_blobs() {
        let frame = Frame::black(64, 48);
        assert!(locate_blobs(&frame).is_empty());
    }

    #[test]
    fn test_finds_rendered_ball_center() {
        let config = StreamConfig::default();
        let frame = draw_ball(&config, 320, 240);
        let blobs = locate_blobs(&frame);
        assert_eq!(blobs, vec![PixelCoord::new(320, 240)]);
    }

    #[test]
    fn test_tracks_ball_across_positions() {
        let config = StreamConfig::default();
        for &(x, y) in &[(320, 20), (320, 250), (320, 460), (100, 100)] {
            let frame = draw_ball(&config, x, y);
            let blobs = locate_blobs(&frame);
            assert_eq!(blobs, vec![PixelCoord::new(x, y)], "ball at ({x}, {y})");
        }
    }

    #[test]
    fn test_multiple_blobs_in_scan_order() {
        let mut frame = Frame::black(32, 32);
        for (x, y) in [(4, 4), (4, 5), (5, 4), (5, 5)] {
            frame.put_bgr(x, y, [255, 255, 255]);
        }
        frame.put_bgr(20, 20, [255, 255, 255]);

        let blobs = locate_blobs(&frame);
        assert_eq!(
            blobs,
            vec![PixelCoord::new(5, 5), PixelCoord::new(20, 20)]
        );
    }

    #[test]
    fn test_dim_pixels_are_background() {
        let mut frame = Frame::black(8, 8);
        frame.put_bgr(3, 3, [1, 1, 1]);
        assert!(locate_blobs(&frame).is_empty());
    }
}
