//! Procedural road: a sliding window of segment y-coordinates around the camera
//!
//! Segments are appended ahead (decreasing y) as the camera advances and
//! evicted from the tail once they fall more than a view-height behind.

use std::collections::VecDeque;

/// Ordered window of road segment y-coordinates (tail first, front last)
#[derive(Debug, Clone, Default)]
pub struct RoadWindow {
    segment_length: f32,
    segments: VecDeque<f32>,
}

impl RoadWindow {
    pub fn new(segment_length: f32) -> Self {
        Self {
            segment_length,
            segments: VecDeque::new(),
        }
    }

    /// Grow ahead / trim behind so the window spans one view-height each
    /// side of `camera_y`
    pub fn ensure_coverage(&mut self, camera_y: f32, view_height: f32) {
        let len = self.segment_length;

        if self.segments.is_empty() {
            // Seed at the tile containing the rear edge of the view
            let seed = ((camera_y + view_height) / len).floor() * len;
            self.segments.push_back(seed);
        }

        // A camera that jumped backwards (reset) needs the tail refilled
        while let Some(&tail) = self.segments.front() {
            if tail + len > camera_y + view_height {
                break;
            }
            self.segments.push_front(tail + len);
        }

        while let Some(&front) = self.segments.back() {
            if front <= camera_y - view_height {
                break;
            }
            self.segments.push_back(front - len);
        }

        while let Some(&tail) = self.segments.front() {
            if tail <= camera_y + view_height {
                break;
            }
            self.segments.pop_front();
        }
    }

    /// Segment y-coordinates, tail (behind) to front (ahead)
    pub fn segments(&self) -> impl Iterator<Item = f32> + '_ {
        self.segments.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Furthest-ahead segment
    pub fn front(&self) -> Option<f32> {
        self.segments.back().copied()
    }

    /// Furthest-behind segment
    pub fn tail(&self) -> Option<f32> {
        self.segments.front().copied()
    }

    pub fn segment_length(&self) -> f32 {
        self.segment_length
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: f32 = 600.0;

    fn assert_covers(road: &RoadWindow, camera_y: f32) {
        let front = road.front().expect("road has segments");
        let tail = road.tail().expect("road has segments");
        assert!(front <= camera_y - VIEW, "front {front} short of {camera_y}");
        assert!(tail + road.segment_length() > camera_y + VIEW, "tail {tail} short");
    }

    #[test]
    fn test_initial_coverage() {
        let mut road = RoadWindow::new(80.0);
        road.ensure_coverage(0.0, VIEW);
        assert_covers(&road, 0.0);
        // Contiguous, strictly decreasing toward the front
        let segs: Vec<f32> = road.segments().collect();
        for pair in segs.windows(2) {
            assert_eq!(pair[0] - pair[1], 80.0);
        }
    }

    #[test]
    fn test_window_stabilizes_while_scrolling() {
        let mut road = RoadWindow::new(80.0);
        let mut camera_y = 0.0;
        for _ in 0..2000 {
            camera_y -= 7.3;
            road.ensure_coverage(camera_y, VIEW);
            assert_covers(&road, camera_y);
            assert!(road.len() <= 17, "window grew to {}", road.len());
        }
        assert!((15..=17).contains(&road.len()));
    }

    #[test]
    fn test_idempotent_for_same_camera() {
        let mut road = RoadWindow::new(80.0);
        road.ensure_coverage(-1234.0, VIEW);
        let before: Vec<f32> = road.segments().collect();
        road.ensure_coverage(-1234.0, VIEW);
        let after: Vec<f32> = road.segments().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_clear_restarts_window() {
        let mut road = RoadWindow::new(80.0);
        road.ensure_coverage(-5000.0, VIEW);
        road.clear();
        assert!(road.is_empty());
        road.ensure_coverage(0.0, VIEW);
        assert_covers(&road, 0.0);
    }
}
