//! Builder for creating Detection objects from various input formats.

use crate::tracker::{Detection, Keypoint, Rect};

/// Builder for creating `Detection` objects from various input formats.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    bbox: Rect,
    score: f32,
    keypoints: Vec<Keypoint>,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = Rect::from_tlbr(x1, y1, x2, y2);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::new(cx - w / 2.0, cy - h / 2.0, w, h);
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, left: f32, top: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::new(left, top, w, h);
        self
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Append one landmark.
    pub fn keypoint(mut self, x: f32, y: f32) -> Self {
        self.keypoints.push(Keypoint::new(x, y));
        self
    }

    /// Replace all landmarks.
    pub fn keypoints(mut self, keypoints: impl IntoIterator<Item = Keypoint>) -> Self {
        self.keypoints = keypoints.into_iter().collect();
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        Detection::from_rect(self.bbox, self.score).with_keypoints(self.keypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new()
            .tlbr(10.0, 20.0, 50.0, 80.0)
            .score(0.95)
            .build();

        assert_eq!(det.score, 0.95);
        assert_eq!(det.bbox.to_tlbr(), [10.0, 20.0, 50.0, 80.0]);
        assert!(det.keypoints.is_empty());
    }

    #[test]
    fn test_box_formats_agree() {
        let from_tlbr = DetectionBuilder::new().tlbr(10.0, 20.0, 50.0, 80.0).build();
        let from_xywh = DetectionBuilder::new().xywh(30.0, 50.0, 40.0, 60.0).build();
        let from_tlwh = DetectionBuilder::new().tlwh(10.0, 20.0, 40.0, 60.0).build();

        assert_eq!(from_tlbr.bbox, from_xywh.bbox);
        assert_eq!(from_tlbr.bbox, from_tlwh.bbox);
    }

    #[test]
    fn test_keypoints() {
        let det = DetectionBuilder::new()
            .tlwh(0.0, 0.0, 10.0, 10.0)
            .keypoint(1.0, 2.0)
            .keypoint(3.0, 4.0)
            .score(0.5)
            .build();
        assert_eq!(det.keypoints, vec![Keypoint::new(1.0, 2.0), Keypoint::new(3.0, 4.0)]);

        let replaced = DetectionBuilder::new()
            .keypoint(1.0, 2.0)
            .keypoints([Keypoint::with_score(5.0, 6.0, 0.9)])
            .build();
        assert_eq!(replaced.keypoints.len(), 1);
        assert_eq!(replaced.keypoints[0].score, Some(0.9));
    }
}
