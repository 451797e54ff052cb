//! Matching utilities for multi-object tracking.

use ndarray::Array2;

use crate::tracker::error::TrackError;
use crate::tracker::lapjv;
use crate::tracker::rect::{Rect, iou_batch};

/// A landmark attached to a detection, e.g. a facial point or a body joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Per-point confidence, when the detector reports one
    pub score: Option<f32>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, score: None }
    }

    pub fn with_score(x: f32, y: f32, score: f32) -> Self {
        Self {
            x,
            y,
            score: Some(score),
        }
    }
}

/// What the tracker needs to know about a detection.
///
/// Implement this for a detector's own output type to track it directly;
/// the value is carried through as the track payload and handed back in
/// the tracker output.
pub trait DetectionBox: Clone {
    /// Bounding box of the detection.
    fn bbox(&self) -> Rect;

    /// Detection confidence score.
    fn score(&self) -> f32;

    /// Ordered landmarks, empty when the detector has none.
    fn keypoints(&self) -> &[Keypoint] {
        &[]
    }
}

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Detection {
    /// Bounding box, built from TLBR corners and stored as TLWH
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
    /// Optional landmarks, in detector order
    pub keypoints: Vec<Keypoint>,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self::from_rect(Rect::from_tlbr(x1, y1, x2, y2), score)
    }

    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self {
            bbox,
            score,
            keypoints: Vec::new(),
        }
    }

    pub fn with_keypoints(mut self, keypoints: Vec<Keypoint>) -> Self {
        self.keypoints = keypoints;
        self
    }
}

impl DetectionBox for Detection {
    fn bbox(&self) -> Rect {
        self.bbox
    }

    fn score(&self) -> f32 {
        self.score
    }

    fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }
}

/// Compute IoU distance matrix (`1 - IoU`) between tracks and detections.
///
/// The shape is always `(tracks, detections)`, also when one side is
/// empty, so callers can still enumerate every row or column as unmatched.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    iou_batch(track_boxes, det_boxes).mapv_into(|iou| 1.0 - iou)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Gated minimum-cost matching of a `(tracks, detections)` cost matrix.
///
/// A pair is only matched when its cost stays under `thresh`; this is
/// encoded through the dummy padding of [`lapjv::solve_extended`] rather
/// than by filtering afterwards, so a cheap pair never loses its partner to
/// an expensive one. All index lists are ascending.
pub fn linear_assignment(
    cost_matrix: &Array2<f32>,
    thresh: f32,
) -> Result<AssignmentResult, TrackError> {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return Ok(AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        });
    }

    let cost = cost_matrix.mapv(f64::from);
    let solution = lapjv::solve_extended(cost.view(), Some(f64::from(thresh)))?;

    let unmatched_tracks = solution
        .row_to_col
        .iter()
        .enumerate()
        .filter_map(|(i, col)| col.is_none().then_some(i))
        .collect();
    let unmatched_detections = solution
        .col_to_row
        .iter()
        .enumerate()
        .filter_map(|(j, row)| row.is_none().then_some(j))
        .collect();

    Ok(AssignmentResult {
        matches: solution.pairs().collect(),
        unmatched_tracks,
        unmatched_detections,
    })
}
