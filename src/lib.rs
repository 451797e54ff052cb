//! Multi-object tracking with ByteTrack.
//!
//! Detections arrive per frame as boxes with confidence scores (and,
//! optionally, keypoints). [`BYTETracker`] keeps a stable identity for
//! every object across frames: a constant-velocity Kalman filter predicts
//! each track forward, an IoU cost matrix is solved with a rectangular
//! linear-assignment solver, and a two-stage association first matches
//! high-confidence detections and then recovers tracks with the
//! low-confidence leftovers.
//!
//! ```
//! use bytetrack_mot::{BYTETracker, Detection, TrackerConfig};
//!
//! let mut tracker = BYTETracker::new(TrackerConfig::default()).unwrap();
//! let tracks = tracker.update(vec![Detection::new(10.0, 10.0, 50.0, 50.0, 0.9)], 0);
//! assert_eq!(tracks.len(), 1);
//! assert_eq!(tracks[0].track_id, 1);
//! ```

pub mod integration;
pub mod tracker;

pub use integration::{
    DetectionBuilder, DetectionSource, FrameOptions, IntoDetections, TrackerPipeline,
};
pub use tracker::{
    BYTETracker, Detection, DetectionBox, Keypoint, Rect, STrack, TrackError, TrackIdGenerator,
    TrackState, TrackerConfig,
};
