mod byte_tracker;
mod error;
mod kalman_filter;
pub mod lapjv;
pub mod matching;
mod rect;
mod strack;
mod track_id;
mod track_state;

pub use byte_tracker::{BYTETracker, TrackerConfig};
pub use error::TrackError;
pub use kalman_filter::{KalmanFilter, KalmanState};
pub use matching::{Detection, DetectionBox, Keypoint};
pub use rect::{Rect, iou_batch};
pub use strack::STrack;
pub use track_id::TrackIdGenerator;
pub use track_state::TrackState;
