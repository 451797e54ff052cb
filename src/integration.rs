//! Integration module for connecting object detection backends with ByteTrack.
//!
//! The detector itself stays outside this crate: implement
//! [`DetectionSource`] for a model and hand it to a [`TrackerPipeline`].

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::{DEFAULT_MAX_TRACKS, FrameOptions, TrackerPipeline};
