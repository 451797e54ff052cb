//! TrackerPipeline for combining detection with tracking.

use log::debug;

use crate::tracker::{BYTETracker, STrack, TrackError, TrackerConfig};

use super::DetectionSource;

/// Default cap on tracks reported per frame.
pub const DEFAULT_MAX_TRACKS: usize = 128;

/// Per-frame options for [`TrackerPipeline::process_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOptions {
    /// Report lost tracks missing for at most this many frames
    pub track_frame: u32,
    /// Drop all tracks before this frame is tracked, e.g. on a scene cut
    pub flush: bool,
    /// Truncate the output to this many tracks
    pub max_tracks: Option<usize>,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            track_frame: 0,
            flush: false,
            max_tracks: Some(DEFAULT_MAX_TRACKS),
        }
    }
}

/// A combined tracker that bundles detection inference with ByteTrack.
///
/// This struct provides a convenient way to run end-to-end tracking
/// by combining any `DetectionSource` with the `BYTETracker`.
pub struct TrackerPipeline<S: DetectionSource> {
    detector: S,
    tracker: BYTETracker<S::Detection>,
}

impl<S: DetectionSource> TrackerPipeline<S> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: S, config: TrackerConfig) -> Result<Self, TrackError> {
        Ok(Self::from_tracker(detector, BYTETracker::new(config)?))
    }

    /// Wrap an already configured tracker, e.g. one sharing its id generator.
    pub fn from_tracker(detector: S, tracker: BYTETracker<S::Detection>) -> Self {
        Self { detector, tracker }
    }

    /// Process a single frame and return the visible tracks.
    ///
    /// Detection errors are returned before the tracker is touched, so a
    /// failed frame neither advances the frame counter nor flushes.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        options: &FrameOptions,
    ) -> Result<Vec<STrack<S::Detection>>, S::Error> {
        let detections = self.detector.detect(input, width, height)?;

        if options.flush {
            self.tracker.flush();
        }
        let mut tracks = self.tracker.update(detections, options.track_frame);

        if let Some(max_tracks) = options.max_tracks.filter(|&max| tracks.len() > max) {
            debug!(
                "frame {}: reporting {} of {} tracks",
                self.tracker.frame_id(),
                max_tracks,
                tracks.len()
            );
            tracks.truncate(max_tracks);
        }
        Ok(tracks)
    }

    pub fn detector(&self) -> &S {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut S {
        &mut self.detector
    }

    pub fn tracker(&self) -> &BYTETracker<S::Detection> {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut BYTETracker<S::Detection> {
        &mut self.tracker
    }
}
