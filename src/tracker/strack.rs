//! Single object track (STrack) for multi-object tracking.

use crate::tracker::kalman_filter::{KalmanFilter, KalmanState};
use crate::tracker::matching::{Detection, DetectionBox, Keypoint};
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Single object track.
///
/// Carries the last detection it was matched with as its payload, so
/// keypoints and any detector-specific fields survive tracking.
#[derive(Debug, Clone)]
pub struct STrack<D = Detection> {
    /// Unique track identifier, 0 until the track is activated
    pub track_id: u64,
    /// Current track state
    pub state: TrackState,
    /// Whether the track has been activated (confirmed)
    pub is_activated: bool,
    /// Whether a detection was associated in the latest frame
    pub is_updated: bool,
    /// Score of the latest matched detection
    pub score: f32,
    /// Last frame the track was touched
    pub frame_id: u32,
    /// Frame ID when track was started
    pub start_frame: u32,
    /// Consecutive updates since the last (re-)activation
    pub tracklet_len: u32,
    /// Motion estimate, `None` while the track is `New`
    pub kalman: Option<KalmanState>,
    detection: D,
    tlwh: Rect,
}

impl<D: DetectionBox> STrack<D> {
    /// Create a new STrack from a detection.
    pub fn new(detection: D) -> Self {
        Self {
            track_id: 0,
            state: TrackState::New,
            is_activated: false,
            is_updated: false,
            score: detection.score(),
            frame_id: 0,
            start_frame: 0,
            tracklet_len: 0,
            kalman: None,
            tlwh: detection.bbox(),
            detection,
        }
    }

    /// Current bounding box.
    ///
    /// The detection box while `New`, the motion estimate afterwards.
    pub fn rect(&self) -> Rect {
        self.tlwh
    }

    /// Current bounding box as (left, top, width, height).
    pub fn tlwh(&self) -> [f32; 4] {
        self.tlwh.to_tlwh()
    }

    /// Current bounding box as (left, top, right, bottom).
    pub fn tlbr(&self) -> [f32; 4] {
        self.tlwh.to_tlbr()
    }

    /// Last detection associated with this track.
    pub fn detection(&self) -> &D {
        &self.detection
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        self.detection.keypoints()
    }

    pub fn end_frame(&self) -> u32 {
        self.frame_id
    }

    /// Frames between activation and the last update.
    pub fn track_age(&self) -> u32 {
        self.frame_id.saturating_sub(self.start_frame)
    }

    /// Start tracking a new object: `New -> Tracked`.
    ///
    /// Only tracks born on the very first frame are confirmed right away;
    /// later ones wait for their next successful match.
    pub fn activate(&mut self, kalman_filter: &KalmanFilter, frame_id: u32, track_id: u64) {
        self.track_id = track_id;
        self.kalman = Some(kalman_filter.initiate(self.detection.bbox().to_xyah_f64()));
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        if frame_id == 1 {
            self.is_activated = true;
        }
        self.is_updated = true;
        self.frame_id = frame_id;
        self.start_frame = frame_id;
        self.refresh_geometry();
    }

    /// Bring a lost track back: `Lost -> Tracked`.
    ///
    /// `new_id` replaces the identity when the match should count as a
    /// different object.
    pub fn re_activate(
        &mut self,
        new_track: &STrack<D>,
        kalman_filter: &KalmanFilter,
        frame_id: u32,
        new_id: Option<u64>,
    ) {
        debug_assert_ne!(self.state, TrackState::Removed);
        self.correct(kalman_filter, new_track);
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.is_updated = true;
        self.frame_id = frame_id;

        if let Some(track_id) = new_id {
            self.track_id = track_id;
        }
    }

    /// Associate a detection with an active track.
    pub fn update(&mut self, new_track: &STrack<D>, kalman_filter: &KalmanFilter, frame_id: u32) {
        debug_assert_ne!(self.state, TrackState::Removed);
        self.frame_id = frame_id;
        self.tracklet_len += 1;
        self.correct(kalman_filter, new_track);
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.is_updated = true;
    }

    /// Advance the motion estimate by one frame.
    ///
    /// Tracks that are not `Tracked` lose their height velocity first so a
    /// drifting box does not keep growing or shrinking.
    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        if let Some(kalman) = &mut self.kalman {
            if self.state != TrackState::Tracked {
                kalman.mean[7] = 0.0;
            }
            *kalman = kalman_filter.predict(kalman);
        }
        self.is_updated = false;
        self.refresh_geometry();
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    pub fn multi_predict<'a>(
        stracks: impl IntoIterator<Item = &'a mut STrack<D>>,
        kalman_filter: &KalmanFilter,
    ) where
        D: 'a,
    {
        for strack in stracks {
            strack.predict(kalman_filter);
        }
    }

    fn correct(&mut self, kalman_filter: &KalmanFilter, new_track: &STrack<D>) {
        let measurement = new_track.tlwh.to_xyah_f64();
        self.kalman = self
            .kalman
            .as_ref()
            .map(|kalman| kalman_filter.update(kalman, measurement));
        self.detection = new_track.detection.clone();
        self.score = new_track.score;
        self.refresh_geometry();
    }

    fn refresh_geometry(&mut self) {
        self.tlwh = match (&self.kalman, self.state) {
            (Some(kalman), state) if state != TrackState::New => {
                let [x, y, w, h] = kalman.tlwh();
                Rect::new(x as f32, y as f32, w as f32, h as f32)
            }
            _ => self.detection.bbox(),
        };
    }
}
