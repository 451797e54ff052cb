//! Main BYTETracker algorithm implementation.

use std::collections::{BTreeMap, HashSet};

use log::{debug, trace};
use ndarray::Array2;

use crate::tracker::error::TrackError;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult, Detection, DetectionBox};
use crate::tracker::rect::Rect;
use crate::tracker::strack::STrack;
use crate::tracker::track_id::TrackIdGenerator;
use crate::tracker::track_state::TrackState;

/// Gate for matching remaining tracks with low-score detections.
const LOW_SCORE_MATCH_THRESH: f32 = 0.5;
/// Gate for matching unconfirmed tracks.
const UNCONFIRMED_MATCH_THRESH: f32 = 0.7;
/// Tracked/lost pairs closer than this IoU distance are duplicates.
const DUPLICATE_IOU_DISTANCE: f32 = 0.15;

/// Configuration for the BYTETracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Splits detections into high (`>=`) and low score sets
    pub track_thresh: f32,
    /// Minimum score for an unmatched detection to start a new track
    pub high_thresh: f32,
    /// IoU distance gate of the first association
    pub match_thresh: f32,
    /// Frames a lost track is kept at 30 fps
    pub track_buffer: u32,
    pub frame_rate: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            track_thresh: 0.5,
            high_thresh: 0.6,
            match_thresh: 0.8,
            track_buffer: 30,
            frame_rate: 30.0,
        }
    }
}

impl TrackerConfig {
    /// Check that the configuration describes a usable tracker.
    pub fn validate(&self) -> Result<(), TrackError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(TrackError::config(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if self.track_buffer == 0 {
            return Err(TrackError::config("track_buffer must be at least one frame"));
        }
        for (name, value) in [
            ("track_thresh", self.track_thresh),
            ("high_thresh", self.high_thresh),
            ("match_thresh", self.match_thresh),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrackError::config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Frames a track may stay lost before it is removed.
    pub fn max_time_lost(&self) -> u32 {
        (self.frame_rate / 30.0 * self.track_buffer as f32) as u32
    }
}

/// Position of a track in the tracker's arena, valid for one update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TrackSlot(usize);

/// Multi-object tracker with two-stage (high, then low score) association.
///
/// All tracks live in one arena; the `tracked`, `lost` and `removed`
/// pools are lists of slots into it. The arena is compacted at the end of
/// every [`update`](Self::update).
#[derive(Debug)]
pub struct BYTETracker<D = Detection> {
    tracks: Vec<STrack<D>>,
    tracked_stracks: Vec<TrackSlot>,
    lost_stracks: Vec<TrackSlot>,
    removed_stracks: Vec<TrackSlot>,
    frame_id: u32,
    config: TrackerConfig,
    max_time_lost: u32,
    kalman_filter: KalmanFilter,
    track_ids: TrackIdGenerator,
}

impl<D: DetectionBox> BYTETracker<D> {
    /// Create a tracker with its own track id sequence.
    pub fn new(config: TrackerConfig) -> Result<Self, TrackError> {
        Self::with_id_generator(config, TrackIdGenerator::new())
    }

    /// Create a tracker drawing ids from `track_ids`, possibly shared with
    /// other trackers.
    pub fn with_id_generator(
        config: TrackerConfig,
        track_ids: TrackIdGenerator,
    ) -> Result<Self, TrackError> {
        config.validate()?;
        let max_time_lost = config.max_time_lost();
        Ok(Self {
            tracks: Vec::new(),
            tracked_stracks: Vec::new(),
            lost_stracks: Vec::new(),
            removed_stracks: Vec::new(),
            frame_id: 0,
            config,
            max_time_lost,
            kalman_filter: KalmanFilter::default(),
            track_ids,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of frames processed so far.
    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn max_time_lost(&self) -> u32 {
        self.max_time_lost
    }

    pub fn id_generator(&self) -> &TrackIdGenerator {
        &self.track_ids
    }

    /// Tracks currently in the tracked pool, confirmed or not.
    pub fn tracked_stracks(&self) -> impl Iterator<Item = &STrack<D>> {
        self.tracked_stracks.iter().map(|slot| self.track(*slot))
    }

    /// Tracks waiting to be re-found, ordered by track id.
    pub fn lost_stracks(&self) -> impl Iterator<Item = &STrack<D>> {
        self.lost_stracks.iter().map(|slot| self.track(*slot))
    }

    /// Tracks removed during the latest update.
    pub fn removed_stracks(&self) -> impl Iterator<Item = &STrack<D>> {
        self.removed_stracks.iter().map(|slot| self.track(*slot))
    }

    /// Drop every track and restart id numbering.
    ///
    /// Numbering only restarts when no other tracker shares the id
    /// generator, so ids still live elsewhere are never handed out again.
    /// The frame counter keeps running, so tracks born after a flush still
    /// need a second match before they are reported.
    pub fn flush(&mut self) {
        debug!(
            "flushing {} tracked and {} lost tracks at frame {}",
            self.tracked_stracks.len(),
            self.lost_stracks.len(),
            self.frame_id
        );
        self.tracks.clear();
        self.tracked_stracks.clear();
        self.lost_stracks.clear();
        self.removed_stracks.clear();
        if !self.track_ids.reset_if_exclusive() {
            debug!("track id generator is shared, numbering continues");
        }
    }

    /// Process the detections of one frame and return the visible tracks.
    ///
    /// Lost tracks that went missing at most `track_frame` frames ago are
    /// predicted forward once more and reported first, with `is_updated`
    /// unset; confirmed tracked tracks follow.
    ///
    /// # Panics
    ///
    /// Panics if the assignment solver rejects an IoU cost matrix. IoU
    /// costs are always finite and within `[0, 1]`, so this indicates a
    /// bug in the cost model rather than bad input.
    pub fn update(&mut self, detections: Vec<D>, track_frame: u32) -> Vec<STrack<D>> {
        self.frame_id += 1;
        let frame_id = self.frame_id;

        let mut activated_stracks = Vec::new();
        let mut refind_stracks = Vec::new();
        let mut lost_stracks = Vec::new();
        let mut removed_stracks = Vec::new();

        // Step 1: Split detections into high-score and low-score
        let track_thresh = self.config.track_thresh;
        let (detections, detections_low): (Vec<STrack<D>>, Vec<STrack<D>>) = detections
            .into_iter()
            .map(STrack::new)
            .partition(|det| det.score >= track_thresh);

        let (tracked, unconfirmed): (Vec<TrackSlot>, Vec<TrackSlot>) = self
            .tracked_stracks
            .iter()
            .copied()
            .partition(|slot| self.track(*slot).is_activated);

        // Step 2: First association, with high score detections
        let strack_pool = self.joint_stracks(&tracked, &self.lost_stracks);
        STrack::multi_predict(
            select_mut(&mut self.tracks, &strack_pool),
            &self.kalman_filter,
        );

        let dists = matching::iou_distance(&self.rects(&strack_pool), &det_rects(&detections));
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = associate(&dists, self.config.match_thresh);

        for (itracked, idet) in matches {
            let slot = strack_pool[itracked];
            trace!("first association cost {:.3}", dists[[itracked, idet]]);
            if self.apply_match(slot, &detections[idet]) {
                activated_stracks.push(slot);
            } else {
                refind_stracks.push(slot);
            }
        }

        // Step 3: Second association, with low score detection boxes
        let r_tracked_stracks: Vec<TrackSlot> = unmatched_tracks
            .iter()
            .map(|&i| strack_pool[i])
            .filter(|slot| self.track(*slot).state == TrackState::Tracked)
            .collect();

        let dists_second = matching::iou_distance(
            &self.rects(&r_tracked_stracks),
            &det_rects(&detections_low),
        );
        let AssignmentResult {
            matches: matches_second,
            unmatched_tracks: unmatched_tracks_second,
            ..
        } = associate(&dists_second, LOW_SCORE_MATCH_THRESH);

        for (itracked, idet) in matches_second {
            let slot = r_tracked_stracks[itracked];
            trace!("second association cost {:.3}", dists_second[[itracked, idet]]);
            if self.apply_match(slot, &detections_low[idet]) {
                activated_stracks.push(slot);
            } else {
                refind_stracks.push(slot);
            }
        }

        for idx in unmatched_tracks_second {
            let slot = r_tracked_stracks[idx];
            let track = &mut self.tracks[slot.0];
            if track.state != TrackState::Lost {
                track.mark_lost();
                debug!("track {} lost at frame {}", track.track_id, frame_id);
                lost_stracks.push(slot);
            }
        }

        // Deal with unconfirmed tracks, usually tracks with only one beginning frame
        let remaining: Vec<usize> = unmatched_detections;
        let remaining_rects: Vec<Rect> = remaining.iter().map(|&i| detections[i].rect()).collect();
        let dists_unconfirmed = matching::iou_distance(&self.rects(&unconfirmed), &remaining_rects);
        let AssignmentResult {
            matches: matches_unconfirmed,
            unmatched_tracks: unmatched_unconfirmed,
            unmatched_detections: unmatched_new,
        } = associate(&dists_unconfirmed, UNCONFIRMED_MATCH_THRESH);

        for (itracked, idet) in matches_unconfirmed {
            let slot = unconfirmed[itracked];
            self.tracks[slot.0].update(&detections[remaining[idet]], &self.kalman_filter, frame_id);
            activated_stracks.push(slot);
        }
        for idx in unmatched_unconfirmed {
            let slot = unconfirmed[idx];
            let track = &mut self.tracks[slot.0];
            track.mark_removed();
            debug!("unconfirmed track {} removed at frame {}", track.track_id, frame_id);
            removed_stracks.push(slot);
        }

        // Step 4: Init new stracks
        let mut spawn = vec![false; detections.len()];
        for idx in unmatched_new {
            let det = remaining[idx];
            spawn[det] = detections[det].score >= self.config.high_thresh;
        }
        for (mut track, _) in detections.into_iter().zip(spawn).filter(|(_, spawn)| *spawn) {
            track.activate(&self.kalman_filter, frame_id, self.track_ids.next_id());
            debug!(
                "track {} started at frame {} (confirmed: {})",
                track.track_id, frame_id, track.is_activated
            );
            activated_stracks.push(self.insert(track));
        }

        // Step 5: Update state
        for &slot in &self.lost_stracks {
            let track = &mut self.tracks[slot.0];
            if frame_id.saturating_sub(track.end_frame()) > self.max_time_lost {
                track.mark_removed();
                debug!("lost track {} expired at frame {}", track.track_id, frame_id);
                removed_stracks.push(slot);
            }
        }

        let still_tracked: Vec<TrackSlot> = self
            .tracked_stracks
            .iter()
            .copied()
            .filter(|slot| self.track(*slot).state == TrackState::Tracked)
            .collect();
        let tracked = self.joint_stracks(&still_tracked, &activated_stracks);
        let tracked = self.joint_stracks(&tracked, &refind_stracks);

        let mut lost = self.sub_stracks(&self.lost_stracks, &tracked);
        lost.extend(lost_stracks);
        let lost = self.sub_stracks(&lost, &removed_stracks);

        let (tracked, lost) = self.remove_duplicate_stracks(&tracked, &lost);
        self.tracked_stracks = tracked;
        self.lost_stracks = lost;
        self.removed_stracks = removed_stracks;

        // Step 6: Output, recently lost tracks first
        let mut output = Vec::new();
        for &slot in &self.lost_stracks {
            let track = &mut self.tracks[slot.0];
            if frame_id.saturating_sub(track.end_frame()) <= track_frame {
                track.predict(&self.kalman_filter);
                output.push(track.clone());
            }
        }
        output.extend(
            self.tracked_stracks
                .iter()
                .map(|slot| &self.tracks[slot.0])
                .filter(|track| track.is_activated)
                .cloned(),
        );

        self.compact();
        trace!(
            "frame {}: {} tracked, {} lost, {} removed, {} reported",
            frame_id,
            self.tracked_stracks.len(),
            self.lost_stracks.len(),
            self.removed_stracks.len(),
            output.len()
        );

        output
    }

    fn track(&self, slot: TrackSlot) -> &STrack<D> {
        &self.tracks[slot.0]
    }

    fn insert(&mut self, track: STrack<D>) -> TrackSlot {
        self.tracks.push(track);
        TrackSlot(self.tracks.len() - 1)
    }

    fn rects(&self, slots: &[TrackSlot]) -> Vec<Rect> {
        slots.iter().map(|slot| self.track(*slot).rect()).collect()
    }

    /// Update a matched track; returns `false` when it was re-found from lost.
    fn apply_match(&mut self, slot: TrackSlot, det: &STrack<D>) -> bool {
        let track = &mut self.tracks[slot.0];
        debug_assert!(track.state.is_alive());
        if track.state == TrackState::Tracked {
            track.update(det, &self.kalman_filter, self.frame_id);
            true
        } else {
            track.re_activate(det, &self.kalman_filter, self.frame_id, None);
            debug!("track {} re-found at frame {}", track.track_id, self.frame_id);
            false
        }
    }

    /// Concatenate two pools, skipping ids of `tlistb` already in `tlista`.
    fn joint_stracks(&self, tlista: &[TrackSlot], tlistb: &[TrackSlot]) -> Vec<TrackSlot> {
        let mut exists = HashSet::new();
        let mut res = Vec::with_capacity(tlista.len() + tlistb.len());
        for &slot in tlista {
            exists.insert(self.track(slot).track_id);
            res.push(slot);
        }
        for &slot in tlistb {
            if exists.insert(self.track(slot).track_id) {
                res.push(slot);
            }
        }
        res
    }

    /// Members of `tlista` whose id is not in `tlistb`, ordered by track id.
    fn sub_stracks(&self, tlista: &[TrackSlot], tlistb: &[TrackSlot]) -> Vec<TrackSlot> {
        let mut stracks: BTreeMap<u64, TrackSlot> = tlista
            .iter()
            .map(|&slot| (self.track(slot).track_id, slot))
            .collect();
        for &slot in tlistb {
            stracks.remove(&self.track(slot).track_id);
        }
        stracks.into_values().collect()
    }

    /// Drop one track of every tracked/lost pair that overlaps almost fully.
    ///
    /// The younger track goes; on equal age the tracked one does.
    fn remove_duplicate_stracks(
        &self,
        stracksa: &[TrackSlot],
        stracksb: &[TrackSlot],
    ) -> (Vec<TrackSlot>, Vec<TrackSlot>) {
        let pdist = matching::iou_distance(&self.rects(stracksa), &self.rects(stracksb));

        let mut dupa = vec![false; stracksa.len()];
        let mut dupb = vec![false; stracksb.len()];
        for ((i, j), &dist) in pdist.indexed_iter() {
            if dist >= DUPLICATE_IOU_DISTANCE {
                continue;
            }
            let a = self.track(stracksa[i]);
            let b = self.track(stracksb[j]);
            if a.track_age() > b.track_age() {
                debug!("dropping lost track {} duplicating track {}", b.track_id, a.track_id);
                dupb[j] = true;
            } else {
                debug!("dropping track {} duplicating lost track {}", a.track_id, b.track_id);
                dupa[i] = true;
            }
        }

        let resa = stracksa
            .iter()
            .zip(dupa)
            .filter_map(|(&slot, dup)| (!dup).then_some(slot))
            .collect();
        let resb = stracksb
            .iter()
            .zip(dupb)
            .filter_map(|(&slot, dup)| (!dup).then_some(slot))
            .collect();
        (resa, resb)
    }

    /// Keep only tracks referenced by a pool and renumber the slots.
    fn compact(&mut self) {
        let mut old: Vec<Option<STrack<D>>> = std::mem::take(&mut self.tracks)
            .into_iter()
            .map(Some)
            .collect();
        let mut remap: Vec<Option<TrackSlot>> = vec![None; old.len()];

        for pool in [
            &mut self.tracked_stracks,
            &mut self.lost_stracks,
            &mut self.removed_stracks,
        ] {
            for slot in pool.iter_mut() {
                let new_slot = match remap[slot.0] {
                    Some(new_slot) => new_slot,
                    None => {
                        if let Some(track) = old[slot.0].take() {
                            self.tracks.push(track);
                        }
                        let new_slot = TrackSlot(self.tracks.len() - 1);
                        remap[slot.0] = Some(new_slot);
                        new_slot
                    }
                };
                *slot = new_slot;
            }
        }
    }
}

/// Gated assignment whose failure can only come from a broken cost model.
fn associate(dists: &Array2<f32>, thresh: f32) -> AssignmentResult {
    match matching::linear_assignment(dists, thresh) {
        Ok(result) => result,
        Err(err) => panic!("IoU cost matrix rejected by the assignment solver: {err}"),
    }
}

fn det_rects<D: DetectionBox>(detections: &[STrack<D>]) -> Vec<Rect> {
    detections.iter().map(STrack::rect).collect()
}

fn select_mut<'a, D>(
    tracks: &'a mut [STrack<D>],
    slots: &[TrackSlot],
) -> impl Iterator<Item = &'a mut STrack<D>> + use<'a, D> {
    let mut selected = vec![false; tracks.len()];
    for slot in slots {
        selected[slot.0] = true;
    }
    tracks
        .iter_mut()
        .zip(selected)
        .filter_map(|(track, keep)| keep.then_some(track))
}
