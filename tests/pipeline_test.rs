use std::collections::VecDeque;

use bytetrack_mot::{
    Detection, DetectionBuilder, DetectionSource, FrameOptions, IntoDetections, TrackerConfig,
    TrackerPipeline,
};
use ndarray::array;

#[derive(Debug, PartialEq)]
struct CameraDropped;

/// Replays one scripted result per frame.
struct ScriptedDetector {
    frames: VecDeque<Result<Vec<Detection>, CameraDropped>>,
    calls: usize,
}

impl ScriptedDetector {
    fn new(frames: Vec<Result<Vec<Detection>, CameraDropped>>) -> Self {
        Self {
            frames: frames.into(),
            calls: 0,
        }
    }
}

impl DetectionSource for ScriptedDetector {
    type Detection = Detection;
    type Error = CameraDropped;

    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error> {
        assert_eq!(input.len(), (width * height) as usize);
        self.calls += 1;
        self.frames.pop_front().unwrap_or(Ok(Vec::new()))
    }
}

fn person(x: f32) -> Detection {
    DetectionBuilder::new()
        .tlwh(x, 40.0, 30.0, 80.0)
        .score(0.9)
        .build()
}

#[test]
fn test_pipeline_tracks_across_frames() {
    let detector = ScriptedDetector::new(vec![
        Ok(vec![person(10.0), person(200.0)]),
        Ok(vec![person(12.0), person(198.0)]),
        Ok(vec![person(14.0)]),
    ]);
    let mut pipeline = TrackerPipeline::new(detector, TrackerConfig::default()).unwrap();
    let image = vec![0u8; 4 * 3];
    let options = FrameOptions {
        track_frame: 1,
        ..Default::default()
    };

    let frame1 = pipeline.process_frame(&image, 4, 3, &options).unwrap();
    assert_eq!(frame1.iter().map(|t| t.track_id).collect::<Vec<_>>(), vec![1, 2]);

    pipeline.process_frame(&image, 4, 3, &options).unwrap();

    // the second person vanished: reported first as lost, then the tracked one
    let frame3 = pipeline.process_frame(&image, 4, 3, &options).unwrap();
    let summary: Vec<(u64, bool)> = frame3.iter().map(|t| (t.track_id, t.is_updated)).collect();
    assert_eq!(summary, vec![(2, false), (1, true)]);
    assert_eq!(pipeline.detector().calls, 3);
}

#[test]
fn test_detector_error_leaves_tracker_untouched() {
    let detector = ScriptedDetector::new(vec![Ok(vec![person(10.0)]), Err(CameraDropped)]);
    let mut pipeline = TrackerPipeline::new(detector, TrackerConfig::default()).unwrap();
    let image = vec![0u8; 4];

    pipeline.process_frame(&image, 2, 2, &FrameOptions::default()).unwrap();
    let flush = FrameOptions {
        flush: true,
        ..Default::default()
    };
    let err = pipeline.process_frame(&image, 2, 2, &flush).unwrap_err();
    assert_eq!(err, CameraDropped);
    assert_eq!(pipeline.tracker().frame_id(), 1);
    assert_eq!(pipeline.tracker().tracked_stracks().count(), 1);
}

#[test]
fn test_flush_option() {
    let detector = ScriptedDetector::new(vec![
        Ok(vec![person(10.0)]),
        Ok(vec![person(10.0)]),
        Ok(vec![person(300.0)]),
        Ok(vec![person(300.0)]),
    ]);
    let mut pipeline = TrackerPipeline::new(detector, TrackerConfig::default()).unwrap();
    let image = vec![0u8; 1];
    let plain = FrameOptions::default();
    let flush = FrameOptions {
        flush: true,
        ..Default::default()
    };

    pipeline.process_frame(&image, 1, 1, &plain).unwrap();
    pipeline.process_frame(&image, 1, 1, &plain).unwrap();

    // scene cut: the old track is gone and numbering starts over
    assert!(pipeline.process_frame(&image, 1, 1, &flush).unwrap().is_empty());
    let tracks = pipeline.process_frame(&image, 1, 1, &plain).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].track_id, 1);
    assert_eq!(tracks[0].detection().bbox.x, 300.0);
}

#[test]
fn test_unbounded_output() {
    let many: Vec<Detection> = (0..200)
        .map(|i| {
            let x = (i % 20) as f32 * 50.0;
            let y = (i / 20) as f32 * 50.0;
            Detection::new(x, y, x + 40.0, y + 40.0, 0.9)
        })
        .collect();
    let detector = ScriptedDetector::new(vec![Ok(many.clone()), Ok(many)]);
    let mut pipeline = TrackerPipeline::new(detector, TrackerConfig::default()).unwrap();
    let image = vec![0u8; 1];

    let capped = pipeline.process_frame(&image, 1, 1, &FrameOptions::default()).unwrap();
    assert_eq!(capped.len(), bytetrack_mot::integration::DEFAULT_MAX_TRACKS);

    let unbounded = FrameOptions {
        max_tracks: None,
        ..Default::default()
    };
    assert_eq!(pipeline.process_frame(&image, 1, 1, &unbounded).unwrap().len(), 200);
}

#[test]
fn test_model_output_matrix() {
    let output = array![
        [10.0f32, 10.0, 50.0, 90.0, 0.92, 20.0, 30.0, 40.0, 30.0],
        [200.0, 10.0, 240.0, 90.0, 0.35, 210.0, 30.0, 230.0, 30.0],
    ];
    let detector = ScriptedDetector::new(vec![Ok(output.into_detections())]);
    let mut pipeline = TrackerPipeline::new(detector, TrackerConfig::default()).unwrap();

    let tracks = pipeline.process_frame(&[0], 1, 1, &FrameOptions::default()).unwrap();
    // the low score row never starts a track
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].keypoints().len(), 2);
}
