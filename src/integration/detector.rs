//! Trait for object detection inference backends.

use log::warn;
use ndarray::Array2;

use crate::tracker::{Detection, DetectionBox, Keypoint};

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to ByteTrack.
/// The detection type is tracked as-is, so detector-specific fields come
/// back attached to the tracks.
///
/// # Example
///
/// ```
/// use bytetrack_mot::{Detection, DetectionSource};
///
/// struct FixedDetector;
///
/// impl DetectionSource for FixedDetector {
///     type Detection = Detection;
///     type Error = std::io::Error;
///
///     fn detect(&mut self, _input: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>, Self::Error> {
///         Ok(vec![Detection::new(10.0, 10.0, 50.0, 50.0, 0.9)])
///     }
/// }
///
/// let dets = FixedDetector.detect(&[], 640, 480).unwrap();
/// assert_eq!(dets.len(), 1);
/// ```
pub trait DetectionSource {
    /// Detection type produced by the model.
    type Detection: DetectionBox;

    /// Error type for detection failures.
    type Error;

    /// Run inference on raw image data and return detections.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Self::Detection>, Self::Error>;
}

/// Helper trait for converting model-specific outputs to `Detection`.
pub trait IntoDetections {
    /// Convert the output into a vector of detections.
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// One detection per row: `[x1, y1, x2, y2, score, kx1, ky1, kx2, ky2, ...]`.
///
/// Columns after the score are read as keypoint pairs; an unpaired last
/// column is ignored.
impl IntoDetections for Array2<f32> {
    fn into_detections(self) -> Vec<Detection> {
        if self.ncols() < 5 {
            warn!(
                "detection matrix has {} columns, expected at least 5",
                self.ncols()
            );
            return Vec::new();
        }

        self.rows()
            .into_iter()
            .map(|row| {
                let extra: Vec<f32> = row.iter().skip(5).copied().collect();
                let keypoints = extra
                    .chunks_exact(2)
                    .map(|pair| Keypoint::new(pair[0], pair[1]))
                    .collect();
                Detection::new(row[0], row[1], row[2], row[3], row[4]).with_keypoints(keypoints)
            })
            .collect()
    }
}
