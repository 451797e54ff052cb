//! Axis-aligned boxes and the IoU overlap measure.

use ndarray::Array2;

/// Axis-aligned box stored as left, top, width and height.
///
/// Converts to and from the other layouts used around the tracker:
/// - TLBR: left, top, right, bottom (detector output)
/// - XYAH: center x, center y, aspect ratio `w / h`, height (Kalman observation)
///
/// No validation happens on construction. Zero or negative sizes are
/// legal and simply never overlap anything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (left, top, right, bottom).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from XYAH format (center x, center y, aspect ratio, height).
    #[inline]
    pub fn from_xyah(cx: f32, cy: f32, aspect_ratio: f32, height: f32) -> Self {
        let width = aspect_ratio * height;
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Convert to XYAH format: (center_x, center_y, aspect_ratio, height).
    ///
    /// A zero height yields an aspect ratio of 0 instead of a division by zero.
    #[inline]
    pub fn to_xyah(&self) -> [f32; 4] {
        let cx = self.x + self.width / 2.0;
        let cy = self.y + self.height / 2.0;
        let aspect_ratio = if self.height != 0.0 {
            self.width / self.height
        } else {
            0.0
        };
        [cx, cy, aspect_ratio, self.height]
    }

    /// XYAH as the `f64` observation vector consumed by the Kalman filter.
    #[inline]
    pub fn to_xyah_f64(&self) -> [f64; 4] {
        self.to_xyah().map(f64::from)
    }

    /// Whether every coordinate is a finite number.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Area under the inclusive-pixel convention, `(w + 1) * (h + 1)`.
    ///
    /// Non-positive when either side spans less than one pixel.
    #[inline]
    pub fn pixel_area(&self) -> f32 {
        let w = self.width + 1.0;
        let h = self.height + 1.0;
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    /// Intersection over Union with another bounding box.
    ///
    /// Widths and heights follow the inclusive-pixel convention
    /// (`right - left + 1`). The result is always in `[0, 1]`: disjoint
    /// boxes, boxes with non-positive area and non-finite inputs give 0.
    pub fn iou(&self, other: &Rect) -> f32 {
        if !self.is_finite() || !other.is_finite() {
            return 0.0;
        }
        let [ax1, ay1, ax2, ay2] = self.to_tlbr();
        let [bx1, by1, bx2, by2] = other.to_tlbr();

        let area_a = self.pixel_area();
        let area_b = other.pixel_area();
        if area_a <= 0.0 || area_b <= 0.0 {
            return 0.0;
        }

        let iw = ax2.min(bx2) - ax1.max(bx1) + 1.0;
        if iw <= 0.0 {
            return 0.0;
        }
        let ih = ay2.min(by2) - ay1.max(by1) + 1.0;
        if ih <= 0.0 {
            return 0.0;
        }

        let inter = iw * ih;
        let union = area_a + area_b - inter;
        let iou = inter / union;
        if iou.is_finite() { iou.clamp(0.0, 1.0) } else { 0.0 }
    }
}

/// Calculate IoU matrix between two sets of bounding boxes.
///
/// Returns a matrix of shape (M, N) where M is the length of `boxes_a`
/// and N is the length of `boxes_b`. Either side may be empty; the
/// other dimension is still recorded in the shape.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    Array2::from_shape_fn((boxes_a.len(), boxes_b.len()), |(i, j)| {
        boxes_a[i].iou(&boxes_b[j])
    })
}
