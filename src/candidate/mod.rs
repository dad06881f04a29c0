//! Box candidates and overlap-based pruning.
//!
//! A `BoxCandidate` is one thresholded decode result in target space;
//! suppression keeps the best-scoring representatives of each overlapping
//! cluster before coordinates are mapped back to the image.

pub mod nms;

pub use nms::{nms_boxes, NmsMode};

/// Scored box candidate.
///
/// Decoders emit candidates in target-space coordinates; the coordinate
/// mapper rewrites the corners into image space before they are promoted to
/// detections.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxCandidate {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
    /// Post-sigmoid class score in [0, 1].
    pub score: f32,
    /// Class index into the active profile.
    pub label: usize,
}

impl BoxCandidate {
    /// Plain floating-point area, `(x2 − x1) · (y2 − y1)`.
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }

    /// Box center `((x1+x2)/2, (y1+y2)/2)`.
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }
}

/// Intersection-over-union of two candidates.
///
/// Uses the plain-area convention throughout: widths and heights are raw
/// coordinate differences with no pixel-inclusive `+1` term, for both the
/// intersection and the individual boxes. A non-positive union yields 0.
pub fn iou(a: &BoxCandidate, b: &BoxCandidate) -> f32 {
    let inter_w = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let inter_h = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = inter_w * inter_h;
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}
