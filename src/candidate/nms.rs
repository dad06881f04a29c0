//! Greedy non-maximum suppression over box candidates.

use crate::candidate::{iou, BoxCandidate};

/// Which candidates compete with each other during suppression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NmsMode {
    /// Only same-label candidates suppress each other.
    PerClass,
    /// All candidates compete regardless of label.
    ClassAgnostic,
}

/// Applies greedy non-maximum suppression.
///
/// Candidates are sorted by descending score with a stable sort, so equal
/// scores keep their discovery order; that ordering is part of the contract,
/// not an accident of the sort implementation. The sweep keeps the
/// best-scoring unsuppressed candidate and suppresses every later candidate
/// whose IoU with a kept one reaches `iou_threshold` (same-label only in
/// [`NmsMode::PerClass`]). The result preserves relative score order.
pub fn nms_boxes(
    candidates: &mut [BoxCandidate],
    iou_threshold: f32,
    mode: NmsMode,
) -> Vec<BoxCandidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<BoxCandidate> = Vec::new();
    'outer: for candidate in candidates.iter().copied() {
        for kept_box in kept.iter() {
            if mode == NmsMode::PerClass && kept_box.label != candidate.label {
                continue;
            }
            if iou(kept_box, &candidate) >= iou_threshold {
                continue 'outer;
            }
        }
        kept.push(candidate);
    }

    kept
}
