//! Flat (anchor-free) head decoding.
//!
//! Flat models emit one output tensor whose sites are candidate rows. The
//! row encoding is classified once at warm-up; both variants share the
//! sigmoid/argmax/threshold classification step.

use crate::candidate::BoxCandidate;
use crate::decode::{classify, distribution_expectation};
use crate::profile::ModelProfile;
use crate::tensor::TensorView;
use crate::util::{DetPostError, DetPostResult};

/// Decodes `[cx, cy, w, h, class_logits…]` rows.
///
/// Coordinates stay in target space and are not clipped here; the
/// coordinate mapper clips against the real image bounds.
pub fn decode_direct(
    out: &TensorView<'_>,
    profile: &ModelProfile,
) -> DetPostResult<Vec<BoxCandidate>> {
    if out.channels() != profile.num_classes + 4 {
        return Err(DetPostError::UnsupportedFormat {
            channels: out.channels(),
            num_classes: profile.num_classes,
        });
    }

    let mut candidates = Vec::new();
    for idx in 0..out.sites() {
        let row = out
            .site_at(idx)
            .ok_or(DetPostError::InvalidInput("output tensor truncated"))?;
        let Some((label, score)) = classify(&row[4..], profile.conf_threshold) else {
            continue;
        };
        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        candidates.push(BoxCandidate {
            x1: cx - w * 0.5,
            y1: cy - h * 0.5,
            x2: cx + w * 0.5,
            y2: cy + h * 0.5,
            score,
            label,
        });
    }
    Ok(candidates)
}

/// Decodes distribution rows without an anchor grid.
///
/// The four decoded side expectations are used directly as absolute corner
/// coordinates. Without the grid anchors of
/// [`crate::decode::decode_grid_head`] that is only meaningful for models
/// trained to regress absolute distances, which mainstream
/// distribution-head exports are not; the behavior is kept as shipped and
/// flagged at load time rather than silently reinterpreted. Confirm the
/// export's row semantics before trusting boxes from this path.
pub fn decode_flat_distribution(
    out: &TensorView<'_>,
    reg_max: usize,
    profile: &ModelProfile,
) -> DetPostResult<Vec<BoxCandidate>> {
    if reg_max == 0 || out.channels() != 4 * reg_max + profile.num_classes {
        return Err(DetPostError::UnsupportedFormat {
            channels: out.channels(),
            num_classes: profile.num_classes,
        });
    }

    let mut candidates = Vec::new();
    for idx in 0..out.sites() {
        let row = out
            .site_at(idx)
            .ok_or(DetPostError::InvalidInput("output tensor truncated"))?;
        let Some((label, score)) = classify(&row[4 * reg_max..], profile.conf_threshold) else {
            continue;
        };
        let mut corner = [0.0f32; 4];
        for (side, slot) in corner.iter_mut().enumerate() {
            *slot = distribution_expectation(&row[side * reg_max..(side + 1) * reg_max]);
        }
        candidates.push(BoxCandidate {
            x1: corner[0],
            y1: corner[1],
            x2: corner[2],
            y2: corner[3],
            score,
            label,
        });
    }
    Ok(candidates)
}
