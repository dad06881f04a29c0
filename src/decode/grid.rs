//! Grid-based head decoding.
//!
//! Grid models emit one class tensor and one distance tensor per stride.
//! Every feature-map cell is an implicit anchor: the decoded side distances
//! are offsets from the cell's center, scaled by the stride. This is the
//! authoritative distribution decode; the flat variant in
//! [`crate::decode::flat`] lacks the anchor grid.

use crate::candidate::BoxCandidate;
use crate::decode::{classify, distribution_expectation};
use crate::profile::ModelProfile;
use crate::tensor::TensorView;
use crate::util::{DetPostError, DetPostResult};

/// One anchor cell of a stride-based feature map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCell {
    /// Feature-map stride in input pixels.
    pub stride: u32,
    /// Cell row.
    pub row: usize,
    /// Cell column.
    pub col: usize,
}

impl GridCell {
    /// Anchor center in target-space pixels: `((col+0.5)·s, (row+0.5)·s)`.
    pub fn anchor(&self) -> (f32, f32) {
        let s = self.stride as f32;
        (
            (self.col as f32 + 0.5) * s,
            (self.row as f32 + 0.5) * s,
        )
    }
}

/// Decodes one grid head into thresholded target-space candidates.
///
/// `cls` carries `num_classes` logits per cell and `dis` carries
/// `4 · reg_max` distance-bin logits per cell (left, top, right, bottom).
/// Boxes are clipped to `[0, target_size]` on both axes.
pub fn decode_grid_head(
    cls: &TensorView<'_>,
    dis: &TensorView<'_>,
    stride: u32,
    profile: &ModelProfile,
) -> DetPostResult<Vec<BoxCandidate>> {
    let reg_max = profile.reg_max;
    if cls.channels() != profile.num_classes {
        return Err(DetPostError::UnsupportedFormat {
            channels: cls.channels(),
            num_classes: profile.num_classes,
        });
    }
    if dis.channels() != 4 * reg_max {
        return Err(DetPostError::UnsupportedFormat {
            channels: dis.channels(),
            num_classes: profile.num_classes,
        });
    }
    let feature = profile.feature_size(stride);
    let sites = feature * feature;
    if cls.sites() != sites || dis.sites() != sites {
        return Err(DetPostError::InvalidInput(
            "head spatial size does not match target_size / stride",
        ));
    }

    let target = profile.target_size as f32;
    let mut out = Vec::new();
    for idx in 0..sites {
        let scores = cls
            .site_at(idx)
            .ok_or(DetPostError::InvalidInput("class tensor truncated"))?;
        let Some((label, score)) = classify(scores, profile.conf_threshold) else {
            continue;
        };

        let cell = GridCell {
            stride,
            row: idx / feature,
            col: idx % feature,
        };
        let (cx, cy) = cell.anchor();
        let bins = dis
            .site_at(idx)
            .ok_or(DetPostError::InvalidInput("distance tensor truncated"))?;
        let mut distance = [0.0f32; 4];
        for (side, slot) in distance.iter_mut().enumerate() {
            let logits = &bins[side * reg_max..(side + 1) * reg_max];
            *slot = distribution_expectation(logits) * stride as f32;
        }

        out.push(BoxCandidate {
            x1: (cx - distance[0]).clamp(0.0, target),
            y1: (cy - distance[1]).clamp(0.0, target),
            x2: (cx + distance[2]).clamp(0.0, target),
            y2: (cy + distance[3]).clamp(0.0, target),
            score,
            label,
        });
    }
    Ok(out)
}
