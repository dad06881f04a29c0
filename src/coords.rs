//! Target-space to image-space coordinate mapping.
//!
//! Decoders work on the square model canvas; detections must come back in
//! the original image's pixel frame. Which inverse applies depends on how
//! the image was put onto the canvas, so the preprocessor reports its exact
//! transform as a [`Mapping`] and the mapper never re-derives it.

use crate::candidate::BoxCandidate;

/// Which resize family produced the input tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizePolicy {
    /// Per-axis stretch to the square canvas; aspect ratio is not preserved.
    RatioScale,
    /// Aspect-preserving resize with symmetric zero padding.
    Letterbox,
}

/// Exact transform applied by the preprocessor, carried as data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mapping {
    /// Full-canvas stretch; the inverse is `coord · (image_dim / target)`.
    RatioScale,
    /// Uniform scale plus per-axis leading pads; the inverse is
    /// `(coord − pad) / scale`.
    Letterbox {
        /// Uniform scale `min(target/img_w, target/img_h)`.
        scale: f32,
        /// Leading horizontal pad in canvas pixels.
        pad_x: f32,
        /// Leading vertical pad in canvas pixels.
        pad_y: f32,
    },
}

impl Mapping {
    /// The resize family this transform belongs to.
    pub fn policy(&self) -> ResizePolicy {
        match self {
            Mapping::RatioScale => ResizePolicy::RatioScale,
            Mapping::Letterbox { .. } => ResizePolicy::Letterbox,
        }
    }
}

/// Letterbox geometry: `(scale, scaled_w, scaled_h, pad_x, pad_y)`.
///
/// Float scale, scaled dimensions truncated to whole pixels, leading pad
/// `(target − scaled) / 2` in integer arithmetic with the residue trailing.
pub(crate) fn letterbox_params(width: u32, height: u32, target_size: u32) -> (f32, u32, u32, u32, u32) {
    let target = target_size as f32;
    let scale = (target / width as f32).min(target / height as f32);
    let scaled_w = (width as f32 * scale) as u32;
    let scaled_h = (height as f32 * scale) as u32;
    let pad_x = (target_size - scaled_w) / 2;
    let pad_y = (target_size - scaled_h) / 2;
    (scale, scaled_w, scaled_h, pad_x, pad_y)
}

/// Computes the letterbox transform for an image.
///
/// Matches the reference preprocessor step for step, so the reported pads
/// agree with what actually landed on the canvas.
pub fn letterbox_mapping(width: u32, height: u32, target_size: u32) -> Mapping {
    let (scale, _, _, pad_x, pad_y) = letterbox_params(width, height, target_size);
    Mapping::Letterbox {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
    }
}

/// Maps target-space candidates into one image's pixel frame.
#[derive(Clone, Copy, Debug)]
pub struct CoordMapper {
    img_w: f32,
    img_h: f32,
    target: f32,
    mapping: Mapping,
}

impl CoordMapper {
    /// Builds a mapper for one image; dimensions are validated upstream.
    pub fn new(width: u32, height: u32, target_size: u32, mapping: Mapping) -> Self {
        Self {
            img_w: width as f32,
            img_h: height as f32,
            target: target_size as f32,
            mapping,
        }
    }

    /// Maps a candidate into image space, clipping to the image bounds.
    ///
    /// Returns `None` when the clipped box is degenerate (zero width or
    /// height), e.g. a box that lay entirely inside the letterbox padding.
    pub fn map(&self, candidate: &BoxCandidate) -> Option<BoxCandidate> {
        let x1 = self.map_x(candidate.x1).clamp(0.0, self.img_w);
        let y1 = self.map_y(candidate.y1).clamp(0.0, self.img_h);
        let x2 = self.map_x(candidate.x2).clamp(0.0, self.img_w);
        let y2 = self.map_y(candidate.y2).clamp(0.0, self.img_h);
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(BoxCandidate {
            x1,
            y1,
            x2,
            y2,
            score: candidate.score,
            label: candidate.label,
        })
    }

    fn map_x(&self, x: f32) -> f32 {
        match self.mapping {
            Mapping::RatioScale => x * self.img_w / self.target,
            Mapping::Letterbox { scale, pad_x, .. } => (x - pad_x) / scale,
        }
    }

    fn map_y(&self, y: f32) -> f32 {
        match self.mapping {
            Mapping::RatioScale => y * self.img_h / self.target,
            Mapping::Letterbox { scale, pad_y, .. } => (y - pad_y) / scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{letterbox_mapping, Mapping, ResizePolicy};

    #[test]
    fn letterbox_params_for_landscape_image() {
        let mapping = letterbox_mapping(640, 480, 320);
        assert_eq!(
            mapping,
            Mapping::Letterbox {
                scale: 0.5,
                pad_x: 0.0,
                pad_y: 40.0,
            }
        );
    }

    #[test]
    fn letterbox_pad_residue_trails() {
        // 427 * 0.5 truncates to 213, leaving 107 pixels of padding: 53 leads.
        let mapping = letterbox_mapping(640, 427, 320);
        assert_eq!(
            mapping,
            Mapping::Letterbox {
                scale: 0.5,
                pad_x: 0.0,
                pad_y: 53.0,
            }
        );
    }

    #[test]
    fn policy_matches_variant() {
        assert_eq!(Mapping::RatioScale.policy(), ResizePolicy::RatioScale);
        assert_eq!(
            letterbox_mapping(100, 100, 320).policy(),
            ResizePolicy::Letterbox
        );
    }
}
