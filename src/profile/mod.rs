//! Per-model constants and the built-in profile registry.
//!
//! A `ModelProfile` collects everything the pipeline needs to know about one
//! model export: input geometry, normalization constants, class count,
//! distribution bin count, thresholds, and the names of its input and output
//! tensors. Profiles are immutable, built once, and passed by reference;
//! there is no global model table.

use crate::candidate::NmsMode;
use crate::util::{DetPostError, DetPostResult};

pub mod format;

pub use format::{detect_encoding, DetectedEncoding, OutputEncoding};

/// One stride of a grid-based model: paired class/distance output names.
#[derive(Clone, Debug)]
pub struct GridHead {
    /// Class-score output tensor name.
    pub cls: String,
    /// Distance-distribution output tensor name.
    pub dis: String,
    /// Feature-map stride in input pixels.
    pub stride: u32,
}

impl GridHead {
    /// Creates a head from its tensor names and stride.
    pub fn new(cls: &str, dis: &str, stride: u32) -> Self {
        Self {
            cls: cls.to_owned(),
            dis: dis.to_owned(),
            stride,
        }
    }
}

/// Output-head layout of a model export.
#[derive(Clone, Debug)]
pub enum HeadLayout {
    /// Per-stride class/distance tensor pairs (grid-based decode).
    Grid {
        /// Heads in stride order.
        heads: Vec<GridHead>,
    },
    /// One flat output tensor; encoding is classified at warm-up.
    Flat {
        /// Output names to try in order; exports disagree on naming.
        outputs: Vec<String>,
    },
}

/// Immutable per-model constants.
#[derive(Clone, Debug)]
pub struct ModelProfile {
    /// Square input edge length in pixels.
    pub target_size: u32,
    /// Per-channel mean subtracted during preprocessing.
    pub mean: [f32; 3],
    /// Per-channel scale applied after mean subtraction.
    pub norm: [f32; 3],
    /// Number of object classes.
    pub num_classes: usize,
    /// Distance-distribution bin count per box side.
    pub reg_max: usize,
    /// Minimum post-sigmoid score for a candidate to survive.
    pub conf_threshold: f32,
    /// IoU threshold at or above which overlaps are suppressed.
    pub nms_threshold: f32,
    /// Suppression mode.
    pub nms_mode: NmsMode,
    /// Input tensor names to try in order.
    pub inputs: Vec<String>,
    /// Output-head layout.
    pub heads: HeadLayout,
}

impl ModelProfile {
    /// Looks up a built-in profile by model identifier.
    ///
    /// Returns `None` for unknown identifiers; hosts decide how to surface
    /// that.
    pub fn named(key: &str) -> Option<Self> {
        match key {
            "nanodet-m" => Some(Self::nanodet_m()),
            "yolov8n" | "yolov8s" | "yolov8m" | "yolov8l" | "yolov8x" => Some(Self::yolov8()),
            _ => None,
        }
    }

    /// Profile for the 320-pixel NanoDet-m export with three grid heads.
    pub fn nanodet_m() -> Self {
        Self {
            target_size: 320,
            mean: [103.53, 116.28, 123.675],
            norm: [0.017429, 0.017507, 0.01712475],
            num_classes: 80,
            reg_max: 8,
            conf_threshold: 0.3,
            nms_threshold: 0.7,
            nms_mode: NmsMode::PerClass,
            inputs: vec!["data".to_owned()],
            heads: HeadLayout::Grid {
                heads: vec![
                    GridHead::new("792", "795", 8),
                    GridHead::new("814", "817", 16),
                    GridHead::new("836", "839", 32),
                ],
            },
        }
    }

    /// Profile shared by the 640-pixel YOLOv8 exports (n through x).
    pub fn yolov8() -> Self {
        Self {
            target_size: 640,
            mean: [0.0, 0.0, 0.0],
            norm: [1.0 / 255.0, 1.0 / 255.0, 1.0 / 255.0],
            num_classes: 80,
            reg_max: 16,
            conf_threshold: 0.25,
            nms_threshold: 0.45,
            nms_mode: NmsMode::PerClass,
            inputs: vec![
                "images".to_owned(),
                "data".to_owned(),
                "input".to_owned(),
                "input.1".to_owned(),
            ],
            heads: HeadLayout::Flat {
                outputs: vec!["output0".to_owned(), "output".to_owned(), "out".to_owned()],
            },
        }
    }

    /// Overrides the confidence threshold.
    pub fn with_conf_threshold(mut self, conf_threshold: f32) -> Self {
        self.conf_threshold = conf_threshold;
        self
    }

    /// Overrides the NMS threshold.
    pub fn with_nms_threshold(mut self, nms_threshold: f32) -> Self {
        self.nms_threshold = nms_threshold;
        self
    }

    /// Overrides the suppression mode.
    pub fn with_nms_mode(mut self, nms_mode: NmsMode) -> Self {
        self.nms_mode = nms_mode;
        self
    }

    /// Number of elements in the planar RGB input tensor.
    pub fn input_len(&self) -> usize {
        3 * (self.target_size as usize) * (self.target_size as usize)
    }

    /// Feature-map edge length for a grid head of the given stride.
    pub fn feature_size(&self, stride: u32) -> usize {
        (self.target_size / stride) as usize
    }

    /// Checks every profile invariant; called during detector load.
    pub fn validate(&self) -> DetPostResult<()> {
        if self.target_size == 0 {
            return Err(DetPostError::InvalidProfile {
                reason: "target_size must be positive",
            });
        }
        if self.num_classes == 0 {
            return Err(DetPostError::InvalidProfile {
                reason: "num_classes must be positive",
            });
        }
        if self.reg_max == 0 {
            return Err(DetPostError::InvalidProfile {
                reason: "reg_max must be at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.conf_threshold) {
            return Err(DetPostError::InvalidProfile {
                reason: "conf_threshold must be in [0, 1]",
            });
        }
        if !(self.nms_threshold > 0.0 && self.nms_threshold < 1.0) {
            return Err(DetPostError::InvalidProfile {
                reason: "nms_threshold must be in (0, 1)",
            });
        }
        if self.inputs.is_empty() {
            return Err(DetPostError::InvalidProfile {
                reason: "at least one input name is required",
            });
        }
        match &self.heads {
            HeadLayout::Grid { heads } => {
                if heads.is_empty() {
                    return Err(DetPostError::InvalidProfile {
                        reason: "grid layout needs at least one head",
                    });
                }
                for head in heads {
                    if head.stride == 0 || self.target_size % head.stride != 0 {
                        return Err(DetPostError::InvalidProfile {
                            reason: "head stride must divide target_size",
                        });
                    }
                }
            }
            HeadLayout::Flat { outputs } => {
                if outputs.is_empty() {
                    return Err(DetPostError::InvalidProfile {
                        reason: "flat layout needs at least one output name",
                    });
                }
            }
        }
        Ok(())
    }
}
