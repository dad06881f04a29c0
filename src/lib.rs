//! DetPost is a CPU-first post-processing library for object detectors.
//!
//! It turns raw network output tensors into filtered, image-space bounding
//! boxes: distribution (DFL) and direct-coordinate decoding, greedy
//! class-aware non-maximum suppression, and coordinate mapping for both
//! ratio-scale and letterbox preprocessing. Inference itself stays behind
//! the [`engine`] traits; the crate only consumes shapes and raw floats.

pub mod candidate;
pub mod coords;
pub mod decode;
pub mod engine;
#[cfg(feature = "image-io")]
pub mod io;
pub mod labels;
pub mod pipeline;
pub mod profile;
pub mod tensor;
pub mod util;

pub use candidate::{iou, nms_boxes, BoxCandidate, NmsMode};
pub use coords::{letterbox_mapping, CoordMapper, Mapping, ResizePolicy};
pub use decode::{
    decode_direct, decode_flat_distribution, decode_grid_head, distribution_expectation, GridCell,
};
pub use engine::{EngineError, InferenceEngine, InferenceSession};
pub use labels::{CocoLabels, LabelResolver, StaticLabels, UNKNOWN_LABEL};
pub use pipeline::{Detection, Detector, Passthrough};
pub use profile::{
    detect_encoding, DetectedEncoding, GridHead, HeadLayout, ModelProfile, OutputEncoding,
};
pub use tensor::{OwnedTensor, TensorView};
pub use util::{DetPostError, DetPostResult};
