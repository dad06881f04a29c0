//! Decoders turning raw output tensors into target-space box candidates.
//!
//! Each decoder handles one output encoding: [`grid`] walks per-stride
//! feature maps with an implicit anchor per cell, [`flat`] handles
//! single-output heads in both the direct-coordinate and the
//! distance-distribution encoding, and [`dfl`] holds the shared
//! softmax-expectation primitive. Classification is identical everywhere:
//! sigmoid over the class logits, argmax, confidence filter.

use crate::util::math::{argmax, sigmoid};

pub mod dfl;
pub mod flat;
pub mod grid;

pub use dfl::distribution_expectation;
pub use flat::{decode_direct, decode_flat_distribution};
pub use grid::{decode_grid_head, GridCell};

/// Shared classification step: sigmoid + argmax + confidence filter.
///
/// Returns the winning label and its post-sigmoid score, or `None` when the
/// best score stays below `conf_threshold`.
pub(crate) fn classify(logits: &[f32], conf_threshold: f32) -> Option<(usize, f32)> {
    let (label, logit) = argmax(logits)?;
    let score = sigmoid(logit);
    (score >= conf_threshold).then_some((label, score))
}
