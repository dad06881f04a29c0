//! Error types for detpost.

use crate::engine::EngineError;
use thiserror::Error;

/// Result alias for detpost operations.
pub type DetPostResult<T> = std::result::Result<T, DetPostError>;

/// Errors that can occur while decoding detector outputs.
///
/// The input-rejection variants (`InvalidInput`, `InvalidImageSize`,
/// `InvalidDimensions`, `InvalidStride`, `BufferTooSmall`,
/// `BufferLengthMismatch`) fire before any engine work; `Engine` wraps
/// collaborator failures, including load failures. An empty detection list
/// is never an error.
#[derive(Debug, Error, PartialEq)]
pub enum DetPostError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A tensor was declared with a zero dimension.
    #[error("invalid tensor dimensions: {channels}x{height}x{width}")]
    InvalidDimensions {
        /// Declared channel count.
        channels: usize,
        /// Declared height (rows or candidate count).
        height: usize,
        /// Declared width (columns).
        width: usize,
    },
    /// A tensor stride is smaller than its channel count.
    #[error("invalid stride: {stride} < {channels} channels")]
    InvalidStride {
        /// Declared channel count.
        channels: usize,
        /// Declared site stride.
        stride: usize,
    },
    /// A buffer is shorter than its declared dimensions require.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall {
        /// Minimum length implied by the dimensions.
        needed: usize,
        /// Actual buffer length.
        got: usize,
    },
    /// A buffer whose length must equal its declared dimensions does not.
    ///
    /// Unlike [`BufferTooSmall`](Self::BufferTooSmall), this fires in both
    /// directions: an oversized buffer is rejected too.
    #[error("buffer length mismatch: expected {expected}, got {got}")]
    BufferLengthMismatch {
        /// Exact length implied by the dimensions.
        expected: usize,
        /// Actual buffer length.
        got: usize,
    },
    /// An image was declared with a non-positive dimension.
    #[error("invalid image size: {width}x{height}")]
    InvalidImageSize {
        /// Declared image width in pixels.
        width: u32,
        /// Declared image height in pixels.
        height: u32,
    },
    /// A model profile violates one of its invariants.
    #[error("invalid model profile: {reason}")]
    InvalidProfile {
        /// Which invariant failed.
        reason: &'static str,
    },
    /// The output tensor shape matches no known encoding.
    #[error("unsupported output format: {channels} channels for {num_classes} classes")]
    UnsupportedFormat {
        /// Observed per-site channel count.
        channels: usize,
        /// Class count of the active profile.
        num_classes: usize,
    },
    /// Decode was requested before a backend was loaded.
    #[error("detector not ready: no backend loaded")]
    NotReady,
    /// The inference-engine collaborator failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// An image could not be read or decoded.
    #[error("image i/o error: {reason}")]
    ImageIo {
        /// Underlying decoder message.
        reason: String,
    },
}
