//! Inference-engine collaborator interface.
//!
//! Model execution is not this crate's business: backends wrap whatever
//! runtime actually runs the network and expose it through these traits.
//! The pipeline only ever binds one input by name and reads output heads by
//! name as raw shaped floats.

use crate::tensor::TensorView;
use thiserror::Error;

/// Errors surfaced by an inference backend.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Weights, parameters, or recorded dumps could not be loaded.
    #[error("model load failed: {reason}")]
    Load {
        /// Backend message describing the failure.
        reason: String,
    },
    /// The backend accepts none of the attempted input names.
    #[error("unknown input tensor: {name}")]
    UnknownInput {
        /// The rejected name, or the tried candidates joined with `|`.
        name: String,
    },
    /// The backend exposes none of the attempted output names.
    #[error("unknown output tensor: {name}")]
    UnknownOutput {
        /// The rejected name, or the tried candidates joined with `|`.
        name: String,
    },
    /// The forward pass itself failed.
    #[error("inference failed: {reason}")]
    Execution {
        /// Backend message describing the failure.
        reason: String,
    },
}

/// One forward pass worth of backend state.
///
/// Sessions mirror the extractor semantics of on-device runtimes: one is
/// created per invocation, inputs are bound by name, and outputs may be
/// produced lazily on first fetch. `output` takes `&self` so a grid model's
/// class and distance tensors can be held at the same time; lazily-executing
/// backends use interior mutability for that.
pub trait InferenceSession {
    /// Binds a planar tensor of shape `(channels, height, width)` as the
    /// input named `name`.
    fn set_input(
        &mut self,
        name: &str,
        data: &[f32],
        channels: usize,
        height: usize,
        width: usize,
    ) -> Result<(), EngineError>;

    /// Fetches an output head by name, borrowed for the decode call.
    fn output(&self, name: &str) -> Result<TensorView<'_>, EngineError>;
}

/// A loaded model capable of creating per-invocation sessions.
///
/// Weight loading belongs to each backend's constructor and surfaces as
/// [`EngineError::Load`]. Concurrent sessions against one engine are only
/// safe if the backend documents them as such; otherwise callers serialize
/// invocations per instance.
pub trait InferenceEngine {
    /// Session type produced by this backend. Sessions own or share their
    /// backing storage rather than borrowing the engine.
    type Session: InferenceSession;

    /// Creates a fresh session for one forward pass.
    fn create_session(&self) -> Result<Self::Session, EngineError>;
}
