//! Detection pipeline orchestration.
//!
//! `Detector` ties the pieces together for one model instance: profile
//! validation, a warm-up forward pass that pins the output encoding, then
//! per-frame decode → suppression → coordinate mapping → label resolution.
//! A detector is constructed cold and becomes ready once [`Detector::load`]
//! succeeds; decoding before that fails with
//! [`DetPostError::NotReady`](crate::util::DetPostError::NotReady).

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::candidate::nms_boxes;
use crate::coords::{CoordMapper, Mapping};
use crate::decode::{decode_direct, decode_flat_distribution, decode_grid_head};
use crate::engine::{EngineError, InferenceEngine, InferenceSession};
use crate::labels::{CocoLabels, LabelResolver};
use crate::profile::{detect_encoding, HeadLayout, ModelProfile, OutputEncoding};
use crate::tensor::TensorView;
use crate::util::{DetPostError, DetPostResult};

/// Opaque caller-supplied fields echoed verbatim on every detection.
pub type Passthrough = BTreeMap<String, String>;

/// One final detection in image-space coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Left edge in image pixels.
    pub x1: f32,
    /// Top edge in image pixels.
    pub y1: f32,
    /// Right edge in image pixels.
    pub x2: f32,
    /// Bottom edge in image pixels.
    pub y2: f32,
    /// Post-sigmoid class score in [0, 1].
    pub score: f32,
    /// Class index into the active profile.
    pub label: usize,
    /// Resolved display name; `"unknown"` when unmapped.
    pub label_name: String,
    /// Optional alternate business code from the resolver.
    pub code: Option<String>,
    /// Caller-supplied fields, stored but never interpreted.
    pub passthrough: Passthrough,
}

impl Detection {
    /// Box center `((x1+x2)/2, (y1+y2)/2)`.
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }
}

struct ReadyBackend<E> {
    engine: E,
    encoding: OutputEncoding,
}

/// Post-processing pipeline for one model instance.
pub struct Detector<E: InferenceEngine> {
    profile: ModelProfile,
    labels: Box<dyn LabelResolver>,
    backend: Option<ReadyBackend<E>>,
}

impl<E: InferenceEngine> Detector<E> {
    /// Creates a cold detector with the COCO label table.
    pub fn new(profile: ModelProfile) -> Self {
        Self {
            profile,
            labels: Box::new(CocoLabels),
            backend: None,
        }
    }

    /// Replaces the label resolver.
    pub fn with_labels(mut self, labels: Box<dyn LabelResolver>) -> Self {
        self.labels = labels;
        self
    }

    /// Returns the active profile.
    pub fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    /// True once a backend has been loaded successfully.
    pub fn is_ready(&self) -> bool {
        self.backend.is_some()
    }

    /// The output encoding pinned at load time, if ready.
    pub fn encoding(&self) -> Option<OutputEncoding> {
        self.backend.as_ref().map(|backend| backend.encoding)
    }

    /// Attaches a backend, validates the profile against it, and pins the
    /// output encoding with one warm-up forward pass.
    ///
    /// The dummy input's values are irrelevant; only the output shape is
    /// inspected. On error the detector stays cold and a later call may
    /// retry with another backend.
    pub fn load(&mut self, engine: E) -> DetPostResult<()> {
        self.profile.validate()?;

        let mut session = engine.create_session()?;
        let dummy = vec![0.5f32; self.profile.input_len()];
        bind_input(&mut session, &self.profile, &dummy)?;

        let encoding = match &self.profile.heads {
            HeadLayout::Grid { heads } => {
                let first = &heads[0];
                let cls = session.output(&first.cls)?;
                let dis = session.output(&first.dis)?;
                if cls.channels() != self.profile.num_classes {
                    return Err(DetPostError::UnsupportedFormat {
                        channels: cls.channels(),
                        num_classes: self.profile.num_classes,
                    });
                }
                if dis.channels() != 4 * self.profile.reg_max {
                    return Err(DetPostError::UnsupportedFormat {
                        channels: dis.channels(),
                        num_classes: self.profile.num_classes,
                    });
                }
                OutputEncoding::Distribution {
                    reg_max: self.profile.reg_max,
                }
            }
            HeadLayout::Flat { outputs } => {
                let view = fetch_output(&session, outputs)?;
                let detected = detect_encoding(view.channels(), self.profile.num_classes)?;
                if let OutputEncoding::Distribution { reg_max } = detected.encoding {
                    warn!(
                        reg_max,
                        "flat distribution head decodes distances as absolute corners; \
                         verify the export's row semantics"
                    );
                    if reg_max != self.profile.reg_max {
                        debug!(
                            profile_reg_max = self.profile.reg_max,
                            derived_reg_max = reg_max,
                            "derived bin count overrides the profile"
                        );
                    }
                }
                detected.encoding
            }
        };

        info!(?encoding, "detector ready");
        self.backend = Some(ReadyBackend { engine, encoding });
        Ok(())
    }

    /// Runs post-processing for one frame.
    ///
    /// `input` is the preprocessed planar RGB tensor (`3 · target²`
    /// elements), `width`/`height` the original image dimensions, and
    /// `mapping` the exact transform the preprocessor applied. Returns
    /// detections ordered by descending score; an empty list is a valid
    /// result, not an error.
    pub fn detect(
        &self,
        input: &[f32],
        width: u32,
        height: u32,
        mapping: Mapping,
        passthrough: &Passthrough,
    ) -> DetPostResult<Vec<Detection>> {
        let backend = self.backend.as_ref().ok_or(DetPostError::NotReady)?;
        if width == 0 || height == 0 {
            return Err(DetPostError::InvalidImageSize { width, height });
        }
        let expected = self.profile.input_len();
        if input.len() != expected {
            return Err(DetPostError::BufferLengthMismatch {
                expected,
                got: input.len(),
            });
        }

        let mut session = backend.engine.create_session()?;
        bind_input(&mut session, &self.profile, input)?;

        let mut candidates = Vec::new();
        match &self.profile.heads {
            HeadLayout::Grid { heads } => {
                for head in heads {
                    let cls = session.output(&head.cls)?;
                    let dis = session.output(&head.dis)?;
                    let decoded = decode_grid_head(&cls, &dis, head.stride, &self.profile)?;
                    debug!(
                        stride = head.stride,
                        candidates = decoded.len(),
                        "decoded grid head"
                    );
                    candidates.extend(decoded);
                }
            }
            HeadLayout::Flat { outputs } => {
                let view = fetch_output(&session, outputs)?;
                let decoded = match backend.encoding {
                    OutputEncoding::DirectCoords => decode_direct(&view, &self.profile)?,
                    OutputEncoding::Distribution { reg_max } => {
                        decode_flat_distribution(&view, reg_max, &self.profile)?
                    }
                };
                debug!(candidates = decoded.len(), "decoded flat head");
                candidates.extend(decoded);
            }
        }

        let raw = candidates.len();
        let kept = nms_boxes(
            &mut candidates,
            self.profile.nms_threshold,
            self.profile.nms_mode,
        );

        let mapper = CoordMapper::new(width, height, self.profile.target_size, mapping);
        let mut detections = Vec::with_capacity(kept.len());
        for survivor in &kept {
            let Some(mapped) = mapper.map(survivor) else {
                continue;
            };
            detections.push(Detection {
                x1: mapped.x1,
                y1: mapped.y1,
                x2: mapped.x2,
                y2: mapped.y2,
                score: mapped.score,
                label: mapped.label,
                label_name: self.labels.name(mapped.label).to_owned(),
                code: self.labels.code(mapped.label).map(str::to_owned),
                passthrough: passthrough.clone(),
            });
        }

        debug!(
            raw,
            kept = kept.len(),
            detections = detections.len(),
            "frame decoded"
        );
        Ok(detections)
    }
}

/// Binds `data` under the first input name the backend accepts.
fn bind_input<S: InferenceSession>(
    session: &mut S,
    profile: &ModelProfile,
    data: &[f32],
) -> DetPostResult<()> {
    let target = profile.target_size as usize;
    for name in &profile.inputs {
        if session.set_input(name, data, 3, target, target).is_ok() {
            return Ok(());
        }
    }
    Err(EngineError::UnknownInput {
        name: profile.inputs.join("|"),
    }
    .into())
}

/// Fetches the first output name the backend exposes.
fn fetch_output<'s, S: InferenceSession>(
    session: &'s S,
    names: &[String],
) -> DetPostResult<TensorView<'s>> {
    for name in names {
        if let Ok(view) = session.output(name) {
            return Ok(view);
        }
    }
    Err(EngineError::UnknownOutput {
        name: names.join("|"),
    }
    .into())
}
