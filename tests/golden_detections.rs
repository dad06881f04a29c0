//! Integration tests validating the detector against golden JSON cases.
//!
//! Each case plants confident cells in a small grid head, runs the full
//! replay pipeline, and checks the resulting detections against stored
//! expectations within coordinate and score tolerances.

use std::collections::BTreeMap;
use std::sync::Arc;

use detpost::{
    Detector, EngineError, GridHead, HeadLayout, InferenceEngine, InferenceSession, Mapping,
    ModelProfile, NmsMode, OwnedTensor, Passthrough, TensorView,
};
use serde::Deserialize;

/// Coordinate tolerance in image pixels.
const COORD_TOLERANCE_PX: f32 = 0.05;

/// Score tolerance for post-sigmoid confidences.
const SCORE_TOLERANCE: f32 = 1e-4;

const GOLDEN_CASES: &str = r#"{
  "cases": [
    {
      "case_id": "single_confident_cell",
      "image_width": 320,
      "image_height": 320,
      "present": true,
      "cells": [
        { "row": 0, "col": 0, "class_index": 3, "class_logit": 4.0, "peak_bin": 2 }
      ],
      "expected": [
        {
          "x1": 0.0, "y1": 0.0, "x2": 20.0025, "y2": 20.0025,
          "score": 0.982014, "label": 3, "label_name": "motorcycle"
        }
      ]
    },
    {
      "case_id": "upscaled_frame",
      "image_width": 640,
      "image_height": 640,
      "present": true,
      "cells": [
        { "row": 0, "col": 0, "class_index": 3, "class_logit": 4.0, "peak_bin": 2 }
      ],
      "expected": [
        {
          "x1": 0.0, "y1": 0.0, "x2": 40.0051, "y2": 40.0051,
          "score": 0.982014, "label": 3, "label_name": "motorcycle"
        }
      ]
    },
    {
      "case_id": "two_cells_ranked_by_score",
      "image_width": 320,
      "image_height": 320,
      "present": true,
      "cells": [
        { "row": 20, "col": 20, "class_index": 0, "class_logit": 2.0, "peak_bin": 2 },
        { "row": 0, "col": 0, "class_index": 3, "class_logit": 4.0, "peak_bin": 2 }
      ],
      "expected": [
        {
          "x1": 0.0, "y1": 0.0, "x2": 20.0025, "y2": 20.0025,
          "score": 0.982014, "label": 3, "label_name": "motorcycle"
        },
        {
          "x1": 147.9975, "y1": 147.9975, "x2": 180.0025, "y2": 180.0025,
          "score": 0.880797, "label": 0, "label_name": "person"
        }
      ]
    },
    {
      "case_id": "quiet_frame",
      "image_width": 320,
      "image_height": 320,
      "present": false,
      "cells": [],
      "expected": []
    }
  ]
}"#;

/// Golden suite structure.
#[derive(Debug, Deserialize)]
struct GoldenSuite {
    cases: Vec<GoldenCase>,
}

/// One replay case: planted grid cells plus the detections they must yield.
#[derive(Debug, Deserialize)]
struct GoldenCase {
    case_id: String,
    image_width: u32,
    image_height: u32,
    #[serde(default)]
    present: bool,
    #[serde(default)]
    cells: Vec<PlantedCell>,
    #[serde(default)]
    expected: Vec<ExpectedDetection>,
}

/// A class peak planted at one grid site; all four side distributions are
/// peaked at `peak_bin`.
#[derive(Debug, Deserialize)]
struct PlantedCell {
    row: usize,
    col: usize,
    class_index: usize,
    class_logit: f32,
    peak_bin: usize,
}

/// Ground-truth detection in image-space coordinates.
#[derive(Debug, Deserialize)]
struct ExpectedDetection {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    label: usize,
    label_name: String,
}

/// Backend that replays canned output tensors for any input.
#[derive(Clone)]
struct ReplayEngine {
    input_name: &'static str,
    outputs: Arc<BTreeMap<String, OwnedTensor>>,
}

impl ReplayEngine {
    fn new(input_name: &'static str, outputs: BTreeMap<String, OwnedTensor>) -> Self {
        Self {
            input_name,
            outputs: Arc::new(outputs),
        }
    }
}

struct ReplaySession {
    input_name: &'static str,
    outputs: Arc<BTreeMap<String, OwnedTensor>>,
    bound: bool,
}

impl InferenceSession for ReplaySession {
    fn set_input(
        &mut self,
        name: &str,
        data: &[f32],
        channels: usize,
        height: usize,
        width: usize,
    ) -> Result<(), EngineError> {
        if name != self.input_name {
            return Err(EngineError::UnknownInput {
                name: name.to_owned(),
            });
        }
        if data.len() != channels * height * width {
            return Err(EngineError::Execution {
                reason: "input length does not match declared shape".to_owned(),
            });
        }
        self.bound = true;
        Ok(())
    }

    fn output(&self, name: &str) -> Result<TensorView<'_>, EngineError> {
        if !self.bound {
            return Err(EngineError::Execution {
                reason: "no input bound".to_owned(),
            });
        }
        self.outputs
            .get(name)
            .map(|tensor| tensor.view())
            .ok_or_else(|| EngineError::UnknownOutput {
                name: name.to_owned(),
            })
    }
}

impl InferenceEngine for ReplayEngine {
    type Session = ReplaySession;

    fn create_session(&self) -> Result<ReplaySession, EngineError> {
        Ok(ReplaySession {
            input_name: self.input_name,
            outputs: Arc::clone(&self.outputs),
            bound: false,
        })
    }
}

/// Single-head grid profile shared by all golden cases.
fn grid_profile() -> ModelProfile {
    ModelProfile {
        target_size: 320,
        mean: [0.0; 3],
        norm: [1.0; 3],
        num_classes: 80,
        reg_max: 7,
        conf_threshold: 0.5,
        nms_threshold: 0.5,
        nms_mode: NmsMode::PerClass,
        inputs: vec!["data".to_owned()],
        heads: HeadLayout::Grid {
            heads: vec![GridHead::new("cls8", "dis8", 8)],
        },
    }
}

/// Builds the canned grid-head tensors described by a case.
fn outputs_for(case: &GoldenCase) -> BTreeMap<String, OwnedTensor> {
    let sites = 40 * 40;
    let mut cls = vec![-10.0f32; sites * 80];
    let mut dis = vec![0.0f32; sites * 28];
    for cell in &case.cells {
        let site = cell.row * 40 + cell.col;
        cls[site * 80 + cell.class_index] = cell.class_logit;
        for side in 0..4 {
            dis[site * 28 + side * 7 + cell.peak_bin] = 10.0;
        }
    }

    let mut outputs = BTreeMap::new();
    outputs.insert("cls8".to_owned(), OwnedTensor::from_vec(cls, 80, 40, 40).unwrap());
    outputs.insert("dis8".to_owned(), OwnedTensor::from_vec(dis, 28, 40, 40).unwrap());
    outputs
}

/// Runs a single golden case through the full pipeline.
fn run_case(case: &GoldenCase) -> Result<(), String> {
    let mut detector = Detector::new(grid_profile());
    detector
        .load(ReplayEngine::new("data", outputs_for(case)))
        .map_err(|e| format!("load failed: {e}"))?;

    let input = vec![0.5f32; 3 * 320 * 320];
    let detections = detector
        .detect(
            &input,
            case.image_width,
            case.image_height,
            Mapping::RatioScale,
            &Passthrough::new(),
        )
        .map_err(|e| format!("detect failed: {e}"))?;

    if !case.present {
        if !detections.is_empty() {
            return Err(format!(
                "expected an empty frame, got {} detection(s)",
                detections.len()
            ));
        }
        return Ok(());
    }

    if detections.len() != case.expected.len() {
        return Err(format!(
            "expected {} detection(s), got {}",
            case.expected.len(),
            detections.len()
        ));
    }

    for (got, want) in detections.iter().zip(&case.expected) {
        if got.label != want.label {
            return Err(format!("label {} != expected {}", got.label, want.label));
        }
        if got.label_name != want.label_name {
            return Err(format!(
                "label name {:?} != expected {:?}",
                got.label_name, want.label_name
            ));
        }
        if (got.score - want.score).abs() > SCORE_TOLERANCE {
            return Err(format!(
                "score error: got {:.6}, expected {:.6}",
                got.score, want.score
            ));
        }
        let edges = [
            ("x1", got.x1, want.x1),
            ("y1", got.y1, want.y1),
            ("x2", got.x2, want.x2),
            ("y2", got.y2, want.y2),
        ];
        for (edge, got_v, want_v) in edges {
            if (got_v - want_v).abs() > COORD_TOLERANCE_PX {
                return Err(format!(
                    "{} error: got {:.4}, expected {:.4}",
                    edge, got_v, want_v
                ));
            }
        }
    }

    Ok(())
}

#[test]
fn golden_cases_match_within_tolerance() {
    let suite: GoldenSuite =
        serde_json::from_str(GOLDEN_CASES).expect("failed to parse golden cases");

    let mut failures: Vec<(String, String)> = vec![];
    for case in &suite.cases {
        match run_case(case) {
            Ok(()) => println!("PASS: {}", case.case_id),
            Err(e) => {
                println!("FAIL: {} - {}", case.case_id, e);
                failures.push((case.case_id.clone(), e));
            }
        }
    }

    if !failures.is_empty() {
        panic!("{} golden case(s) failed", failures.len());
    }
}
