use clap::Parser;
use detpost::io::{load_rgb_image, preprocess_rgb};
use detpost::{
    letterbox_mapping, Detection, Detector, EngineError, HeadLayout, InferenceEngine,
    InferenceSession, Mapping, ModelProfile, NmsMode, OwnedTensor, Passthrough, ResizePolicy,
    StaticLabels, TensorView,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "DetPost replay CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum ResizeConfig {
    RatioScale,
    Letterbox,
}

impl From<ResizeConfig> for ResizePolicy {
    fn from(value: ResizeConfig) -> Self {
        match value {
            ResizeConfig::RatioScale => ResizePolicy::RatioScale,
            ResizeConfig::Letterbox => ResizePolicy::Letterbox,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum NmsModeConfig {
    PerClass,
    ClassAgnostic,
}

impl From<NmsModeConfig> for NmsMode {
    fn from(value: NmsModeConfig) -> Self {
        match value {
            NmsModeConfig::PerClass => NmsMode::PerClass,
            NmsModeConfig::ClassAgnostic => NmsMode::ClassAgnostic,
        }
    }
}

/// One recorded output tensor with its declared shape.
#[derive(Debug, Deserialize)]
struct OutputSpec {
    path: String,
    channels: usize,
    height: usize,
    width: usize,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Config {
    model: String,
    image_path: Option<String>,
    image_width: u32,
    image_height: u32,
    resize: Option<ResizeConfig>,
    conf_threshold: Option<f32>,
    nms_threshold: Option<f32>,
    nms_mode: Option<NmsModeConfig>,
    labels_path: Option<String>,
    passthrough: Passthrough,
    outputs: BTreeMap<String, OutputSpec>,
    output_path: Option<String>,
}

/// Backend that replays recorded output tensors instead of running a model.
struct ReplayEngine {
    outputs: Arc<BTreeMap<String, OwnedTensor>>,
}

struct ReplaySession {
    outputs: Arc<BTreeMap<String, OwnedTensor>>,
}

impl InferenceSession for ReplaySession {
    fn set_input(
        &mut self,
        _name: &str,
        data: &[f32],
        channels: usize,
        height: usize,
        width: usize,
    ) -> Result<(), EngineError> {
        // A replay backend accepts any input name; only the shape is checked.
        if data.len() != channels * height * width {
            return Err(EngineError::Execution {
                reason: "input length does not match declared shape".to_owned(),
            });
        }
        Ok(())
    }

    fn output(&self, name: &str) -> Result<TensorView<'_>, EngineError> {
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
            outputs: Arc::clone(&self.outputs),
        })
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    x_center: f32,
    y_center: f32,
    score: f32,
    label: usize,
    label_name: String,
    code: Option<String>,
    passthrough: Passthrough,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        let (x_center, y_center) = value.center();
        Self {
            x1: value.x1,
            y1: value.y1,
            x2: value.x2,
            y2: value.y2,
            x_center,
            y_center,
            score: value.score,
            label: value.label,
            label_name: value.label_name,
            code: value.code,
            passthrough: value.passthrough,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    count: usize,
    detections: Vec<DetectionRecord>,
}

/// Grid exports shipped with plain ratio-scale preprocessing, flat exports
/// with letterboxing; used when the config does not pick a policy.
fn default_policy(profile: &ModelProfile) -> ResizePolicy {
    match profile.heads {
        HeadLayout::Grid { .. } => ResizePolicy::RatioScale,
        HeadLayout::Flat { .. } => ResizePolicy::Letterbox,
    }
}

/// Reads one tensor dump: a JSON number array for `.json` paths, raw
/// little-endian `f32` otherwise.
fn load_tensor(spec: &OutputSpec) -> Result<OwnedTensor, Box<dyn std::error::Error>> {
    let data = if spec.path.ends_with(".json") {
        serde_json::from_str::<Vec<f32>>(&fs::read_to_string(&spec.path)?)?
    } else {
        let bytes = fs::read(&spec.path)?;
        if bytes.len() % 4 != 0 {
            return Err(format!("{}: raw dump size is not a multiple of 4 bytes", spec.path).into());
        }
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    };
    Ok(OwnedTensor::from_vec(
        data,
        spec.channels,
        spec.height,
        spec.width,
    )?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("detpost=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.model.is_empty() {
        return Err("model must be set in the config".into());
    }
    if config.outputs.is_empty() {
        return Err("at least one output dump must be configured".into());
    }

    let mut profile = ModelProfile::named(&config.model)
        .ok_or_else(|| format!("unknown model id: {}", config.model))?;
    if let Some(conf) = config.conf_threshold {
        profile = profile.with_conf_threshold(conf);
    }
    if let Some(nms) = config.nms_threshold {
        profile = profile.with_nms_threshold(nms);
    }
    if let Some(mode) = config.nms_mode {
        profile = profile.with_nms_mode(mode.into());
    }

    let mut dumps = BTreeMap::new();
    for (name, spec) in &config.outputs {
        dumps.insert(name.clone(), load_tensor(spec)?);
    }
    let engine = ReplayEngine {
        outputs: Arc::new(dumps),
    };

    let mut detector = Detector::new(profile);
    if let Some(path) = &config.labels_path {
        let names: Vec<String> = fs::read_to_string(path)?
            .lines()
            .map(|line| line.trim().to_owned())
            .filter(|line| !line.is_empty())
            .collect();
        detector = detector.with_labels(Box::new(StaticLabels::new(names)));
    }
    detector.load(engine)?;

    let profile = detector.profile();
    let policy = match config.resize {
        Some(resize) => resize.into(),
        None => default_policy(profile),
    };

    let (input, width, height, mapping) = match &config.image_path {
        Some(path) => {
            let img = load_rgb_image(path)?;
            let (width, height) = img.dimensions();
            let (input, mapping) = preprocess_rgb(&img, profile, policy)?;
            (input, width, height, mapping)
        }
        None => {
            if config.image_width == 0 || config.image_height == 0 {
                return Err(
                    "image_width and image_height must be set when image_path is absent".into(),
                );
            }
            let mapping = match policy {
                ResizePolicy::RatioScale => Mapping::RatioScale,
                ResizePolicy::Letterbox => letterbox_mapping(
                    config.image_width,
                    config.image_height,
                    profile.target_size,
                ),
            };
            (
                vec![0.0f32; profile.input_len()],
                config.image_width,
                config.image_height,
                mapping,
            )
        }
    };

    let detections = detector.detect(&input, width, height, mapping, &config.passthrough)?;
    info!(count = detections.len(), "replay complete");

    let records: Vec<DetectionRecord> = detections.into_iter().map(DetectionRecord::from).collect();
    let output = Output {
        count: records.len(),
        detections: records,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
