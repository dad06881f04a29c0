//! Class-index to display-name resolution.
//!
//! Resolution never fails: unmapped indices resolve to [`UNKNOWN_LABEL`] so
//! a missing table entry cannot abort a detection pass. Deployment-specific
//! taxonomies plug in through the trait; only the standard COCO table ships
//! with the crate.

/// Name returned for any class index without a table entry.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Maps class indices to display names and optional business codes.
pub trait LabelResolver {
    /// Display name for a class index; never fails.
    fn name(&self, class_index: usize) -> &str;

    /// Optional alternate business code for a class index.
    fn code(&self, class_index: usize) -> Option<&str> {
        let _ = class_index;
        None
    }
}

/// The 80 COCO class names in index order.
pub const COCO_NAMES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Resolver over the standard COCO-80 table.
#[derive(Clone, Copy, Debug, Default)]
pub struct CocoLabels;

impl LabelResolver for CocoLabels {
    fn name(&self, class_index: usize) -> &str {
        COCO_NAMES.get(class_index).copied().unwrap_or(UNKNOWN_LABEL)
    }
}

/// Resolver over caller-supplied tables.
///
/// Hosts load deployment taxonomies (names, optionally business codes per
/// index) and hand them over; indices past either table resolve to the
/// defaults.
#[derive(Clone, Debug, Default)]
pub struct StaticLabels {
    names: Vec<String>,
    codes: Vec<Option<String>>,
}

impl StaticLabels {
    /// Creates a resolver from a name table.
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            codes: Vec::new(),
        }
    }

    /// Attaches a business-code table aligned with the name table.
    pub fn with_codes(mut self, codes: Vec<Option<String>>) -> Self {
        self.codes = codes;
        self
    }
}

impl LabelResolver for StaticLabels {
    fn name(&self, class_index: usize) -> &str {
        self.names
            .get(class_index)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    fn code(&self, class_index: usize) -> Option<&str> {
        self.codes
            .get(class_index)
            .and_then(|code| code.as_deref())
    }
}
