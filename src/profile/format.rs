//! Output-encoding classification from tensor shape.
//!
//! Published detector exports disagree on head layout: some emit
//! `[cx, cy, w, h, class…]` rows, others emit four distance distributions
//! followed by class logits. The per-site channel count is enough to tell
//! them apart, so classification runs once per model during warm-up and the
//! result is cached for the lifetime of the detector.

use crate::util::{DetPostError, DetPostResult};
use tracing::warn;

/// How one output row encodes a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputEncoding {
    /// `[cx, cy, w, h, class_logits…]` per row.
    DirectCoords,
    /// Four `reg_max`-bin distance distributions, then class logits.
    Distribution {
        /// Number of distance bins per box side.
        reg_max: usize,
    },
}

/// Result of encoding classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectedEncoding {
    /// The encoding to decode with.
    pub encoding: OutputEncoding,
    /// True when no rule matched and the direct-coordinate fallback applies.
    pub fallback: bool,
}

/// Classifies a flat output head from its per-site channel count.
///
/// With `N = num_classes`:
/// - `C == 4 + N` is [`OutputEncoding::DirectCoords`];
/// - `C > 4 + N` with `(C − N)` divisible by 4 is
///   [`OutputEncoding::Distribution`] with `reg_max = (C − N) / 4`, the
///   smallest bin count consistent with `C`;
/// - any other `C > 4 + N` falls back to direct coordinates and logs the
///   decision;
/// - `C < 4 + N` cannot hold a box and is rejected.
pub fn detect_encoding(channels: usize, num_classes: usize) -> DetPostResult<DetectedEncoding> {
    let direct = num_classes + 4;
    if channels == direct {
        return Ok(DetectedEncoding {
            encoding: OutputEncoding::DirectCoords,
            fallback: false,
        });
    }
    if channels < direct {
        return Err(DetPostError::UnsupportedFormat {
            channels,
            num_classes,
        });
    }
    let box_channels = channels - num_classes;
    if box_channels % 4 == 0 {
        return Ok(DetectedEncoding {
            encoding: OutputEncoding::Distribution {
                reg_max: box_channels / 4,
            },
            fallback: false,
        });
    }
    warn!(
        channels,
        num_classes, "output shape matches no known encoding, assuming direct coordinates"
    );
    Ok(DetectedEncoding {
        encoding: OutputEncoding::DirectCoords,
        fallback: true,
    })
}
