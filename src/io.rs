//! Reference preprocessing built on the `image` crate.
//!
//! Available when the `image-io` feature is enabled. This is the
//! collaborator side of the coordinate contract: it produces the normalized
//! planar input tensor and reports the exact [`Mapping`] the pipeline needs
//! to bring boxes back into image space.

use crate::coords::{letterbox_params, Mapping, ResizePolicy};
use crate::profile::ModelProfile;
use crate::util::{DetPostError, DetPostResult};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::path::Path;

/// Loads an image from disk and converts it to RGB.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> DetPostResult<RgbImage> {
    let img = image::open(path).map_err(|err| DetPostError::ImageIo {
        reason: err.to_string(),
    })?;
    Ok(img.to_rgb8())
}

/// Resizes and normalizes an image into the model's planar input tensor.
///
/// `RatioScale` stretches to the square canvas; `Letterbox` preserves the
/// aspect ratio and zero-fills the borders before normalization, so padding
/// enters the network as `(0 − mean) · norm`. Per-channel normalization is
/// `(value − mean[c]) · norm[c]` in RGB order. Returns the tensor together
/// with the mapping that inverts the transform.
pub fn preprocess_rgb(
    img: &RgbImage,
    profile: &ModelProfile,
    policy: ResizePolicy,
) -> DetPostResult<(Vec<f32>, Mapping)> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(DetPostError::InvalidImageSize { width, height });
    }
    let target = profile.target_size;

    let (canvas, mapping) = match policy {
        ResizePolicy::RatioScale => {
            let canvas = imageops::resize(img, target, target, FilterType::Triangle);
            (canvas, Mapping::RatioScale)
        }
        ResizePolicy::Letterbox => {
            let (scale, scaled_w, scaled_h, pad_x, pad_y) =
                letterbox_params(width, height, target);
            let resized = imageops::resize(img, scaled_w, scaled_h, FilterType::Triangle);
            let mut canvas = RgbImage::new(target, target);
            imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);
            let mapping = Mapping::Letterbox {
                scale,
                pad_x: pad_x as f32,
                pad_y: pad_y as f32,
            };
            (canvas, mapping)
        }
    };

    let plane = (target as usize) * (target as usize);
    let mut tensor = vec![0.0f32; profile.input_len()];
    for (idx, pixel) in canvas.pixels().enumerate() {
        for channel in 0..3 {
            tensor[channel * plane + idx] =
                (pixel.0[channel] as f32 - profile.mean[channel]) * profile.norm[channel];
        }
    }
    Ok((tensor, mapping))
}
