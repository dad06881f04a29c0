//! Tensor views over raw detector outputs.
//!
//! `TensorView` is a borrowed, bounds-checked view into a flat `f32` buffer
//! holding one output head. The layout is site-major: the channel vector of
//! each spatial position is contiguous, and consecutive sites start `stride`
//! elements apart, so a stride larger than the channel count represents
//! padded sites. Flat (anchor-free) outputs are expressed with
//! `height = candidate count` and `width = 1`.

use crate::util::{DetPostError, DetPostResult};

/// Borrowed site-major tensor view with an explicit stride.
#[derive(Copy, Clone)]
pub struct TensorView<'a> {
    data: &'a [f32],
    channels: usize,
    height: usize,
    width: usize,
    stride: usize,
}

impl<'a> TensorView<'a> {
    /// Creates a contiguous view with `stride == channels`.
    pub fn from_slice(
        data: &'a [f32],
        channels: usize,
        height: usize,
        width: usize,
    ) -> DetPostResult<Self> {
        Self::new(data, channels, height, width, channels)
    }

    /// Creates a view with an explicit site stride.
    pub fn new(
        data: &'a [f32],
        channels: usize,
        height: usize,
        width: usize,
        stride: usize,
    ) -> DetPostResult<Self> {
        let needed = required_len(channels, height, width, stride)?;
        if data.len() < needed {
            return Err(DetPostError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            channels,
            height,
            width,
            stride,
        })
    }

    /// Returns the per-site channel count.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the spatial height (rows, or candidate count for flat heads).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the spatial width (columns, 1 for flat heads).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the stride in elements between site starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the number of sites (`height * width`).
    pub fn sites(&self) -> usize {
        self.height * self.width
    }

    /// Returns the backing slice including any site padding.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns the channel vector of the site at `(row, col)`.
    pub fn site(&self, row: usize, col: usize) -> Option<&'a [f32]> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.site_at(row.checked_mul(self.width)?.checked_add(col)?)
    }

    /// Returns the channel vector of the site with flat index `index`.
    pub fn site_at(&self, index: usize) -> Option<&'a [f32]> {
        if index >= self.sites() {
            return None;
        }
        let start = index.checked_mul(self.stride)?;
        let end = start.checked_add(self.channels)?;
        self.data.get(start..end)
    }

    /// Returns one channel value at `(channel, row, col)` if in bounds.
    pub fn get(&self, channel: usize, row: usize, col: usize) -> Option<f32> {
        if channel >= self.channels {
            return None;
        }
        self.site(row, col).map(|site| site[channel])
    }
}

/// Owned tensor backing store.
///
/// Replay engines and test fixtures keep decoded dumps in `OwnedTensor`s and
/// hand out [`TensorView`]s borrowed from them.
#[derive(Clone, Debug)]
pub struct OwnedTensor {
    data: Vec<f32>,
    channels: usize,
    height: usize,
    width: usize,
}

impl OwnedTensor {
    /// Creates an owned tensor, requiring an exactly-sized buffer.
    pub fn from_vec(
        data: Vec<f32>,
        channels: usize,
        height: usize,
        width: usize,
    ) -> DetPostResult<Self> {
        let expected = required_len(channels, height, width, channels)?;
        if data.len() != expected {
            return Err(DetPostError::BufferLengthMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            channels,
            height,
            width,
        })
    }

    /// Returns the per-site channel count.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the spatial height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the spatial width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the backing data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns a contiguous borrowed view of the whole tensor.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            data: &self.data,
            channels: self.channels,
            height: self.height,
            width: self.width,
            stride: self.channels,
        }
    }
}

fn required_len(
    channels: usize,
    height: usize,
    width: usize,
    stride: usize,
) -> DetPostResult<usize> {
    if channels == 0 || height == 0 || width == 0 {
        return Err(DetPostError::InvalidDimensions {
            channels,
            height,
            width,
        });
    }
    if stride < channels {
        return Err(DetPostError::InvalidStride { channels, stride });
    }
    let sites = height
        .checked_mul(width)
        .ok_or(DetPostError::InvalidDimensions {
            channels,
            height,
            width,
        })?;
    let needed = (sites - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(channels))
        .ok_or(DetPostError::InvalidDimensions {
            channels,
            height,
            width,
        })?;
    Ok(needed)
}
