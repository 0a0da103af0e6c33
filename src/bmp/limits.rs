//! Caps on the size of decoded images.

use std::mem::size_of;

use crate::error::{FormatError, Result};
use crate::image::Rgb;

/// Resource limits applied while decoding.
///
/// All fields default to `None` (no limit). Without limits the decoder still
/// never allocates more than the pixel data actually present in the stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for the decoded pixel buffer.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = Some(max_pixels);
        self
    }

    pub fn with_max_memory_bytes(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Check image dimensions and the in-memory size they imply.
    pub(crate) fn check(&self, width: u64, height: u64) -> Result<()> {
        if let Some(max_w) = self.max_width {
            if width > max_w {
                return Err(exceeded(format!("width {width} exceeds limit {max_w}")));
            }
        }
        if let Some(max_h) = self.max_height {
            if height > max_h {
                return Err(exceeded(format!("height {height} exceeds limit {max_h}")));
            }
        }
        let pixels = width.saturating_mul(height);
        if let Some(max_px) = self.max_pixels {
            if pixels > max_px {
                return Err(exceeded(format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        if let Some(max_mem) = self.max_memory_bytes {
            let bytes = pixels.saturating_mul(size_of::<Rgb>() as u64);
            if bytes > max_mem {
                return Err(exceeded(format!(
                    "allocation {bytes} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }
}

fn exceeded(msg: String) -> crate::error::Error {
    FormatError::LimitExceeded(msg).into()
}
