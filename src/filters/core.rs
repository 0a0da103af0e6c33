//! Core utilities shared by the filters.
//!
//! This module provides:
//! - Gaussian kernel generation (separable 1D and 2D spatial)
//! - Square sampling windows with bounds-checked neighbour lookup
//! - Channel clamping and lookup-table application
//! - Parameter validation

use crate::error::{Error, Result};
use crate::executor::ParallelExecutor;
use crate::image::{PixelBuffer, Rgb};

/// Generate a normalized 1D Gaussian kernel of `size` taps.
///
/// Tap `j` has weight `exp(-(j - size/2)^2 / sigma)` before normalization,
/// so the returned weights sum to 1.
pub fn gaussian_kernel_1d(size: usize, sigma: f64) -> Result<Vec<f64>> {
    require_filter_size(size)?;
    require_positive("sigma", sigma)?;

    let half = (size / 2) as f64;
    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - half;
            (-x * x / sigma).exp()
        })
        .collect();

    // Normalize
    let sum: f64 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }

    Ok(kernel)
}

/// Generate the spatial weights of a `size` x `size` window.
///
/// Row-major, tap `(dx, dy)` has weight `exp(-(dx^2 + dy^2) / (2 sigma^2))`.
/// Not normalized; edge-preserving filters normalize per pixel.
pub fn spatial_kernel_2d(size: usize, sigma: f64) -> Result<Vec<f64>> {
    let window = Window::new(size)?;
    require_positive("sigma", sigma)?;

    let denom = 2.0 * sigma * sigma;
    Ok((0..window.taps())
        .map(|j| {
            let (dx, dy) = window.offset(j);
            (-((dx * dx + dy * dy) as f64) / denom).exp()
        })
        .collect())
}

/// Square sampling window centred on a pixel.
///
/// Taps are numbered row-major; tap `j` sits at
/// `(j % size - size/2, j / size - size/2)`. Even sizes extend one tap
/// further left/up than right/down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    size: usize,
    half: isize,
}

impl Window {
    pub fn new(size: usize) -> Result<Self> {
        require_filter_size(size)?;
        Ok(Window {
            size,
            half: (size / 2) as isize,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn taps(&self) -> usize {
        self.size * self.size
    }

    #[inline]
    pub fn offset(&self, tap: usize) -> (isize, isize) {
        (
            (tap % self.size) as isize - self.half,
            (tap / self.size) as isize - self.half,
        )
    }

    /// In-bounds taps around (`x`, `y`) as `(tap, nx, ny)`.
    ///
    /// Out-of-bounds taps are skipped, so border windows shrink.
    pub fn neighbors(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..self.taps()).filter_map(move |tap| {
            let (dx, dy) = self.offset(tap);
            let nx = offset_coord(x, dx, width)?;
            let ny = offset_coord(y, dy, height)?;
            Some((tap, nx, ny))
        })
    }
}

/// `base + delta` if it lies in `[0, limit)`.
#[inline]
pub fn offset_coord(base: usize, delta: isize, limit: usize) -> Option<usize> {
    let v = base as isize + delta;
    if v < 0 || v >= limit as isize {
        None
    } else {
        Some(v as usize)
    }
}

/// Split a linear pixel index into (x, y).
#[inline]
pub fn coords(index: usize, width: usize) -> (usize, usize) {
    (index % width, index / width)
}

/// Clamp to [0, 255] and truncate toward zero.
#[inline]
pub fn clamp_u8(v: f64) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

/// Clamp to [0, 255] and round to nearest.
#[inline]
pub fn round_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Truncate each channel of a wide RGB accumulator.
#[inline]
pub fn clamp_rgb(v: [f64; 3]) -> Rgb {
    Rgb::new(clamp_u8(v[0]), clamp_u8(v[1]), clamp_u8(v[2]))
}

/// Build a 256-entry table from `f`, clamping and truncating each entry.
pub fn build_lut(f: impl Fn(f64) -> f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = clamp_u8(f(i as f64));
    }
    lut
}

/// Map every channel of every pixel through `lut`.
pub fn apply_lut(image: &mut PixelBuffer, lut: &[u8; 256], executor: &ParallelExecutor) {
    executor.run(image.pixels_mut(), |_, chunk| {
        for px in chunk {
            *px = Rgb::new(lut[px.r as usize], lut[px.g as usize], lut[px.b as usize]);
        }
    });
}

pub fn require_filter_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(Error::parameter("filter size must be at least 1"));
    }
    Ok(())
}

pub fn require_positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(Error::parameter(format!(
            "{name} must be a positive number, got {value}"
        )));
    }
    Ok(())
}
