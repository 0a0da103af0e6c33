//! In-memory RGB image buffer.
//!
//! A [`PixelBuffer`] owns a contiguous, row-major array of [`Rgb`] pixels with
//! its origin at the top-left corner. The declared [`BitDepth`] only matters
//! when the buffer is written to disk; in memory every pixel carries three
//! 8-bit channels.

use std::path::Path;

use ndarray::{Array3, ArrayView3};

use crate::error::{Error, Result};

/// A single pixel with three 8-bit channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub const fn gray(v: u8) -> Self {
        Rgb { r: v, g: v, b: v }
    }

    /// Channels widened to f64, in r, g, b order.
    #[inline]
    pub fn to_f64(self) -> [f64; 3] {
        [self.r as f64, self.g as f64, self.b as f64]
    }

    /// Luma `0.299R + 0.587G + 0.114B`.
    #[inline]
    pub fn luma(self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }

    /// Integer luma in thousandths, exact for gray pixels.
    #[inline]
    pub fn luma_u8(self) -> u8 {
        ((299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32) / 1000) as u8
    }
}

/// Bits per pixel of the on-disk representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// 8-bit palette indices.
    Indexed8,
    /// 24-bit BGR triples.
    Rgb24,
    /// 32-bit BGRX quads.
    Rgb32,
}

impl BitDepth {
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(BitDepth::Indexed8),
            24 => Some(BitDepth::Rgb24),
            32 => Some(BitDepth::Rgb32),
            _ => None,
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Indexed8 => 8,
            BitDepth::Rgb24 => 24,
            BitDepth::Rgb32 => 32,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        self.bits() as usize / 8
    }
}

/// Owned RGB image. `Clone` produces an independent deep copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    bit_depth: BitDepth,
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    /// Create a black image of the given size.
    pub fn new(bit_depth: BitDepth, width: usize, height: usize) -> Result<Self> {
        Self::filled(bit_depth, width, height, Rgb::BLACK)
    }

    /// Create an image with every pixel set to `color`.
    pub fn filled(bit_depth: BitDepth, width: usize, height: usize, color: Rgb) -> Result<Self> {
        let len = checked_len(width, height)?;
        Ok(PixelBuffer {
            bit_depth,
            width,
            height,
            pixels: vec![color; len],
        })
    }

    /// Wrap an existing row-major pixel vector.
    pub fn from_pixels(
        bit_depth: BitDepth,
        width: usize,
        height: usize,
        pixels: Vec<Rgb>,
    ) -> Result<Self> {
        let len = checked_len(width, height)?;
        if pixels.len() != len {
            return Err(Error::parameter(format!(
                "expected {len} pixels for {width}x{height}, got {}",
                pixels.len()
            )));
        }
        Ok(PixelBuffer {
            bit_depth,
            width,
            height,
            pixels,
        })
    }

    /// Build a 24-bit buffer from an (height, width, channels) array.
    ///
    /// One channel is replicated to gray, three are taken as RGB and a fourth
    /// (alpha) channel is ignored.
    pub fn from_array(input: ArrayView3<u8>) -> Result<Self> {
        let (height, width, channels) = input.dim();
        if !matches!(channels, 1 | 3 | 4) {
            return Err(Error::parameter(format!(
                "expected 1, 3 or 4 channels, got {channels}"
            )));
        }
        let mut buffer = Self::new(BitDepth::Rgb24, width, height)?;
        for y in 0..height {
            for x in 0..width {
                let px = if channels == 1 {
                    Rgb::gray(input[[y, x, 0]])
                } else {
                    Rgb::new(input[[y, x, 0]], input[[y, x, 1]], input[[y, x, 2]])
                };
                buffer.set(x, y, px);
            }
        }
        Ok(buffer)
    }

    /// Copy into a (height, width, 3) array.
    pub fn to_array(&self) -> Array3<u8> {
        let mut output = Array3::<u8>::zeros((self.height, self.width, 3));
        for y in 0..self.height {
            for x in 0..self.width {
                let px = self.get(x, y);
                output[[y, x, 0]] = px.r;
                output[[y, x, 1]] = px.g;
                output[[y, x, 2]] = px.b;
            }
        }
        output
    }

    /// Read a bitmap file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::bmp::read(path)
    }

    /// Write this image as a bitmap file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::bmp::write(path, self)
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn set_bit_depth(&mut self, bit_depth: BitDepth) {
        self.bit_depth = bit_depth;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total pixel count.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.pixels[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, px: Rgb) {
        let i = self.index(x, y);
        self.pixels[i] = px;
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<Rgb> {
        self.pixels
    }

    pub fn same_size(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub(crate) fn ensure_same_size(&self, other: &PixelBuffer, what: &str) -> Result<()> {
        if self.same_size(other) {
            Ok(())
        } else {
            Err(Error::parameter(format!(
                "{what} is {}x{}, expected {}x{}",
                other.width, other.height, self.width, self.height
            )))
        }
    }

    /// Nearest-neighbour rescale to `width` x `height`.
    ///
    /// Source coordinates are `floor(i / scale)` with
    /// `scale = (new - 1) / (old - 1)` per axis.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let len = checked_len(width, height)?;
        let scale_x = axis_scale(width, self.width);
        let scale_y = axis_scale(height, self.height);

        let mut pixels = Vec::with_capacity(len);
        for y in 0..height {
            let sy = source_coord(y, scale_y, self.height);
            for x in 0..width {
                let sx = source_coord(x, scale_x, self.width);
                pixels.push(self.get(sx, sy));
            }
        }

        self.width = width;
        self.height = height;
        self.pixels = pixels;
        Ok(())
    }

    /// Crop to the rectangle at (`x`, `y`) of size `width` x `height`.
    pub fn clip(&mut self, x: usize, y: usize, width: usize, height: usize) -> Result<()> {
        let len = checked_len(width, height)?;
        let fits = x.checked_add(width).is_some_and(|r| r <= self.width)
            && y.checked_add(height).is_some_and(|b| b <= self.height);
        if !fits {
            return Err(Error::parameter(format!(
                "clip rectangle {width}x{height}+{x}+{y} exceeds {}x{} image",
                self.width, self.height
            )));
        }

        let mut pixels = Vec::with_capacity(len);
        for row in y..y + height {
            let start = self.index(x, row);
            pixels.extend_from_slice(&self.pixels[start..start + width]);
        }

        self.width = width;
        self.height = height;
        self.pixels = pixels;
        Ok(())
    }
}

fn checked_len(width: usize, height: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::parameter(format!(
            "image dimensions must be positive, got {width}x{height}"
        )));
    }
    width
        .checked_mul(height)
        .ok_or_else(|| Error::parameter(format!("image too large: {width}x{height}")))
}

fn axis_scale(new: usize, old: usize) -> f64 {
    if new <= 1 || old <= 1 {
        return 0.0;
    }
    (new - 1) as f64 / (old - 1) as f64
}

fn source_coord(i: usize, scale: f64, old: usize) -> usize {
    if scale == 0.0 {
        return 0;
    }
    ((i as f64 / scale) as usize).min(old - 1)
}
