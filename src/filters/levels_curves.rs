//! Histogram-based tonal filters: equalization and extension (stretch).
//!
//! Both scan the whole image once to build a lookup table, then apply the
//! table pointwise in parallel.

use crate::executor::ParallelExecutor;
use crate::image::{PixelBuffer, Rgb};

use super::core::{apply_lut, build_lut, clamp_u8};
use super::grayscale::monochrome;

/// Count red-channel values.
fn red_histogram(image: &PixelBuffer) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for px in image.pixels() {
        hist[px.r as usize] += 1;
    }
    hist
}

/// Equalize the histogram of the red channel and write the result to all
/// three channels, so the output is grayscale.
///
/// `LUT[i] = 255 * (cdf[i] - cdf_min) / (N - cdf_min)` where `cdf_min` is
/// the cumulative count at the lowest occupied bin. An image with a single
/// red value keeps that value.
pub fn histogram_equalization(image: &mut PixelBuffer, executor: &ParallelExecutor) {
    let hist = red_histogram(image);
    let total = image.len() as u64;
    let cdf_min = hist.iter().copied().find(|&n| n > 0).unwrap_or(0);

    let mut lut = [0u8; 256];
    if total == cdf_min {
        for (i, v) in lut.iter_mut().enumerate() {
            *v = i as u8;
        }
    } else {
        let range = (total - cdf_min) as f64;
        let mut cdf = 0u64;
        for (v, &n) in lut.iter_mut().zip(hist.iter()) {
            cdf += n;
            *v = clamp_u8(255.0 * cdf.saturating_sub(cdf_min) as f64 / range);
        }
    }

    executor.run(image.pixels_mut(), |_, chunk| {
        for px in chunk {
            *px = Rgb::gray(lut[px.r as usize]);
        }
    });
}

/// Stretch the luma range `[min, max]` of the image to `[0, 255]`.
///
/// The bounds come from a monochrome copy; the same linear map is applied to
/// every channel of the input. A flat image is left unchanged.
pub fn histogram_extension(image: &mut PixelBuffer, executor: &ParallelExecutor) {
    let mut mono = image.clone();
    monochrome(&mut mono, executor);

    let (min, max) = mono
        .pixels()
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), px| (lo.min(px.r), hi.max(px.r)));
    if max <= min {
        return;
    }

    let scale = 255.0 / (max - min) as f64;
    let lut = build_lut(|v| scale * (v - min as f64));
    apply_lut(image, &lut, executor);
}
