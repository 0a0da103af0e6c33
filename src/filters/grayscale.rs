//! Monochrome and binarize filters.
//!
//! Both reduce a pixel to its luma `0.299R + 0.587G + 0.114B`, truncated to
//! an integer, and are applied pointwise across all workers.

use crate::executor::ParallelExecutor;
use crate::image::{PixelBuffer, Rgb};

/// Replace every pixel by its luma in all three channels.
pub fn monochrome(image: &mut PixelBuffer, executor: &ParallelExecutor) {
    executor.run(image.pixels_mut(), |_, chunk| {
        for px in chunk {
            *px = Rgb::gray(px.luma() as u8);
        }
    });
}

/// Pixels with luma above `threshold` become white, the rest black.
pub fn binarize(image: &mut PixelBuffer, threshold: u8, executor: &ParallelExecutor) {
    executor.run(image.pixels_mut(), |_, chunk| {
        for px in chunk {
            *px = if px.luma() as u8 > threshold {
                Rgb::WHITE
            } else {
                Rgb::BLACK
            };
        }
    });
}
