//! Noise removal: spatial median and temporal median.
//!
//! Both collect the in-bounds taps of a square window, sort each channel
//! independently and keep the element at `count / 2`. Border windows are
//! smaller, never padded.

use crate::error::{Error, Result};
use crate::executor::ParallelExecutor;
use crate::image::{PixelBuffer, Rgb};

use super::core::{coords, Window};

/// Per-channel median of the collected samples.
fn channel_median(reds: &mut [u8], greens: &mut [u8], blues: &mut [u8]) -> Rgb {
    reds.sort_unstable();
    greens.sort_unstable();
    blues.sort_unstable();
    let mid = reds.len() / 2;
    Rgb::new(reds[mid], greens[mid], blues[mid])
}

/// Shared window walk for one or more source frames.
fn median_of_frames(
    image: &mut PixelBuffer,
    frames: &[&PixelBuffer],
    filter_size: usize,
    executor: &ParallelExecutor,
) -> Result<()> {
    let window = Window::new(filter_size)?;
    let (width, height) = (image.width(), image.height());
    let capacity = window.taps() * frames.len();

    executor.run(image.pixels_mut(), |start, chunk| {
        let mut reds = Vec::with_capacity(capacity);
        let mut greens = Vec::with_capacity(capacity);
        let mut blues = Vec::with_capacity(capacity);

        for (offset, px) in chunk.iter_mut().enumerate() {
            let (x, y) = coords(start + offset, width);
            reds.clear();
            greens.clear();
            blues.clear();
            for (_, nx, ny) in window.neighbors(x, y, width, height) {
                for frame in frames {
                    let s = frame.get(nx, ny);
                    reds.push(s.r);
                    greens.push(s.g);
                    blues.push(s.b);
                }
            }
            *px = channel_median(&mut reds, &mut greens, &mut blues);
        }
    });
    Ok(())
}

/// Median filter over a `filter_size` x `filter_size` window.
///
/// # Arguments
/// * `image` - Image to filter in place
/// * `filter_size` - Window side length (>= 1; 1 leaves the image unchanged)
pub fn median(
    image: &mut PixelBuffer,
    filter_size: usize,
    executor: &ParallelExecutor,
) -> Result<()> {
    let source = image.clone();
    median_of_frames(image, &[&source], filter_size, executor)
}

/// Median across the same window in every frame of a sequence.
///
/// The result overwrites `image`; `frames` are only read. All frames must
/// share the dimensions of `image`.
pub fn temporal_median(
    image: &mut PixelBuffer,
    frames: &[PixelBuffer],
    filter_size: usize,
    executor: &ParallelExecutor,
) -> Result<()> {
    if frames.is_empty() {
        return Err(Error::parameter("temporal median needs at least one frame"));
    }
    for frame in frames {
        image.ensure_same_size(frame, "frame")?;
    }
    log::debug!("temporal median over {} frame(s)", frames.len());

    let refs: Vec<&PixelBuffer> = frames.iter().collect();
    median_of_frames(image, &refs, filter_size, executor)
}
