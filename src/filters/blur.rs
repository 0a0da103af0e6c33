//! Smoothing filters: average (box) and Gaussian.
//!
//! Both run as two separable passes, horizontal then vertical, through a
//! wide `f64` intermediate buffer. Taps outside the image are skipped.

use crate::error::Result;
use crate::executor::ParallelExecutor;
use crate::image::{PixelBuffer, Rgb};

use super::core::{
    clamp_u8, coords, gaussian_kernel_1d, offset_coord, require_filter_size, round_u8,
};

type Wide = [f64; 3];

/// How a pass treats windows that hang over the image edge.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Border {
    /// Sum whatever taps are in bounds.
    Truncate,
    /// Divide by the weight of the in-bounds taps.
    Renormalize,
}

/// One 1D convolution pass over `width` x `height` wide pixels.
///
/// `horizontal` selects the axis; tap `j` sits at offset `j - len/2`.
fn convolve_pass<S>(
    sample: S,
    weights: &[f64],
    width: usize,
    height: usize,
    horizontal: bool,
    border: Border,
    executor: &ParallelExecutor,
) -> Vec<Wide>
where
    S: Fn(usize, usize) -> Wide + Sync,
{
    let half = (weights.len() / 2) as isize;
    let mut out = vec![[0.0; 3]; width * height];

    executor.run(&mut out, |start, chunk| {
        for (offset, acc) in chunk.iter_mut().enumerate() {
            let (x, y) = coords(start + offset, width);
            let mut sum = [0.0; 3];
            let mut weight = 0.0;

            for (j, &w) in weights.iter().enumerate() {
                let delta = j as isize - half;
                let (nx, ny) = if horizontal {
                    match offset_coord(x, delta, width) {
                        Some(nx) => (nx, y),
                        None => continue,
                    }
                } else {
                    match offset_coord(y, delta, height) {
                        Some(ny) => (x, ny),
                        None => continue,
                    }
                };
                let s = sample(nx, ny);
                for c in 0..3 {
                    sum[c] += s[c] * w;
                }
                weight += w;
            }

            if border == Border::Renormalize && weight > 0.0 {
                for v in sum.iter_mut() {
                    *v /= weight;
                }
            }
            *acc = sum;
        }
    });
    out
}

/// Horizontal then vertical pass, returning the wide result.
fn separable(
    image: &PixelBuffer,
    weights: &[f64],
    border: Border,
    executor: &ParallelExecutor,
) -> Vec<Wide> {
    let (width, height) = (image.width(), image.height());
    let temp = convolve_pass(
        |x, y| image.get(x, y).to_f64(),
        weights,
        width,
        height,
        true,
        border,
        executor,
    );
    convolve_pass(
        |x, y| temp[y * width + x],
        weights,
        width,
        height,
        false,
        border,
        executor,
    )
}

/// Box blur over a `filter_size` x `filter_size` window.
///
/// The window sum is always divided by `filter_size^2`, even where the
/// window is cut off by the image edge, so borders come out darker than
/// the interior. Channels are truncated.
pub fn average(
    image: &mut PixelBuffer,
    filter_size: usize,
    executor: &ParallelExecutor,
) -> Result<()> {
    require_filter_size(filter_size)?;
    let ones = vec![1.0; filter_size];
    let sums = separable(image, &ones, Border::Truncate, executor);

    let divisor = (filter_size * filter_size) as f64;
    executor.run(image.pixels_mut(), |start, chunk| {
        for (px, s) in chunk.iter_mut().zip(&sums[start..]) {
            *px = Rgb::new(
                clamp_u8(s[0] / divisor),
                clamp_u8(s[1] / divisor),
                clamp_u8(s[2] / divisor),
            );
        }
    });
    Ok(())
}

/// Gaussian blur with tap weights `exp(-(j - size/2)^2 / sigma)`.
///
/// Windows cut off by the edge are renormalized, so a uniform image is
/// unchanged. Channels are rounded to nearest.
pub fn gaussian(
    image: &mut PixelBuffer,
    filter_size: usize,
    sigma: f64,
    executor: &ParallelExecutor,
) -> Result<()> {
    let kernel = gaussian_kernel_1d(filter_size, sigma)?;
    let blurred = separable(image, &kernel, Border::Renormalize, executor);

    executor.run(image.pixels_mut(), |start, chunk| {
        for (px, s) in chunk.iter_mut().zip(&blurred[start..]) {
            *px = Rgb::new(round_u8(s[0]), round_u8(s[1]), round_u8(s[2]));
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BitDepth;

    fn uniform() -> PixelBuffer {
        PixelBuffer::filled(BitDepth::Rgb24, 9, 7, Rgb::new(200, 100, 37)).unwrap()
    }

    #[test]
    fn test_gaussian_uniform_unchanged() {
        for &size in &[1, 3, 4, 7] {
            let mut img = uniform();
            gaussian(&mut img, size, 1.5, &ParallelExecutor::with_workers(3).unwrap()).unwrap();
            assert_eq!(img, uniform(), "size={size}");
        }
    }

    #[test]
    fn test_gaussian_spreads_impulse() {
        let mut img = PixelBuffer::new(BitDepth::Rgb24, 5, 5).unwrap();
        img.set(2, 2, Rgb::WHITE);
        gaussian(&mut img, 3, 1.0, &ParallelExecutor::sequential()).unwrap();
        let center = img.get(2, 2).r;
        let side = img.get(1, 2).r;
        let corner = img.get(1, 1).r;
        assert!(center > side && side > corner && corner > 0);
        assert_eq!(img.get(0, 0), Rgb::BLACK);
    }

    #[test]
    fn test_average_interior_is_mean() {
        let mut img = PixelBuffer::new(BitDepth::Rgb24, 3, 3).unwrap();
        img.set(1, 1, Rgb::gray(90));
        average(&mut img, 3, &ParallelExecutor::sequential()).unwrap();
        assert_eq!(img.get(1, 1), Rgb::gray(10));
    }

    #[test]
    fn test_average_darkens_borders() {
        // The divisor ignores how much of the window is in bounds.
        let mut img = uniform();
        average(&mut img, 3, &ParallelExecutor::sequential()).unwrap();
        assert_eq!(img.get(4, 3), Rgb::new(200, 100, 37));
        // Edge keeps 6 of 9 taps, corner 4 of 9
        assert_eq!(img.get(4, 0).r, 133);
        assert_eq!(img.get(0, 0).r, 88);
    }

    #[test]
    fn test_average_rejects_zero_size() {
        let mut img = uniform();
        assert!(average(&mut img, 0, &ParallelExecutor::sequential()).is_err());
    }
}
