//! Edge detection filters: Sobel and Laplacian.
//!
//! Both convolve each color channel with a 3x3 kernel over a snapshot of the
//! input. Taps outside the image contribute nothing.

use crate::error::Result;
use crate::executor::ParallelExecutor;
use crate::image::{PixelBuffer, Rgb};

use super::core::{clamp_u8, coords, Window};

// ============================================================================
// Kernels (row-major, tap j at (j % 3 - 1, j / 3 - 1))
// ============================================================================

const SOBEL_X: [f64; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
const SOBEL_Y: [f64; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];
const LAPLACIAN: [f64; 9] = [1.0, 1.0, 1.0, 1.0, -8.0, 1.0, 1.0, 1.0, 1.0];

/// Convolve every channel with each kernel in `kernels` and combine the
/// per-kernel responses with `combine`.
fn convolve3<const K: usize, F>(
    image: &mut PixelBuffer,
    kernels: [&[f64; 9]; K],
    combine: F,
    executor: &ParallelExecutor,
) -> Result<()>
where
    F: Fn([f64; K]) -> f64 + Sync,
{
    let window = Window::new(3)?;
    let source = image.clone();
    let (width, height) = (source.width(), source.height());

    executor.run(image.pixels_mut(), |start, chunk| {
        for (offset, px) in chunk.iter_mut().enumerate() {
            let (x, y) = coords(start + offset, width);
            let mut acc = [[0.0f64; K]; 3];
            for (tap, nx, ny) in window.neighbors(x, y, width, height) {
                let s = source.get(nx, ny).to_f64();
                for (k, kernel) in kernels.iter().enumerate() {
                    for c in 0..3 {
                        acc[c][k] += s[c] * kernel[tap];
                    }
                }
            }
            *px = Rgb::new(
                clamp_u8(combine(acc[0])),
                clamp_u8(combine(acc[1])),
                clamp_u8(combine(acc[2])),
            );
        }
    });
    Ok(())
}

/// Sobel gradient magnitude `sqrt(gx^2 + gy^2)` per channel.
///
/// Magnitudes above 255 saturate to 255. They are never wrapped the way a
/// plain 8-bit cast would wrap them.
pub fn sobel(image: &mut PixelBuffer, executor: &ParallelExecutor) -> Result<()> {
    convolve3(
        image,
        [&SOBEL_X, &SOBEL_Y],
        |[gx, gy]: [f64; 2]| (gx * gx + gy * gy).sqrt(),
        executor,
    )
}

/// 8-neighbour Laplacian per channel, clamped to [0, 255].
pub fn laplacian(image: &mut PixelBuffer, executor: &ParallelExecutor) -> Result<()> {
    convolve3(image, [&LAPLACIAN], |[v]: [f64; 1]| v, executor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BitDepth;

    fn vertical_edge() -> PixelBuffer {
        let mut img = PixelBuffer::new(BitDepth::Rgb24, 6, 5).unwrap();
        for y in 0..5 {
            for x in 3..6 {
                img.set(x, y, Rgb::WHITE);
            }
        }
        img
    }

    #[test]
    fn test_sobel_detects_vertical_edge() {
        let mut img = vertical_edge();
        sobel(&mut img, &ParallelExecutor::with_workers(2).unwrap()).unwrap();
        assert_eq!(img.get(2, 2), Rgb::WHITE);
        assert_eq!(img.get(3, 2), Rgb::WHITE);
        // Flat interior away from the edge
        assert_eq!(img.get(1, 2), Rgb::BLACK);
    }

    #[test]
    fn test_sobel_saturates_instead_of_wrapping() {
        let mut img = PixelBuffer::new(BitDepth::Rgb24, 6, 5).unwrap();
        for y in 0..5 {
            for x in 3..6 {
                img.set(x, y, Rgb::gray(200));
            }
        }
        sobel(&mut img, &ParallelExecutor::sequential()).unwrap();
        // gx = 4 * 200 = 800, which an 8-bit cast would turn into 32
        assert_eq!(img.get(2, 2), Rgb::WHITE);
    }

    #[test]
    fn test_sobel_flat_interior_is_zero() {
        let mut img = PixelBuffer::filled(BitDepth::Rgb24, 5, 5, Rgb::gray(128)).unwrap();
        sobel(&mut img, &ParallelExecutor::sequential()).unwrap();
        assert_eq!(img.get(2, 2), Rgb::BLACK);
    }

    #[test]
    fn test_laplacian_uniform_is_zero() {
        let mut img = PixelBuffer::filled(BitDepth::Rgb24, 5, 4, Rgb::new(128, 7, 250)).unwrap();
        laplacian(&mut img, &ParallelExecutor::sequential()).unwrap();
        assert!(img.pixels().iter().all(|&p| p == Rgb::BLACK));
    }

    #[test]
    fn test_laplacian_highlights_dark_side_of_edge() {
        let mut img = vertical_edge();
        laplacian(&mut img, &ParallelExecutor::sequential()).unwrap();
        // Black column next to three white taps: 3 * 255, saturated
        assert_eq!(img.get(2, 2), Rgb::WHITE);
        // White column next to three black taps goes negative and clamps
        assert_eq!(img.get(3, 2), Rgb::BLACK);
    }
}
