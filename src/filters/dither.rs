//! Floyd-Steinberg error-diffusion dithering.
//!
//! Each pixel's quantization error feeds pixels that come later in scan
//! order, so this filter always runs on the calling thread regardless of the
//! executor the other filters use.

use crate::image::{PixelBuffer, Rgb};

/// Neighbour offsets `(dx, dy)` and their share of the error, in sixteenths.
const DIFFUSION: [(isize, usize, f64); 4] = [(1, 0, 5.0), (-1, 1, 3.0), (0, 1, 5.0), (1, 1, 3.0)];

const THRESHOLD: f64 = 127.0;

/// Reduce the image to pure black and white by error diffusion on its luma.
///
/// Pixels are visited row by row, left to right. A working value above 127
/// becomes white, otherwise black; the difference between the working value
/// and the output is spread to the right, lower-left, lower and lower-right
/// neighbours. Shares that would land outside the image are dropped.
pub fn error_diffusion(image: &mut PixelBuffer) {
    let (width, height) = (image.width(), image.height());
    log::debug!("dithering {width}x{height} image");

    let mut plane: Vec<f64> = image
        .pixels()
        .iter()
        .map(|px| px.luma() as u8 as f64)
        .collect();

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let old = plane[i];
            let new = if old > THRESHOLD { 255.0 } else { 0.0 };
            plane[i] = new;
            let err = old - new;

            for &(dx, dy, share) in &DIFFUSION {
                let nx = x as isize + dx;
                let ny = y + dy;
                if nx < 0 || nx >= width as isize || ny >= height {
                    continue;
                }
                plane[ny * width + nx as usize] += err * share / 16.0;
            }
        }
    }

    for (px, &v) in image.pixels_mut().iter_mut().zip(&plane) {
        *px = if v > 0.0 { Rgb::WHITE } else { Rgb::BLACK };
    }
}
