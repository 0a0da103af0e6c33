//! Edge-preserving filters: bilateral, trilateral and quadrilateral.
//!
//! All three are normalized convolutions over a square window whose tap
//! weights depend on a spatial Gaussian and on how much one or more guide
//! signals differ between the centre pixel and the tap. Weights are kept
//! per channel, so each channel is normalized by its own weight sum.
//!
//! ## Signals
//!
//! | Filter | Range term from | Samples from |
//! |--------|-----------------|--------------|
//! | bilateral | the image itself | the image |
//! | trilateral | a reference buffer | the image |
//! | quadrilateral | laser, color and camera buffers | the laser buffer |

use std::path::PathBuf;

use crate::bmp;
use crate::error::Result;
use crate::executor::ParallelExecutor;
use crate::image::{PixelBuffer, Rgb};

use super::core::{clamp_rgb, coords, require_positive, spatial_kernel_2d, Window};
use super::grayscale::monochrome;
use super::noise::median;

type Wide = [f64; 3];

/// Spatial-times-range weighted mean, with the range term read from `guide`
/// and the averaged colors from `source`.
fn guided_bilateral(
    image: &mut PixelBuffer,
    guide: &PixelBuffer,
    source: &PixelBuffer,
    filter_size: usize,
    sigma_space: f64,
    sigma_range: f64,
    executor: &ParallelExecutor,
) -> Result<()> {
    let window = Window::new(filter_size)?;
    let spatial = spatial_kernel_2d(filter_size, sigma_space)?;
    require_positive("sigma_range", sigma_range)?;

    let range_denom = 2.0 * sigma_range * sigma_range;
    let (width, height) = (image.width(), image.height());

    executor.run(image.pixels_mut(), |start, chunk| {
        for (offset, px) in chunk.iter_mut().enumerate() {
            let (x, y) = coords(start + offset, width);
            let center = guide.get(x, y).to_f64();
            let mut sum: Wide = [0.0; 3];
            let mut div: Wide = [0.0; 3];

            for (tap, nx, ny) in window.neighbors(x, y, width, height) {
                let g = guide.get(nx, ny).to_f64();
                let s = source.get(nx, ny).to_f64();
                for c in 0..3 {
                    let d = center[c] - g[c];
                    let w = spatial[tap] * (-d * d / range_denom).exp();
                    sum[c] += w * s[c];
                    div[c] += w;
                }
            }

            *px = clamp_rgb([sum[0] / div[0], sum[1] / div[1], sum[2] / div[2]]);
        }
    });
    Ok(())
}

/// Bilateral filter.
///
/// Tap weight is `exp(-(dx^2 + dy^2) / (2 sigma_space^2)) *
/// exp(-d^2 / (2 sigma_range^2))` where `d` is the channel difference from
/// the centre pixel. Channels are truncated.
pub fn bilateral(
    image: &mut PixelBuffer,
    filter_size: usize,
    sigma_space: f64,
    sigma_range: f64,
    executor: &ParallelExecutor,
) -> Result<()> {
    let source = image.clone();
    guided_bilateral(
        image,
        &source,
        &source,
        filter_size,
        sigma_space,
        sigma_range,
        executor,
    )
}

/// Bilateral filter whose range term comes from `reference` instead of the
/// image being filtered.
///
/// Useful when a cleaner signal knows where the edges are, e.g. smoothing a
/// depth map along the edges of a camera frame.
pub fn trilateral(
    image: &mut PixelBuffer,
    reference: &PixelBuffer,
    filter_size: usize,
    sigma_space: f64,
    sigma_range: f64,
    executor: &ParallelExecutor,
) -> Result<()> {
    image.ensure_same_size(reference, "reference image")?;
    let source = image.clone();
    guided_bilateral(
        image,
        reference,
        &source,
        filter_size,
        sigma_space,
        sigma_range,
        executor,
    )
}

// ============================================================================
// Quadrilateral
// ============================================================================

/// Tuning for [`quadrilateral`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuadrilateralParams {
    /// Window side length.
    pub filter_size: usize,
    /// Width of the edge indicator built from color and camera differences.
    pub sigma_edge: f64,
    /// Width of the estimate that trusts taps where all signals agree.
    pub sigma_agree: f64,
    /// Width of the estimate that follows laser edges.
    pub sigma_laser: f64,
    /// Median window used to denoise the camera guide first.
    pub camera_median_size: usize,
    /// Where to write the blend-component bitmap, if anywhere.
    pub diagnostic_path: Option<PathBuf>,
}

impl Default for QuadrilateralParams {
    /// A 5x5 window and 5x5 camera median. `diagnostic_path` is `None`, so
    /// the blend-component bitmap is not written anywhere.
    fn default() -> Self {
        QuadrilateralParams {
            filter_size: 5,
            sigma_edge: 0.03,
            sigma_agree: 0.1,
            sigma_laser: 0.1,
            camera_median_size: 5,
            diagnostic_path: None,
        }
    }
}

impl QuadrilateralParams {
    pub fn with_filter_size(mut self, filter_size: usize) -> Self {
        self.filter_size = filter_size;
        self
    }

    pub fn with_diagnostic_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.diagnostic_path = Some(path.into());
        self
    }
}

/// Per-channel `|a - b| / 255`.
#[inline]
fn norm_diff(a: Rgb, b: Rgb) -> Wide {
    let (a, b) = (a.to_f64(), b.to_f64());
    [
        (a[0] - b[0]).abs() / 255.0,
        (a[1] - b[1]).abs() / 255.0,
        (a[2] - b[2]).abs() / 255.0,
    ]
}

/// Fuse a laser depth signal with color and camera guides.
///
/// `color` is reduced to monochrome and `camera` is median-filtered before
/// use; the caller's buffers are untouched. For each tap, with normalized
/// differences `l` (laser), `k` (color) and `m` (camera) and squared sigmas:
///
/// ```text
/// edge  = 1 - exp(-m*k / sigma_edge)
/// agree = exp(-l^2 / sigma_agree) * exp(-m*k / sigma_agree)
/// laser = (1 - exp(-l^2 / sigma_laser)) * exp(-m*k / sigma_laser)
/// ```
///
/// `agree` taps contribute in proportion to `1 - edge`, `laser` taps in
/// proportion to `edge`, and the output is their combined weighted mean of
/// the laser samples. The result overwrites `image`.
///
/// When `params.diagnostic_path` is set, a bitmap is written there whose red
/// channel is the `agree` share and whose green and blue channels are the
/// `laser` share of each output pixel.
pub fn quadrilateral(
    image: &mut PixelBuffer,
    color: &PixelBuffer,
    laser: &PixelBuffer,
    camera: &PixelBuffer,
    params: &QuadrilateralParams,
    executor: &ParallelExecutor,
) -> Result<()> {
    image.ensure_same_size(color, "color image")?;
    image.ensure_same_size(laser, "laser image")?;
    image.ensure_same_size(camera, "camera image")?;
    let window = Window::new(params.filter_size)?;
    for (name, sigma) in [
        ("sigma_edge", params.sigma_edge),
        ("sigma_agree", params.sigma_agree),
        ("sigma_laser", params.sigma_laser),
    ] {
        require_positive(name, sigma)?;
    }

    let mut color = color.clone();
    monochrome(&mut color, executor);
    let mut camera = camera.clone();
    median(&mut camera, params.camera_median_size, executor)?;

    let sig_edge = params.sigma_edge * params.sigma_edge;
    let sig_agree = params.sigma_agree * params.sigma_agree;
    let sig_laser = params.sigma_laser * params.sigma_laser;
    let (width, height) = (image.width(), image.height());

    // (output, diagnostic) per pixel
    let mut fused = vec![(Rgb::BLACK, Rgb::BLACK); image.len()];
    executor.run(&mut fused, |start, chunk| {
        for (offset, slot) in chunk.iter_mut().enumerate() {
            let (x, y) = coords(start + offset, width);
            let (l0, k0, m0) = (laser.get(x, y), color.get(x, y), camera.get(x, y));
            let mut sum_a: Wide = [0.0; 3];
            let mut sum_b: Wide = [0.0; 3];
            let mut div: Wide = [0.0; 3];

            for (_, nx, ny) in window.neighbors(x, y, width, height) {
                let sample = laser.get(nx, ny);
                let l = norm_diff(l0, sample);
                let k = norm_diff(k0, color.get(nx, ny));
                let m = norm_diff(m0, camera.get(nx, ny));
                let s = sample.to_f64();

                for c in 0..3 {
                    let guide = m[c] * k[c];
                    let edge = 1.0 - (-guide / sig_edge).exp();
                    let a = (-l[c] * l[c] / sig_agree).exp() * (-guide / sig_agree).exp();
                    let b = (1.0 - (-l[c] * l[c] / sig_laser).exp()) * (-guide / sig_laser).exp();

                    sum_a[c] += a * s[c] * (1.0 - edge);
                    sum_b[c] += b * s[c] * edge;
                    div[c] += a * (1.0 - edge) + b * edge;
                }
            }

            let out = clamp_rgb([
                (sum_a[0] + sum_b[0]) / div[0],
                (sum_a[1] + sum_b[1]) / div[1],
                (sum_a[2] + sum_b[2]) / div[2],
            ]);
            let diag = clamp_rgb([sum_a[0] / div[0], sum_b[1] / div[1], sum_b[2] / div[2]]);
            *slot = (out, diag);
        }
    });

    if let Some(path) = &params.diagnostic_path {
        let components = fused.iter().map(|&(_, diag)| diag).collect();
        let diagnostic = PixelBuffer::from_pixels(image.bit_depth(), width, height, components)?;
        log::debug!("writing quadrilateral blend components to {}", path.display());
        bmp::write(path, &diagnostic)?;
    }

    for (px, (out, _)) in image.pixels_mut().iter_mut().zip(fused) {
        *px = out;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BitDepth;

    fn step(left: Rgb, right: Rgb) -> PixelBuffer {
        let mut img = PixelBuffer::filled(BitDepth::Rgb24, 8, 6, left).unwrap();
        for y in 0..6 {
            for x in 4..8 {
                img.set(x, y, right);
            }
        }
        img
    }

    #[test]
    fn test_bilateral_uniform_unchanged() {
        let flat = PixelBuffer::filled(BitDepth::Rgb24, 7, 5, Rgb::new(10, 100, 200)).unwrap();
        let mut img = flat.clone();
        bilateral(&mut img, 5, 2.0, 20.0, &ParallelExecutor::with_workers(3).unwrap()).unwrap();
        for (a, b) in img.pixels().iter().zip(flat.pixels()) {
            // Normalization may land a hair below the exact value
            assert!(b.r - a.r <= 1 && b.g - a.g <= 1 && b.b - a.b <= 1);
        }
    }

    #[test]
    fn test_bilateral_keeps_strong_edge() {
        let mut img = step(Rgb::BLACK, Rgb::WHITE);
        bilateral(&mut img, 5, 3.0, 10.0, &ParallelExecutor::sequential()).unwrap();
        assert_eq!(img.get(3, 3), Rgb::BLACK);
        assert!(img.get(4, 3).r >= 254);
    }

    #[test]
    fn test_bilateral_smooths_small_noise() {
        let mut img = PixelBuffer::filled(BitDepth::Rgb24, 5, 5, Rgb::gray(100)).unwrap();
        img.set(2, 2, Rgb::gray(110));
        bilateral(&mut img, 3, 2.0, 50.0, &ParallelExecutor::sequential()).unwrap();
        let v = img.get(2, 2).r;
        assert!((100..110).contains(&v), "center {v}");
    }

    #[test]
    fn test_trilateral_follows_reference_edges() {
        // Image has a soft ramp but the reference says there is a hard edge
        let mut img = PixelBuffer::new(BitDepth::Rgb24, 8, 6).unwrap();
        for y in 0..6 {
            for x in 0..8 {
                img.set(x, y, Rgb::gray((x * 30) as u8));
            }
        }
        let reference = step(Rgb::BLACK, Rgb::WHITE);
        let before = img.clone();
        trilateral(&mut img, &reference, 3, 2.0, 10.0, &ParallelExecutor::sequential()).unwrap();
        // Left of the edge only averages left-side taps
        assert!(img.get(3, 3).r <= before.get(3, 3).r);
        assert!(img.get(4, 3).r >= before.get(4, 3).r);
    }

    #[test]
    fn test_trilateral_size_mismatch() {
        let mut img = PixelBuffer::new(BitDepth::Rgb24, 4, 4).unwrap();
        let reference = PixelBuffer::new(BitDepth::Rgb24, 3, 4).unwrap();
        assert!(trilateral(&mut img, &reference, 3, 1.0, 1.0, &ParallelExecutor::sequential())
            .is_err());
    }

    #[test]
    fn test_quadrilateral_flat_laser_is_unchanged() {
        let laser = step(Rgb::gray(120), Rgb::gray(120));
        let color = step(Rgb::new(200, 10, 10), Rgb::new(10, 10, 200));
        let camera = step(Rgb::gray(30), Rgb::gray(220));
        let mut img = PixelBuffer::new(BitDepth::Rgb24, 8, 6).unwrap();
        let params = QuadrilateralParams::default().with_filter_size(3);
        quadrilateral(&mut img, &color, &laser, &camera, &params, &ParallelExecutor::sequential())
            .unwrap();
        for px in img.pixels() {
            assert!((119..=120).contains(&px.r), "{px:?}");
        }
    }

    #[test]
    fn test_quadrilateral_writes_diagnostic() {
        let laser = step(Rgb::gray(50), Rgb::gray(150));
        let color = step(Rgb::BLACK, Rgb::WHITE);
        let camera = step(Rgb::BLACK, Rgb::WHITE);
        let mut img = laser.clone();
        let path = std::env::temp_dir()
            .join(format!("bitmap_filters_quad_diag_{}.bmp", std::process::id()));
        let params = QuadrilateralParams::default()
            .with_filter_size(3)
            .with_diagnostic_path(&path);
        quadrilateral(
            &mut img,
            &color,
            &laser,
            &camera,
            &params,
            &ParallelExecutor::with_workers(2).unwrap(),
        )
        .unwrap();

        let diag = bmp::read(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!((diag.width(), diag.height()), (8, 6));
        // Inside a flat region every weight goes to agreeing taps
        assert!(diag.get(0, 0).r >= 49);
        assert_eq!(diag.get(0, 0).g, 0);

        // Writing the components does not change the fused output
        let mut plain = laser.clone();
        let params = QuadrilateralParams::default().with_filter_size(3);
        let exec = ParallelExecutor::sequential();
        quadrilateral(&mut plain, &color, &laser, &camera, &params, &exec).unwrap();
        assert_eq!(plain, img);
    }

    #[test]
    fn test_quadrilateral_validates_inputs() {
        let a = PixelBuffer::new(BitDepth::Rgb24, 4, 4).unwrap();
        let b = PixelBuffer::new(BitDepth::Rgb24, 5, 4).unwrap();
        let mut img = a.clone();
        let exec = ParallelExecutor::sequential();
        let params = QuadrilateralParams::default();
        assert!(quadrilateral(&mut img, &b, &a, &a, &params, &exec).is_err());

        let bad = QuadrilateralParams {
            sigma_edge: 0.0,
            ..QuadrilateralParams::default()
        };
        assert!(quadrilateral(&mut img, &a, &a, &a, &bad, &exec).is_err());
    }
}
