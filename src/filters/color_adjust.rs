//! Pointwise color adjustments: gamma, logistic contrast curve, alpha blend.
//!
//! Gamma and logistic precompute a 256-entry lookup table and apply it to
//! every channel. Alpha blend mixes two same-sized images.

use crate::error::{Error, Result};
use crate::executor::ParallelExecutor;
use crate::image::{PixelBuffer, Rgb};

use super::core::{apply_lut, build_lut, require_positive, round_u8};

// ============================================================================
// Gamma
// ============================================================================

/// Apply gamma correction: `255 * (v / 255)^(1 / gamma)`.
///
/// # Arguments
/// * `image` - Image to modify in place
/// * `gamma` - Gamma value (> 0, 1.0 = no change)
pub fn gamma_correction(
    image: &mut PixelBuffer,
    gamma: f64,
    executor: &ParallelExecutor,
) -> Result<()> {
    require_positive("gamma", gamma)?;
    let inv_gamma = 1.0 / gamma;
    let lut = build_lut(|v| 255.0 * (v / 255.0).powf(inv_gamma));
    apply_lut(image, &lut, executor);
    Ok(())
}

// ============================================================================
// Logistic curve
// ============================================================================

/// Apply the sigmoid `255 / (1 + exp(-gain * (v - midpoint)))`.
///
/// Large gains approach a hard threshold at `midpoint`; small gains give a
/// gentle S-curve.
pub fn logistic(
    image: &mut PixelBuffer,
    gain: f64,
    midpoint: f64,
    executor: &ParallelExecutor,
) -> Result<()> {
    if !gain.is_finite() || !midpoint.is_finite() {
        return Err(Error::parameter(format!(
            "logistic parameters must be finite, got gain={gain} midpoint={midpoint}"
        )));
    }
    let lut = build_lut(|v| 255.0 / (1.0 + (-gain * (v - midpoint)).exp()));
    apply_lut(image, &lut, executor);
    Ok(())
}

// ============================================================================
// Alpha blend
// ============================================================================

/// Blend `overlay` onto `image`: `image * (1 - alpha) + overlay * alpha`.
///
/// Each channel is rounded to nearest, so blending an image with itself
/// leaves it unchanged for any `alpha`.
pub fn alpha_blend(
    image: &mut PixelBuffer,
    overlay: &PixelBuffer,
    alpha: f64,
    executor: &ParallelExecutor,
) -> Result<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::parameter(format!(
            "alpha must be within [0, 1], got {alpha}"
        )));
    }
    image.ensure_same_size(overlay, "blend image")?;

    let beta = 1.0 - alpha;
    let src = overlay.pixels();
    executor.run(image.pixels_mut(), |start, chunk| {
        for (px, o) in chunk.iter_mut().zip(&src[start..]) {
            let mix = |a: u8, b: u8| round_u8(a as f64 * beta + b as f64 * alpha);
            *px = Rgb::new(mix(px.r, o.r), mix(px.g, o.g), mix(px.b, o.b));
        }
    });
    Ok(())
}
