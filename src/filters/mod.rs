//! Filter catalogue.
//!
//! Every filter mutates a [`PixelBuffer`](crate::image::PixelBuffer) in place
//! and hands its per-pixel work to a
//! [`ParallelExecutor`](crate::executor::ParallelExecutor). Filters that read
//! neighbouring pixels work from a snapshot or an intermediate buffer, so
//! each worker only ever writes its own slice of the output.
//!
//! ## Filter Categories
//!
//! | Module | Filters | Window |
//! |--------|---------|--------|
//! | [`grayscale`] | monochrome, binarize | pointwise |
//! | [`color_adjust`] | gamma, logistic, alpha blend | pointwise |
//! | [`levels_curves`] | histogram equalization, histogram extension | global LUT |
//! | [`dither`] | error diffusion | sequential scan |
//! | [`noise`] | median, temporal median | square, order statistic |
//! | [`blur`] | average, Gaussian | separable |
//! | [`edge`] | Sobel, Laplacian | 3x3 |
//! | [`bilateral`] | bilateral, trilateral, quadrilateral | square, weighted |
//!
//! Neighbours outside the image are skipped, never padded or clamped.
//! Luma is `0.299R + 0.587G + 0.114B` throughout.

pub mod core;

pub mod grayscale;
pub mod color_adjust;
pub mod levels_curves;
pub mod dither;
pub mod noise;
pub mod blur;
pub mod edge;
pub mod bilateral;

pub use bilateral::{bilateral, quadrilateral, trilateral, QuadrilateralParams};
pub use blur::{average, gaussian};
pub use color_adjust::{alpha_blend, gamma_correction, logistic};
pub use dither::error_diffusion;
pub use edge::{laplacian, sobel};
pub use grayscale::{binarize, monochrome};
pub use levels_curves::{histogram_equalization, histogram_extension};
pub use noise::{median, temporal_median};
