//! Bitmap Filters
//!
//! An in-memory RGB image container, a Windows Bitmap codec and a catalogue
//! of spatial filters that run on a chunked worker pool.
//!
//! ## Image Format
//! Every image is a [`PixelBuffer`]: `width * height` RGB triples, row-major,
//! origin top-left. Its bit depth (8, 24 or 32) only matters when the image
//! is written back to disk.
//!
//! ## Pipeline
//! ```no_run
//! use bitmap_filters::{bmp, filters, ParallelExecutor};
//!
//! # fn main() -> bitmap_filters::Result<()> {
//! let executor = ParallelExecutor::default();
//! let mut image = bmp::read("input.bmp")?;
//! filters::median(&mut image, 3, &executor)?;
//! filters::gaussian(&mut image, 5, 2.0, &executor)?;
//! bmp::write("output.bmp", &image)?;
//! # Ok(())
//! # }
//! ```
//!
//! Python bindings over numpy arrays are available with the `python` feature.

pub mod bmp;
pub mod error;
pub mod executor;
pub mod filters;
pub mod image;

pub use error::{Error, FormatError, Result};
pub use executor::{ExecutorConfig, ParallelExecutor};
pub use image::{BitDepth, PixelBuffer, Rgb};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::{PyIOError, PyValueError};
    use pyo3::prelude::*;

    use crate::error::Error;
    use crate::executor::ParallelExecutor;
    use crate::filters::{self, QuadrilateralParams};
    use crate::image::{BitDepth, PixelBuffer};

    impl From<Error> for PyErr {
        fn from(err: Error) -> PyErr {
            match err {
                Error::Io(e) => PyIOError::new_err(e.to_string()),
                other => PyValueError::new_err(other.to_string()),
            }
        }
    }

    fn executor(workers: Option<usize>) -> PyResult<ParallelExecutor> {
        Ok(match workers {
            Some(n) => ParallelExecutor::with_workers(n)?,
            None => ParallelExecutor::default(),
        })
    }

    /// Convert, filter in place, convert back.
    fn apply<'py, F>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        workers: Option<usize>,
        f: F,
    ) -> PyResult<Bound<'py, PyArray3<u8>>>
    where
        F: FnOnce(&mut PixelBuffer, &ParallelExecutor) -> crate::Result<()>,
    {
        let mut buffer = PixelBuffer::from_array(image.as_array())?;
        let exec = executor(workers)?;
        f(&mut buffer, &exec)?;
        Ok(buffer.to_array().into_pyarray(py))
    }

    // ========================================================================
    // Codec
    // ========================================================================

    /// Read a bitmap file into an (H, W, 3) u8 array.
    #[pyfunction]
    pub fn read_bitmap<'py>(py: Python<'py>, path: &str) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let buffer = crate::bmp::read(path)?;
        Ok(buffer.to_array().into_pyarray(py))
    }

    /// Write an (H, W, C) u8 array as a bitmap file of the given bit depth.
    #[pyfunction]
    #[pyo3(signature = (path, image, bit_depth=24))]
    pub fn write_bitmap<'py>(
        path: &str,
        image: PyReadonlyArray3<'py, u8>,
        bit_depth: u16,
    ) -> PyResult<()> {
        let depth = BitDepth::from_bits(bit_depth)
            .ok_or_else(|| PyValueError::new_err(format!("unsupported bit depth {bit_depth}")))?;
        let mut buffer = PixelBuffer::from_array(image.as_array())?;
        buffer.set_bit_depth(depth);
        crate::bmp::write(path, &buffer)?;
        Ok(())
    }

    // ========================================================================
    // Pointwise Filters
    // ========================================================================

    #[pyfunction]
    #[pyo3(signature = (image, workers=None))]
    pub fn monochrome<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::monochrome(img, exec);
            Ok(())
        })
    }

    #[pyfunction]
    #[pyo3(signature = (image, threshold=127, workers=None))]
    pub fn binarize<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        threshold: u8,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::binarize(img, threshold, exec);
            Ok(())
        })
    }

    #[pyfunction]
    #[pyo3(signature = (image, gamma, workers=None))]
    pub fn gamma<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        gamma: f64,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::gamma_correction(img, gamma, exec)
        })
    }

    #[pyfunction]
    #[pyo3(signature = (image, gain, midpoint=128.0, workers=None))]
    pub fn logistic<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        gain: f64,
        midpoint: f64,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::logistic(img, gain, midpoint, exec)
        })
    }

    #[pyfunction]
    #[pyo3(signature = (image, overlay, alpha, workers=None))]
    pub fn alpha_blend<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        overlay: PyReadonlyArray3<'py, u8>,
        alpha: f64,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let overlay = PixelBuffer::from_array(overlay.as_array())?;
        apply(py, image, workers, |img, exec| {
            filters::alpha_blend(img, &overlay, alpha, exec)
        })
    }

    #[pyfunction]
    #[pyo3(signature = (image, workers=None))]
    pub fn histogram_equalization<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::histogram_equalization(img, exec);
            Ok(())
        })
    }

    #[pyfunction]
    #[pyo3(signature = (image, workers=None))]
    pub fn histogram_extension<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::histogram_extension(img, exec);
            Ok(())
        })
    }

    #[pyfunction]
    pub fn error_diffusion<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, Some(1), |img, _| {
            filters::error_diffusion(img);
            Ok(())
        })
    }

    // ========================================================================
    // Window Filters
    // ========================================================================

    #[pyfunction]
    #[pyo3(signature = (image, filter_size=3, workers=None))]
    pub fn median<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        filter_size: usize,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::median(img, filter_size, exec)
        })
    }

    /// Median across `frames` (a list of same-sized arrays).
    #[pyfunction]
    #[pyo3(signature = (frames, filter_size=3, workers=None))]
    pub fn temporal_median<'py>(
        py: Python<'py>,
        frames: Vec<PyReadonlyArray3<'py, u8>>,
        filter_size: usize,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let frames = frames
            .iter()
            .map(|f| PixelBuffer::from_array(f.as_array()))
            .collect::<crate::Result<Vec<_>>>()?;
        let first = frames
            .first()
            .ok_or_else(|| PyValueError::new_err("temporal median needs at least one frame"))?;
        let mut buffer = first.clone();
        filters::temporal_median(&mut buffer, &frames, filter_size, &executor(workers)?)?;
        Ok(buffer.to_array().into_pyarray(py))
    }

    #[pyfunction]
    #[pyo3(signature = (image, filter_size=3, workers=None))]
    pub fn average<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        filter_size: usize,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::average(img, filter_size, exec)
        })
    }

    #[pyfunction]
    #[pyo3(signature = (image, filter_size=5, sigma=2.0, workers=None))]
    pub fn gaussian<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        filter_size: usize,
        sigma: f64,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::gaussian(img, filter_size, sigma, exec)
        })
    }

    #[pyfunction]
    #[pyo3(signature = (image, workers=None))]
    pub fn sobel<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, filters::sobel)
    }

    #[pyfunction]
    #[pyo3(signature = (image, workers=None))]
    pub fn laplacian<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, filters::laplacian)
    }

    // ========================================================================
    // Edge-Preserving Filters
    // ========================================================================

    #[pyfunction]
    #[pyo3(signature = (image, filter_size=5, sigma_space=2.0, sigma_range=30.0, workers=None))]
    pub fn bilateral<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        filter_size: usize,
        sigma_space: f64,
        sigma_range: f64,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        apply(py, image, workers, |img, exec| {
            filters::bilateral(img, filter_size, sigma_space, sigma_range, exec)
        })
    }

    #[pyfunction]
    #[pyo3(signature = (image, reference, filter_size=5, sigma_space=2.0, sigma_range=30.0, workers=None))]
    pub fn trilateral<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        reference: PyReadonlyArray3<'py, u8>,
        filter_size: usize,
        sigma_space: f64,
        sigma_range: f64,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let reference = PixelBuffer::from_array(reference.as_array())?;
        apply(py, image, workers, |img, exec| {
            filters::trilateral(img, &reference, filter_size, sigma_space, sigma_range, exec)
        })
    }

    /// Fuse a laser depth image with color and camera guides.
    #[pyfunction]
    #[pyo3(signature = (color, laser, camera, filter_size=5, diagnostic_path=None, workers=None))]
    pub fn quadrilateral<'py>(
        py: Python<'py>,
        color: PyReadonlyArray3<'py, u8>,
        laser: PyReadonlyArray3<'py, u8>,
        camera: PyReadonlyArray3<'py, u8>,
        filter_size: usize,
        diagnostic_path: Option<String>,
        workers: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let color = PixelBuffer::from_array(color.as_array())?;
        let laser = PixelBuffer::from_array(laser.as_array())?;
        let camera = PixelBuffer::from_array(camera.as_array())?;
        let mut params = QuadrilateralParams::default().with_filter_size(filter_size);
        if let Some(path) = diagnostic_path {
            params = params.with_diagnostic_path(path);
        }

        let mut buffer = laser.clone();
        filters::quadrilateral(&mut buffer, &color, &laser, &camera, &params, &executor(workers)?)?;
        Ok(buffer.to_array().into_pyarray(py))
    }

    #[pymodule]
    pub fn bitmap_filters(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Codec
        m.add_function(wrap_pyfunction!(read_bitmap, m)?)?;
        m.add_function(wrap_pyfunction!(write_bitmap, m)?)?;

        // Pointwise filters
        m.add_function(wrap_pyfunction!(monochrome, m)?)?;
        m.add_function(wrap_pyfunction!(binarize, m)?)?;
        m.add_function(wrap_pyfunction!(gamma, m)?)?;
        m.add_function(wrap_pyfunction!(logistic, m)?)?;
        m.add_function(wrap_pyfunction!(alpha_blend, m)?)?;
        m.add_function(wrap_pyfunction!(histogram_equalization, m)?)?;
        m.add_function(wrap_pyfunction!(histogram_extension, m)?)?;
        m.add_function(wrap_pyfunction!(error_diffusion, m)?)?;

        // Window filters
        m.add_function(wrap_pyfunction!(median, m)?)?;
        m.add_function(wrap_pyfunction!(temporal_median, m)?)?;
        m.add_function(wrap_pyfunction!(average, m)?)?;
        m.add_function(wrap_pyfunction!(gaussian, m)?)?;
        m.add_function(wrap_pyfunction!(sobel, m)?)?;
        m.add_function(wrap_pyfunction!(laplacian, m)?)?;

        // Edge-preserving filters
        m.add_function(wrap_pyfunction!(bilateral, m)?)?;
        m.add_function(wrap_pyfunction!(trilateral, m)?)?;
        m.add_function(wrap_pyfunction!(quadrilateral, m)?)?;

        Ok(())
    }
}
