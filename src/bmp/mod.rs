//! Windows Bitmap codec.
//!
//! ## Supported Files
//!
//! | Depth | On disk | In memory |
//! |-------|---------|-----------|
//! | 8 | palette indices + 256-entry palette | palette colors |
//! | 24 | BGR triples | RGB |
//! | 32 | BGRX quads (fourth byte ignored) | RGB |
//!
//! Reading accepts BITMAPINFOHEADER, V4 and V5 headers (the extension fields
//! are skipped, never interpreted) and both row orders. Writing always emits
//! a 40-byte info header with bottom-up rows. Rows are padded to a multiple
//! of four bytes in both directions. Compressed files are rejected.
//!
//! Decoding allocates in proportion to the pixel data actually present, so a
//! header that claims huge dimensions fails as truncated. [`Limits`] caps the
//! decoded size up front.

pub mod header;

mod decode;
mod encode;
mod limits;

pub use decode::{decode, decode_with_limits, read, read_from, read_from_with_limits};
pub use encode::{encode, write, write_to};
pub use limits::Limits;
