use std::io;

/// Reasons a byte stream is rejected as a Windows Bitmap.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FormatError {
    #[error("not a bitmap (signature {0:?})")]
    NotBitmap([u8; 2]),

    #[error("not a supported Windows bitmap variant (header size {0})")]
    UnsupportedHeader(u32),

    #[error("unsupported pixel depth: {0} bits")]
    UnsupportedBitDepth(u16),

    #[error("unsupported compression type {0}")]
    UnsupportedCompression(u32),

    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("palette index {0} out of range")]
    PaletteIndexOutOfRange(u8),

    #[error("unexpected end of bitmap data")]
    Truncated,

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Errors from the bitmap codec, the executor and the filters.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("invalid parameter: {0}")]
    Parameter(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn parameter(msg: impl Into<String>) -> Self {
        Error::Parameter(msg.into())
    }

    /// Map a read failure, reporting a short stream as truncated data.
    pub(crate) fn from_read(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::Format(FormatError::Truncated)
        } else {
            Error::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_maps_to_truncated() {
        let err = Error::from_read(io::Error::new(io::ErrorKind::UnexpectedEof, "short"));
        assert!(matches!(err, Error::Format(FormatError::Truncated)));
    }

    #[test]
    fn other_io_errors_stay_io() {
        let err = Error::from_read(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn messages_name_the_problem() {
        let err = Error::from(FormatError::UnsupportedBitDepth(16));
        assert_eq!(err.to_string(), "format error: unsupported pixel depth: 16 bits");
    }
}
