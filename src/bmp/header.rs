//! File and info header records.
//!
//! Every field is read and written with its exact little-endian wire width;
//! nothing depends on the in-memory layout of these structs.

use std::io::{self, Read, Write};

use crate::error::{Error, FormatError, Result};

pub const SIGNATURE: [u8; 2] = *b"BM";
pub const FILE_HEADER_SIZE: u32 = 14;
pub const INFO_HEADER_SIZE: u32 = 40;
pub const V4_HEADER_SIZE: u32 = 108;
pub const V5_HEADER_SIZE: u32 = 124;
pub const PIXELS_PER_METER: i32 = 3780;
/// Bytes per palette entry on disk (blue, green, red, reserved).
pub const PALETTE_ENTRY_SIZE: u32 = 4;

/// BITMAPFILEHEADER (14 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub signature: [u8; 2],
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
}

impl FileHeader {
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let mut signature = [0u8; 2];
        r.read_exact(&mut signature).map_err(Error::from_read)?;
        Ok(FileHeader {
            signature,
            file_size: read_u32(r)?,
            reserved1: read_u16(r)?,
            reserved2: read_u16(r)?,
            pixel_offset: read_u32(r)?,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.signature)?;
        w.write_all(&self.file_size.to_le_bytes())?;
        w.write_all(&self.reserved1.to_le_bytes())?;
        w.write_all(&self.reserved2.to_le_bytes())?;
        w.write_all(&self.pixel_offset.to_le_bytes())
    }
}

/// The 40 core bytes of BITMAPINFOHEADER. V4/V5 headers share this prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoHeader {
    pub size: u32,
    pub width: i32,
    /// Positive for bottom-up rows, negative for top-down.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

impl InfoHeader {
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(InfoHeader {
            size: read_u32(r)?,
            width: read_i32(r)?,
            height: read_i32(r)?,
            planes: read_u16(r)?,
            bit_count: read_u16(r)?,
            compression: read_u32(r)?,
            image_size: read_u32(r)?,
            x_pixels_per_meter: read_i32(r)?,
            y_pixels_per_meter: read_i32(r)?,
            colors_used: read_u32(r)?,
            colors_important: read_u32(r)?,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.size.to_le_bytes())?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.planes.to_le_bytes())?;
        w.write_all(&self.bit_count.to_le_bytes())?;
        w.write_all(&self.compression.to_le_bytes())?;
        w.write_all(&self.image_size.to_le_bytes())?;
        w.write_all(&self.x_pixels_per_meter.to_le_bytes())?;
        w.write_all(&self.y_pixels_per_meter.to_le_bytes())?;
        w.write_all(&self.colors_used.to_le_bytes())?;
        w.write_all(&self.colors_important.to_le_bytes())
    }

    /// Bytes of V4/V5 extension fields that follow the core 40 bytes.
    pub fn extension_len(&self) -> Result<u32> {
        match self.size {
            INFO_HEADER_SIZE | V4_HEADER_SIZE | V5_HEADER_SIZE => Ok(self.size - INFO_HEADER_SIZE),
            other => Err(FormatError::UnsupportedHeader(other).into()),
        }
    }

    pub fn is_bottom_up(&self) -> bool {
        self.height > 0
    }
}

/// Bytes per row on disk, padded to a multiple of four.
pub fn row_stride(width: usize, bytes_per_pixel: usize) -> usize {
    let row = width * bytes_per_pixel;
    row + (4 - row % 4) % 4
}

/// Discard exactly `n` bytes.
pub(crate) fn skip<R: Read>(r: &mut R, n: u64) -> Result<()> {
    let copied = io::copy(&mut r.take(n), &mut io::sink())?;
    if copied < n {
        return Err(FormatError::Truncated.into());
    }
    Ok(())
}

fn read_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf).map_err(Error::from_read)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(Error::from_read)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(Error::from_read)?;
    Ok(i32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_stride_padding() {
        assert_eq!(row_stride(1, 3), 4);
        assert_eq!(row_stride(3, 3), 12);
        assert_eq!(row_stride(5, 3), 16);
        assert_eq!(row_stride(5, 1), 8);
        assert_eq!(row_stride(5, 4), 20);
    }

    #[test]
    fn test_file_header_wire_layout() {
        let header = FileHeader {
            signature: SIGNATURE,
            file_size: 0x0102_0304,
            reserved1: 0,
            reserved2: 0,
            pixel_offset: 54,
        };
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        assert_eq!(out.len(), FILE_HEADER_SIZE as usize);
        assert_eq!(&out[..6], &[b'B', b'M', 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&out[10..14], &54u32.to_le_bytes());

        let back = FileHeader::read(&mut out.as_slice()).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn test_info_header_field_offsets() {
        let header = InfoHeader {
            size: INFO_HEADER_SIZE,
            width: 3,
            height: -2,
            planes: 1,
            bit_count: 24,
            compression: 0,
            image_size: 24,
            x_pixels_per_meter: PIXELS_PER_METER,
            y_pixels_per_meter: PIXELS_PER_METER,
            colors_used: 0,
            colors_important: 0,
        };
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        assert_eq!(out.len(), INFO_HEADER_SIZE as usize);
        // Offsets below are relative to the start of the info header (file offset 14).
        assert_eq!(&out[8..12], &(-2i32).to_le_bytes());
        assert_eq!(&out[14..16], &24u16.to_le_bytes());
        assert_eq!(&out[24..28], &3780i32.to_le_bytes());
    }

    #[test]
    fn test_extension_len() {
        let mut header = InfoHeader::read(&mut [0u8; 40].as_slice()).unwrap();
        header.size = V5_HEADER_SIZE;
        assert_eq!(header.extension_len().unwrap(), 84);
        header.size = 12;
        assert!(matches!(
            header.extension_len(),
            Err(Error::Format(FormatError::UnsupportedHeader(12)))
        ));
    }

    #[test]
    fn test_short_header_is_truncated() {
        let err = InfoHeader::read(&mut [0u8; 10].as_slice()).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::Truncated)));
    }
}
