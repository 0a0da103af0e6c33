//! Bitmap reader: 8-bit palettized, 24-bit and 32-bit uncompressed images.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::header::{
    row_stride, skip, FileHeader, InfoHeader, FILE_HEADER_SIZE, PALETTE_ENTRY_SIZE, SIGNATURE,
};
use super::limits::Limits;
use crate::error::{Error, FormatError, Result};
use crate::image::{BitDepth, PixelBuffer, Rgb};

const MAX_PALETTE_ENTRIES: u32 = 256;

/// Read a bitmap file from disk.
pub fn read<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let image = read_from(BufReader::new(file))?;
    log::debug!(
        "read {}: {}x{} {}-bit",
        path.display(),
        image.width(),
        image.height(),
        image.bit_depth().bits()
    );
    Ok(image)
}

/// Decode a bitmap held in memory.
pub fn decode(data: &[u8]) -> Result<PixelBuffer> {
    read_from(data)
}

/// Decode a bitmap held in memory, rejecting images larger than `limits`.
pub fn decode_with_limits(data: &[u8], limits: &Limits) -> Result<PixelBuffer> {
    read_from_with_limits(data, limits)
}

/// Decode a bitmap from any byte stream.
///
/// The returned buffer is always top-to-bottom, whatever the row order on disk.
/// Header dimensions alone never size an allocation: a stream that ends
/// before the pixel data its header promises fails with
/// [`FormatError::Truncated`].
pub fn read_from<R: Read>(reader: R) -> Result<PixelBuffer> {
    read_from_with_limits(reader, &Limits::default())
}

/// [`read_from`] with caps on the decoded size, checked before any pixel
/// data is read.
pub fn read_from_with_limits<R: Read>(mut reader: R, limits: &Limits) -> Result<PixelBuffer> {
    let file_header = FileHeader::read(&mut reader)?;
    if file_header.signature != SIGNATURE {
        return Err(FormatError::NotBitmap(file_header.signature).into());
    }

    let info = InfoHeader::read(&mut reader)?;
    let extension = info.extension_len()?;
    skip(&mut reader, u64::from(extension))?;

    let depth = BitDepth::from_bits(info.bit_count)
        .ok_or(FormatError::UnsupportedBitDepth(info.bit_count))?;
    if info.compression != 0 {
        return Err(FormatError::UnsupportedCompression(info.compression).into());
    }
    if info.width <= 0 || info.height == 0 || info.height == i32::MIN {
        return Err(FormatError::InvalidDimensions {
            width: info.width,
            height: info.height,
        }
        .into());
    }

    let entries = palette_entries(&info, depth);
    let palette = read_palette(&mut reader, entries)?;

    let consumed = u64::from(FILE_HEADER_SIZE)
        + u64::from(info.size)
        + u64::from(entries) * u64::from(PALETTE_ENTRY_SIZE);
    let offset = u64::from(file_header.pixel_offset);
    if offset > consumed {
        skip(&mut reader, offset - consumed)?;
    }

    let width = info.width.unsigned_abs();
    let height = info.height.unsigned_abs();
    limits.check(u64::from(width), u64::from(height))?;

    let bpp = depth.bytes_per_pixel();
    let row_bytes = u64::from(width) * bpp as u64;
    let needed = ((row_bytes + 3) / 4 * 4)
        .checked_mul(u64::from(height))
        .ok_or_else(|| FormatError::LimitExceeded(format!("{width}x{height} pixel data")))?;

    let bottom_up = info.is_bottom_up();
    log::debug!(
        "decoding {width}x{height} {}-bit bitmap, {} rows, {} palette entries",
        depth.bits(),
        if bottom_up { "bottom-up" } else { "top-down" },
        palette.len()
    );

    // Grows with the bytes actually read, never with the header's claim.
    let mut raw = Vec::new();
    reader
        .by_ref()
        .take(needed)
        .read_to_end(&mut raw)
        .map_err(Error::from_read)?;
    if (raw.len() as u64) < needed {
        return Err(FormatError::Truncated.into());
    }

    let (width, height) = (width as usize, height as usize);
    let mut image = PixelBuffer::new(depth, width, height)?;
    let stride = row_stride(width, bpp);

    for (disk_row, row) in raw.chunks_exact(stride).enumerate() {
        let y = if bottom_up { height - 1 - disk_row } else { disk_row };
        let start = image.index(0, y);
        let dest = &mut image.pixels_mut()[start..start + width];

        match depth {
            BitDepth::Indexed8 => {
                for (px, &idx) in dest.iter_mut().zip(&row[..width]) {
                    *px = *palette
                        .get(idx as usize)
                        .ok_or(FormatError::PaletteIndexOutOfRange(idx))?;
                }
            }
            BitDepth::Rgb24 | BitDepth::Rgb32 => {
                for (px, bgr) in dest.iter_mut().zip(row.chunks_exact(bpp)) {
                    *px = Rgb::new(bgr[2], bgr[1], bgr[0]);
                }
            }
        }
    }

    Ok(image)
}

/// Palette entries present on disk. 8-bit images with `colors_used == 0`
/// carry a full 256-entry table.
fn palette_entries(info: &InfoHeader, depth: BitDepth) -> u32 {
    match depth {
        BitDepth::Indexed8 if info.colors_used == 0 => MAX_PALETTE_ENTRIES,
        _ => info.colors_used,
    }
}

fn read_palette<R: Read>(reader: &mut R, entries: u32) -> Result<Vec<Rgb>> {
    let kept = entries.min(MAX_PALETTE_ENTRIES);
    let mut palette = Vec::with_capacity(kept as usize);
    let mut quad = [0u8; PALETTE_ENTRY_SIZE as usize];
    for _ in 0..kept {
        reader.read_exact(&mut quad).map_err(Error::from_read)?;
        palette.push(Rgb::new(quad[2], quad[1], quad[0]));
    }
    skip(reader, u64::from(entries - kept) * u64::from(PALETTE_ENTRY_SIZE))?;
    Ok(palette)
}
