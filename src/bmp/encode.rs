//! Bitmap writer. Always emits the 40-byte info header and bottom-up rows.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::header::{
    row_stride, FileHeader, InfoHeader, FILE_HEADER_SIZE, INFO_HEADER_SIZE, PALETTE_ENTRY_SIZE,
    PIXELS_PER_METER, SIGNATURE,
};
use crate::error::{Error, Result};
use crate::image::{BitDepth, PixelBuffer, Rgb};

const PALETTE_SIZE: usize = 256;

/// Write `image` to a bitmap file, replacing any existing file.
pub fn write<P: AsRef<Path>>(path: P, image: &PixelBuffer) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_to(BufWriter::new(file), image)?;
    log::debug!(
        "wrote {}: {}x{} {}-bit",
        path.display(),
        image.width(),
        image.height(),
        image.bit_depth().bits()
    );
    Ok(())
}

/// Encode `image` into a byte vector.
pub fn encode(image: &PixelBuffer) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_to(&mut out, image)?;
    Ok(out)
}

/// Serialize `image` to any byte sink.
pub fn write_to<W: Write>(mut writer: W, image: &PixelBuffer) -> Result<()> {
    let depth = image.bit_depth();
    let (width, height) = (image.width(), image.height());
    let bpp = depth.bytes_per_pixel();
    let stride = row_stride(width, bpp);

    let too_large = || Error::parameter(format!("image too large for a bitmap: {width}x{height}"));
    let image_size = stride
        .checked_mul(height)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(too_large)?;
    let width_field = i32::try_from(width).map_err(|_| too_large())?;
    let height_field = i32::try_from(height).map_err(|_| too_large())?;

    let indexed = match depth {
        BitDepth::Indexed8 => Some(build_palette(image)),
        BitDepth::Rgb24 | BitDepth::Rgb32 => None,
    };
    let entries = if indexed.is_some() { PALETTE_SIZE as u32 } else { 0 };
    let pixel_offset = FILE_HEADER_SIZE + INFO_HEADER_SIZE + entries * PALETTE_ENTRY_SIZE;
    let file_size = pixel_offset.checked_add(image_size).ok_or_else(too_large)?;

    FileHeader {
        signature: SIGNATURE,
        file_size,
        reserved1: 0,
        reserved2: 0,
        pixel_offset,
    }
    .write(&mut writer)?;

    InfoHeader {
        size: INFO_HEADER_SIZE,
        width: width_field,
        height: height_field,
        planes: 1,
        bit_count: depth.bits(),
        compression: 0,
        image_size,
        x_pixels_per_meter: PIXELS_PER_METER,
        y_pixels_per_meter: PIXELS_PER_METER,
        colors_used: entries,
        colors_important: 0,
    }
    .write(&mut writer)?;

    if let Some((palette, _)) = &indexed {
        for c in palette {
            writer.write_all(&[c.b, c.g, c.r, 0])?;
        }
    }

    let mut row = vec![0u8; stride];
    for y in (0..height).rev() {
        let start = image.index(0, y);
        let src = &image.pixels()[start..start + width];
        match &indexed {
            Some((_, indices)) => {
                row[..width].copy_from_slice(&indices[start..start + width]);
            }
            None => {
                for (dst, px) in row.chunks_exact_mut(bpp).zip(src) {
                    dst[0] = px.b;
                    dst[1] = px.g;
                    dst[2] = px.r;
                    if bpp == 4 {
                        dst[3] = 0;
                    }
                }
            }
        }
        writer.write_all(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Map every pixel to an entry of a 256-color palette.
///
/// Distinct colors are assigned in first-seen order. Images with more than
/// 256 colors fall back to a grayscale palette indexed by luma.
fn build_palette(image: &PixelBuffer) -> (Vec<Rgb>, Vec<u8>) {
    let mut lookup: HashMap<Rgb, u8> = HashMap::new();
    let mut palette = Vec::with_capacity(PALETTE_SIZE);
    let mut indices = Vec::with_capacity(image.len());

    for &px in image.pixels() {
        let idx = match lookup.get(&px) {
            Some(&idx) => idx,
            None => {
                if palette.len() == PALETTE_SIZE {
                    return grayscale_palette(image);
                }
                let idx = palette.len() as u8;
                palette.push(px);
                lookup.insert(px, idx);
                idx
            }
        };
        indices.push(idx);
    }

    palette.resize(PALETTE_SIZE, Rgb::BLACK);
    (palette, indices)
}

fn grayscale_palette(image: &PixelBuffer) -> (Vec<Rgb>, Vec<u8>) {
    log::warn!(
        "{}x{} image has more than {PALETTE_SIZE} colors; writing 8-bit grayscale",
        image.width(),
        image.height()
    );
    let palette = (0..=255u8).map(Rgb::gray).collect();
    let indices = image.pixels().iter().map(|&px| px.luma_u8()).collect();
    (palette, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_24bit_layout() {
        // 3 px wide: 9 bytes per row, padded to 12.
        let mut img = PixelBuffer::new(BitDepth::Rgb24, 3, 2).unwrap();
        img.set(0, 0, Rgb::new(1, 2, 3));
        img.set(0, 1, Rgb::new(4, 5, 6));
        let data = encode(&img).unwrap();

        assert_eq!(data.len(), 54 + 24);
        assert_eq!(&data[0..2], b"BM");
        assert_eq!(u32::from_le_bytes(data[2..6].try_into().unwrap()), 78);
        assert_eq!(u32::from_le_bytes(data[10..14].try_into().unwrap()), 54);
        assert_eq!(u32::from_le_bytes(data[14..18].try_into().unwrap()), 40);
        assert_eq!(i32::from_le_bytes(data[22..26].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(data[34..38].try_into().unwrap()), 24);
        assert_eq!(u32::from_le_bytes(data[46..50].try_into().unwrap()), 0);
        // Bottom row first, stored as BGR, padding zeroed.
        assert_eq!(&data[54..57], &[6, 5, 4]);
        assert_eq!(&data[63..66], &[0, 0, 0]);
        assert_eq!(&data[66..69], &[3, 2, 1]);
    }

    #[test]
    fn test_32bit_has_no_padding() {
        let img = PixelBuffer::filled(BitDepth::Rgb32, 3, 1, Rgb::new(9, 8, 7)).unwrap();
        let data = encode(&img).unwrap();
        assert_eq!(data.len(), 54 + 12);
        assert_eq!(&data[54..58], &[7, 8, 9, 0]);
    }

    #[test]
    fn test_8bit_writes_palette() {
        let mut img = PixelBuffer::filled(BitDepth::Indexed8, 2, 1, Rgb::new(10, 20, 30)).unwrap();
        img.set(1, 0, Rgb::new(40, 50, 60));
        let data = encode(&img).unwrap();

        let offset = 54 + 256 * 4;
        assert_eq!(u32::from_le_bytes(data[10..14].try_into().unwrap()), offset as u32);
        assert_eq!(u32::from_le_bytes(data[46..50].try_into().unwrap()), 256);
        assert_eq!(&data[54..58], &[30, 20, 10, 0]);
        assert_eq!(&data[58..62], &[60, 50, 40, 0]);
        assert_eq!(&data[offset..offset + 4], &[0, 1, 0, 0]);
        assert_eq!(data.len(), offset + 4);
    }

    #[test]
    fn test_8bit_many_colors_falls_back_to_gray() {
        let mut img = PixelBuffer::new(BitDepth::Indexed8, 300, 1).unwrap();
        for x in 0..300 {
            img.set(x, 0, Rgb::new((x % 256) as u8, (x / 256) as u8, 0));
        }
        let (palette, indices) = build_palette(&img);
        assert_eq!(palette[200], Rgb::gray(200));
        assert_eq!(indices[0], 0);
        assert_eq!(indices.len(), 300);
    }
}
