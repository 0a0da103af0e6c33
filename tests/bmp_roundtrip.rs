use bitmap_filters::*;

fn pattern(depth: BitDepth, width: usize, height: usize) -> PixelBuffer {
    let mut img = PixelBuffer::new(depth, width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            let px = if depth == BitDepth::Indexed8 {
                // Keep well under 256 distinct colors
                Rgb::new((x * 40) as u8, (y * 50) as u8, ((x + y) % 2 * 255) as u8)
            } else {
                Rgb::new((x * 37 + y) as u8, (y * 91) as u8, (x * y * 13) as u8)
            };
            img.set(x, y, px);
        }
    }
    img
}

/// Hand-built 24-bit file with a 2x2 image, rows in the given order.
fn two_by_two(height_field: i32, rows: [[Rgb; 2]; 2]) -> Vec<u8> {
    let stride = 8; // 6 bytes of pixels + 2 padding
    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(54u32 + 2 * stride).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&54u32.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&2i32.to_le_bytes());
    out.extend_from_slice(&height_field.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(2 * stride).to_le_bytes());
    out.extend_from_slice(&3780i32.to_le_bytes());
    out.extend_from_slice(&3780i32.to_le_bytes());
    out.extend_from_slice(&[0; 8]);
    for row in rows {
        for px in row {
            out.extend_from_slice(&[px.b, px.g, px.r]);
        }
        out.extend_from_slice(&[0, 0]);
    }
    out
}

const MARKER: Rgb = Rgb::new(255, 0, 0);
const FILL: Rgb = Rgb::new(0, 0, 255);

#[test]
fn bmp_roundtrip_24bit_padded_rows() {
    let img = pattern(BitDepth::Rgb24, 5, 3);
    let encoded = bmp::encode(&img).unwrap();
    // 5 * 3 = 15 bytes per row, padded to 16
    assert_eq!(encoded.len(), 54 + 16 * 3);
    let decoded = bmp::decode(&encoded).unwrap();
    assert_eq!(decoded, img);
}

#[test]
fn bmp_roundtrip_32bit() {
    let img = pattern(BitDepth::Rgb32, 7, 4);
    let encoded = bmp::encode(&img).unwrap();
    assert_eq!(encoded.len(), 54 + 28 * 4);
    let decoded = bmp::decode(&encoded).unwrap();
    assert_eq!(decoded, img);
}

#[test]
fn bmp_roundtrip_8bit_palette() {
    let img = pattern(BitDepth::Indexed8, 6, 5);
    let encoded = bmp::encode(&img).unwrap();
    // 256-entry palette, 6 index bytes per row padded to 8
    assert_eq!(encoded.len(), 54 + 1024 + 8 * 5);
    assert_eq!(u32::from_le_bytes([encoded[10], encoded[11], encoded[12], encoded[13]]), 1078);
    let decoded = bmp::decode(&encoded).unwrap();
    assert_eq!(decoded, img);
}

#[test]
fn bmp_roundtrip_through_file() {
    let img = pattern(BitDepth::Rgb24, 9, 2);
    let path = std::env::temp_dir()
        .join(format!("bitmap_filters_roundtrip_{}.bmp", std::process::id()));
    img.save(&path).unwrap();
    let loaded = PixelBuffer::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, img);
}

#[test]
fn bmp_negative_height_is_top_down() {
    let data = two_by_two(-2, [[MARKER, FILL], [FILL, FILL]]);
    let img = bmp::decode(&data).unwrap();
    assert_eq!((img.width(), img.height()), (2, 2));
    assert_eq!(img.get(0, 0), MARKER);
    assert_eq!(img.get(0, 1), FILL);
}

#[test]
fn bmp_positive_height_is_bottom_up() {
    // The first row on disk is the bottom row of the image
    let data = two_by_two(2, [[FILL, FILL], [MARKER, FILL]]);
    let img = bmp::decode(&data).unwrap();
    assert_eq!(img.get(0, 0), MARKER);
    assert_eq!(img.get(0, 1), FILL);
}

#[test]
fn bmp_writer_emits_bottom_up_rows() {
    let mut img = PixelBuffer::filled(BitDepth::Rgb24, 2, 2, FILL).unwrap();
    img.set(0, 0, MARKER);
    let encoded = bmp::encode(&img).unwrap();
    assert_eq!(encoded, two_by_two(2, [[FILL, FILL], [MARKER, FILL]]));
}
