//! Mac black/white cursor → Windows `.cur` transcoding.

use crate::error::Result;
use crate::io::{ByteReadExt, ByteWriteExt};
use std::io::{Read, Write};

/// Transcodes a 32-byte XOR plane + 32-byte AND mask + `(hotspotY,
/// hotspotX)` Mac cursor into a complete Windows CUR file.
pub fn convert<R: Read, W: Write>(mut input: R, mut output: W) -> Result<()> {
    let mut icon_data = [0u8; 32];
    input.read_exact(&mut icon_data)?;
    let mut mask_data = [0u8; 32];
    input.read_exact(&mut mask_data)?;

    for i in 0..32 {
        let data = icon_data[i];
        let mask = mask_data[i];
        icon_data[i] = !data & mask;
        mask_data[i] = !mask;
    }

    let hotspot_y = input.read_u16_be()?;
    let hotspot_x = input.read_u16_be()?;

    // Cursor file header.
    output.write_u16_le(0)?; // reserved
    output.write_u16_le(2)?; // type: cursor
    output.write_u16_le(1)?; // image count

    // Cursor image header.
    output.write_u8(16)?; // width
    output.write_u8(16)?; // height
    output.write_u8(2)?; // color count
    output.write_u8(0)?; // reserved
    output.write_u16_le(hotspot_x)?;
    output.write_u16_le(hotspot_y)?;
    output.write_u32_le(40 + 4 * 16 * 2 + 8)?; // bitmap size
    output.write_u32_le(6 + 16)?; // offset to bitmap data

    // BITMAPINFOHEADER.
    output.write_u32_le(40)?;
    output.write_u32_le(16)?;
    output.write_u32_le(16 * 2)?; // height doubled: XOR plane + AND plane
    output.write_u16_le(1)?; // planes
    output.write_u16_le(1)?; // bits per pixel
    output.write_u32_le(0)?; // compression
    output.write_u32_le(4 * 16 * 2)?; // image size
    output.write_u32_le(0)?; // h-res
    output.write_u32_le(0)?; // v-res
    output.write_u32_le(2)?; // palette entries
    output.write_u32_le(0)?; // important colors

    output.write_u32_be(0x0000_00FF)?;
    output.write_u32_be(0xFFFF_FFFF)?;

    for y in (0..32).step_by(2).rev() {
        output.write_all(&icon_data[y..y + 2])?;
        output.write_u16_le(0)?; // 4-byte row alignment
    }
    for y in (0..32).step_by(2).rev() {
        output.write_all(&mask_data[y..y + 2])?;
        output.write_u16_le(0)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn produces_exactly_198_bytes() {
        let mut input = vec![0u8; 32];
        input.extend_from_slice(&[0xFFu8; 32]);
        input.extend_from_slice(&7u16.to_be_bytes()); // hotspotY
        input.extend_from_slice(&3u16.to_be_bytes()); // hotspotX

        let mut out = Vec::new();
        convert(Cursor::new(input), &mut out).unwrap();
        assert_eq!(out.len(), 6 + 16 + 40 + 8 + 64 + 64);

        // Hotspot coordinates land at fixed offsets within the cursor header.
        assert_eq!(u16::from_le_bytes([out[10], out[11]]), 3); // hotspotX
        assert_eq!(u16::from_le_bytes([out[12], out[13]]), 7); // hotspotY
    }
}
