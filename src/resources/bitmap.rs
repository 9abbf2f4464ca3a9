//! `tBMP`/`WDIB` paletted bitmap decoding.
//!
//! A bitmap resource is a small fixed header, an optional embedded palette,
//! a packed pixel stream (raw, LZ, or Riven-compressed), and a draw step
//! (raw rows or RLE8 runs) that turns the unpacked stream into pixels.

use crate::compression::{lz, riven};
use crate::error::{Error, Result};
use crate::io::{ByteReadExt, SeekExt};
use crate::resources::palette::Palette;
use crate::types::tag::Tag;
use std::io::{Cursor, Read, Seek, SeekFrom};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum PackType {
    Raw,
    Lz,
    Riven,
}

impl PackType {
    fn from_format(format: u16) -> Result<Self> {
        match (format >> 8) & 0x0F {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Lz),
            4 => Ok(Self::Riven),
            other => Err(Error::UnknownPackType(other)),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum DrawType {
    Raw,
    Rle8,
}

impl DrawType {
    fn from_format(format: u16) -> Result<Self> {
        match (format >> 4) & 0x0F {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Rle8),
            other => Err(Error::UnknownDrawType(other)),
        }
    }
}

fn bits_per_pixel(format: u16) -> Result<u8> {
    match format & 0x07 {
        0 => Ok(1),
        1 => Ok(4),
        2 => Ok(8),
        3 => Ok(16),
        4 => Ok(24),
        _ => Err(Error::BadBitsPerPixelSelector(format & 0x07)),
    }
}

/// A decoded image, ready to be written out as a PNG.
pub struct DecodedImage {
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u8,
    /// Row-major pixel data: one byte per pixel (8-bit paletted) or three
    /// bytes per pixel in RGB order (24-bit).
    pub pixels: Vec<u8>,
    pub palette: Option<Palette>,
}

struct Header {
    width: u16,
    height: u16,
    pitch: u16,
    format: u16,
}

fn read_header<R: Read>(input: &mut R) -> Result<Header> {
    Ok(Header {
        width: input.read_u16_be()? & 0x3FFF,
        height: input.read_u16_be()? & 0x3FFF,
        pitch: input.read_u16_be()? & 0x3FFE,
        format: input.read_u16_be()?,
    })
}

/// Reads the 256-entry embedded palette carried directly in a bitmap
/// resource (BGR on the wire, re-ordered to RGB).
fn read_embedded_palette<R: Read>(input: &mut R) -> Result<Palette> {
    input.read_u16_be()?; // table size, unused
    input.read_u8()?; // bit size, unused
    input.read_u8()?; // color count, unused

    let mut palette = Vec::with_capacity(256);
    for _ in 0..256 {
        let b = input.read_u8()?;
        let g = input.read_u8()?;
        let r = input.read_u8()?;
        palette.push([r, g, b]);
    }
    Ok(palette)
}

fn unpack(pack_type: PackType, input: &[u8]) -> Result<Vec<u8>> {
    match pack_type {
        PackType::Raw => Ok(input.to_vec()),
        PackType::Lz => lz::unpack(Cursor::new(input)),
        PackType::Riven => riven::unpack(Cursor::new(input)),
    }
}

fn draw_raw(input: &[u8], width: u16, height: u16, pitch: u16, bpp: u8) -> Result<Vec<u8>> {
    let width = usize::from(width);
    let height = usize::from(height);
    let pitch = usize::from(pitch);
    let bytes_per_pixel = match bpp {
        8 => 1,
        24 => 3,
        _ => return Err(Error::UnknownDrawType(0)),
    };

    let mut cursor = Cursor::new(input);
    let mut pixels = Vec::with_capacity(width * height * bytes_per_pixel);

    for _ in 0..height {
        if bpp == 8 {
            pixels.extend_from_slice(&cursor.read_bytes(width)?);
        } else {
            for _ in 0..width {
                let b = cursor.read_u8()?;
                let g = cursor.read_u8()?;
                let r = cursor.read_u8()?;
                pixels.extend_from_slice(&[r, g, b]);
            }
        }
        cursor.seek(SeekFrom::Current((pitch - width * bytes_per_pixel) as i64))?;
    }

    Ok(pixels)
}

fn draw_rle8(input: &[u8], width: u16, height: u16, bpp: u8) -> Result<Vec<u8>> {
    if bpp != 8 {
        return Err(Error::UnknownDrawType(1));
    }
    let width = usize::from(width);
    let mut cursor = Cursor::new(input);
    let mut pixels = Vec::with_capacity(width * usize::from(height));

    for _ in 0..height {
        let row_byte_count = u64::from(cursor.read_u16_be()?);
        let start_pos = cursor.pos()?;
        let mut remaining = width;

        while remaining > 0 {
            let code = cursor.read_u8()?;
            let mut run_len = usize::from(code & 0x7F) + 1;
            if run_len > remaining {
                run_len = remaining;
            }

            if code & 0x80 == 0 {
                pixels.extend_from_slice(&cursor.read_bytes(run_len)?);
            } else {
                let val = cursor.read_u8()?;
                pixels.extend(std::iter::repeat(val).take(run_len));
            }
            remaining -= run_len;
        }

        cursor.seek(SeekFrom::Start(start_pos + row_byte_count))?;
    }

    Ok(pixels)
}

/// Decodes a single `tBMP` image resource. `external_palette` is consulted
/// only when the image is below 16 bits per pixel and carries no embedded
/// palette.
pub fn decode(
    data: &[u8],
    res_tag: Tag,
    res_id: u16,
    external_palette: Option<&Palette>,
) -> Result<DecodedImage> {
    if is_pict(data) {
        return Err(Error::UnsupportedPict(res_tag, res_id));
    }

    let mut cursor = Cursor::new(data);
    let header = read_header(&mut cursor)?;

    let bpp = bits_per_pixel(header.format)?;
    let has_palette = header.format & 0x0080 != 0;
    let draw_type = DrawType::from_format(header.format)?;
    let pack_type = PackType::from_format(header.format)?;

    let palette = if has_palette || pack_type == PackType::Riven {
        Some(read_embedded_palette(&mut cursor)?)
    } else if bpp < 16 {
        match external_palette {
            Some(p) => Some(p.clone()),
            None => return Err(Error::MissingPalette(res_tag, res_id)),
        }
    } else {
        None
    };

    let mut rest = Vec::new();
    cursor.read_to_end(&mut rest)?;
    let unpacked = unpack(pack_type, &rest)?;

    let pixels = match draw_type {
        DrawType::Raw => draw_raw(&unpacked, header.width, header.height, header.pitch, bpp)?,
        DrawType::Rle8 => draw_rle8(&unpacked, header.width, header.height, bpp)?,
    };

    Ok(DecodedImage {
        width: header.width,
        height: header.height,
        bits_per_pixel: bpp,
        pixels,
        palette,
    })
}

/// Decodes a bitmap-set resource: a small header followed by an LZ/Riven/raw
/// packed stream that, once unpacked, holds `imageCount` offsets (biased by
/// -8) followed by concatenated sub-images, each re-decoded with [`decode`].
pub fn decode_set(
    data: &[u8],
    res_tag: Tag,
    res_id: u16,
    external_palette: Option<&Palette>,
) -> Result<Vec<DecodedImage>> {
    let mut cursor = Cursor::new(data);
    let image_count = cursor.read_u16_be()? & 0x3FFF;
    cursor.read_bytes(4)?; // reserved
    let format = cursor.read_u16_be()?;
    let pack_type = PackType::from_format(format)?;

    let mut rest = Vec::new();
    cursor.read_to_end(&mut rest)?;
    let unpacked = unpack(pack_type, &rest)?;

    let mut offsets = Cursor::new(&unpacked);
    let mut image_offsets = Vec::with_capacity(image_count as usize);
    for _ in 0..image_count {
        let offset = offsets.read_u32_be()?;
        image_offsets.push(offset as usize - 8);
    }

    image_offsets
        .into_iter()
        .map(|offset| decode(&unpacked[offset..], res_tag, res_id, external_palette))
        .collect()
}

/// Detects the Apple PICT signature (512-byte preamble, 10 reserved bytes,
/// then the `0x001102FF` PICT opcode marker) so PICT resources can be
/// rejected without attempting a full parse.
#[must_use]
pub fn is_pict(data: &[u8]) -> bool {
    const PREAMBLE: usize = 512;
    data.len() >= PREAMBLE + 10 + 4 && data[PREAMBLE + 10..PREAMBLE + 14] == [0x00, 0x11, 0x02, 0xFF]
}

/// Detects a bitmap-set resource ahead of [`decode`] vs. [`decode_set`]
/// dispatch.
///
/// A single image's header and a bitmap-set's header are both an 8-byte
/// `(u16, u16, u16, u16)` tuple, and both mask their leading field with
/// `0x3FFF` (`width & 0x3FFF` for a single image, `imageCount & 0x3FFF` for
/// a set) — the shared mask means bit `0x8000` of that leading field is
/// reserved in both layouts rather than ever holding real width/count data,
/// so it doubles as the set/single discriminator.
#[must_use]
pub fn is_set(data: &[u8]) -> bool {
    data.len() >= 2 && u16::from_be_bytes([data[0], data[1]]) & 0x8000 != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;

    #[test]
    fn rejects_unknown_pack_type() {
        let mut data = vec![0u8; 8];
        data[6] = 0x02; // format: packType = 2 (unassigned)
        let err = decode(&data, tag!(b"tBMP"), 1, None).unwrap_err();
        assert!(matches!(err, Error::UnknownPackType(2)));
    }

    #[test]
    fn missing_palette_is_named_error() {
        // 8bpp (format & 7 == 2), no palette bit, raw pack/draw.
        let mut data = vec![0u8; 8];
        data[6] = 0x00;
        data[7] = 0x02;
        let err = decode(&data, tag!(b"tBMP"), 7, None).unwrap_err();
        assert!(matches!(err, Error::MissingPalette(t, 7) if t == tag!(b"tBMP")));
    }

    #[test]
    fn raw_8bit_round_trip_with_external_palette() {
        // 2x1 image, 8bpp, drawType=Raw, packType=Raw, pitch=2.
        let mut data = Vec::new();
        data.extend_from_slice(&2u16.to_be_bytes()); // width
        data.extend_from_slice(&1u16.to_be_bytes()); // height
        data.extend_from_slice(&2u16.to_be_bytes()); // pitch
        data.extend_from_slice(&0x0002u16.to_be_bytes()); // format: bpp=8, drawType=0, packType=0
        data.extend_from_slice(&[5, 9]); // raw pixel bytes

        let palette: Palette = (0..256).map(|i| [i as u8; 3]).collect();
        let image = decode(&data, tag!(b"tBMP"), 1, Some(&palette)).unwrap();
        assert_eq!(image.pixels, vec![5, 9]);
        assert_eq!(image.bits_per_pixel, 8);
    }

    #[test]
    fn pict_signature_detected() {
        let mut data = vec![0u8; 512 + 10 + 4];
        data[512 + 10..512 + 14].copy_from_slice(&[0x00, 0x11, 0x02, 0xFF]);
        assert!(is_pict(&data));
        assert!(!is_pict(&vec![0u8; 10]));
    }

    #[test]
    fn decode_rejects_pict_signature() {
        let mut data = vec![0u8; 512 + 10 + 4];
        data[512 + 10..512 + 14].copy_from_slice(&[0x00, 0x11, 0x02, 0xFF]);
        let err = decode(&data, tag!(b"tBMP"), 3, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPict(t, 3) if t == tag!(b"tBMP")));
    }

    #[test]
    fn is_set_reads_the_top_bit_of_the_leading_field() {
        let single = [0x00, 0x02, 0, 1, 0, 2, 0, 0]; // width=2, no set flag
        assert!(!is_set(&single));

        let set = [0x80, 0x02, 0, 0, 0, 0, 0, 0]; // imageCount=2 with the set flag
        assert!(is_set(&set));
    }

    #[test]
    fn decode_set_splits_concatenated_sub_images() {
        // Two 1x1 8bpp raw images packed back to back, offsets biased by -8.
        let mut image_a = Vec::new();
        image_a.extend_from_slice(&1u16.to_be_bytes()); // width
        image_a.extend_from_slice(&1u16.to_be_bytes()); // height
        image_a.extend_from_slice(&1u16.to_be_bytes()); // pitch
        image_a.extend_from_slice(&0x0002u16.to_be_bytes()); // bpp=8, raw/raw
        image_a.push(11);

        let mut image_b = Vec::new();
        image_b.extend_from_slice(&1u16.to_be_bytes());
        image_b.extend_from_slice(&1u16.to_be_bytes());
        image_b.extend_from_slice(&1u16.to_be_bytes());
        image_b.extend_from_slice(&0x0002u16.to_be_bytes());
        image_b.push(22);

        // The offsets table itself (2 entries * 4 bytes) precedes the
        // images, so each real index is offset by its size; the on-disk
        // fields then add the -8 bias back on top of that.
        let offsets_table_len = 2 * 4u32;
        let index_a = offsets_table_len;
        let index_b = index_a + image_a.len() as u32;

        let mut packed = Vec::new();
        packed.extend_from_slice(&(index_a + 8).to_be_bytes());
        packed.extend_from_slice(&(index_b + 8).to_be_bytes());
        packed.extend_from_slice(&image_a);
        packed.extend_from_slice(&image_b);

        let mut data = Vec::new();
        data.extend_from_slice(&0x8002u16.to_be_bytes()); // imageCount=2, set flag set
        data.extend_from_slice(&[0, 0, 0, 0]); // reserved
        data.extend_from_slice(&0x0000u16.to_be_bytes()); // format: packType=Raw
        data.extend_from_slice(&packed);

        assert!(is_set(&data));
        let palette: Palette = (0..256).map(|i| [i as u8; 3]).collect();
        let images = decode_set(&data, tag!(b"tBMP"), 1, Some(&palette)).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].pixels, vec![11]);
        assert_eq!(images[1].pixels, vec![22]);
    }
}
