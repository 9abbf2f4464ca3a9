//! Mohawk MIDI container → Standard MIDI File reassembly.

use crate::error::{Error, Result};
use crate::io::ByteReadExt;
use crate::tag;
use crate::types::tag::TagReadExt;
use std::io::{Cursor, Read};

/// Strips the Mohawk container framing and reassembles `MThd`/`MTrk` chunks
/// into a Standard MIDI File. `Prg#` chunks are dropped; Mohawk's 2-byte
/// chunk alignment is removed since SMF doesn't use it.
pub fn convert<R: Read>(mut input: R) -> Result<Vec<u8>> {
    let mhwk = input.read_tag()?;
    if mhwk != tag!(b"MHWK") {
        return Err(Error::BadMagic(mhwk));
    }
    input.read_u32_be()?; // size, ignored

    let midi = input.read_tag()?;
    if midi != tag!(b"MIDI") {
        return Err(Error::UnexpectedContainerTag(tag!(b"MIDI"), midi));
    }

    let header_tag = input.read_tag()?;
    if header_tag != tag!(b"MThd") {
        return Err(Error::UnexpectedContainerTag(tag!(b"MThd"), header_tag));
    }
    let header_size = input.read_u32_be()?;
    let header_data = input.read_bytes(header_size as usize)?;

    let mut rest = Vec::new();
    input.read_to_end(&mut rest)?;
    let mut cursor = Cursor::new(rest);

    let mut track_data = Vec::new();
    while (cursor.position() as usize) < cursor.get_ref().len() {
        let chunk_tag = cursor.read_tag()?;
        let size = cursor.read_u32_be()?;

        if chunk_tag == tag!(b"Prg#") {
            cursor.set_position(cursor.position() + u64::from(size));
        } else if chunk_tag == tag!(b"MTrk") {
            track_data.extend_from_slice(chunk_tag.as_bytes());
            track_data.extend_from_slice(&size.to_be_bytes());
            track_data.extend_from_slice(&cursor.read_bytes(size as usize)?);
        } else {
            return Err(Error::UnknownMidiChunk(chunk_tag));
        }

        if size & 1 != 0 {
            cursor.set_position(cursor.position() + 1);
        }
    }

    let mut output = Vec::with_capacity(8 + header_data.len() + track_data.len());
    output.extend_from_slice(b"MThd");
    output.extend_from_slice(&header_size.to_be_bytes());
    output.extend_from_slice(&header_data);
    output.extend_from_slice(&track_data);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_header_and_track_dropping_prg_chunks() {
        let mut data = Vec::new();
        data.extend_from_slice(b"MHWK");
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"MIDI");
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 1, 0, 96]);

        data.extend_from_slice(b"Prg#");
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(&[1, 2]);

        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&3u32.to_be_bytes());
        data.extend_from_slice(&[9, 9, 9]);
        data.push(0); // alignment pad for the odd-sized MTrk chunk

        let out = convert(Cursor::new(data)).unwrap();
        assert_eq!(&out[0..4], b"MThd");
        assert_eq!(u32::from_be_bytes([out[4], out[5], out[6], out[7]]), 6);
        assert_eq!(&out[8..14], &[0, 0, 0, 1, 0, 96]);
        assert_eq!(&out[14..18], b"MTrk");
        assert_eq!(&out[22..25], &[9, 9, 9]);
        assert_eq!(out.len(), 25);
    }
}
