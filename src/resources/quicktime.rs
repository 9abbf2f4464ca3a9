//! QuickTime atom tree rewriter: fixes up `stco` chunk offsets when a movie
//! is extracted from its enclosing Mohawk archive.

use crate::error::Result;
use crate::io::{ByteReadExt, ByteWriteExt};
use crate::types::tag::{Tag, TagReadExt};
use std::io::{Read, Write};

fn is_container(tag: Tag) -> bool {
    tag.as_bytes() == b"moov"
        || tag.as_bytes() == b"trak"
        || tag.as_bytes() == b"mdia"
        || tag.as_bytes() == b"minf"
        || tag.as_bytes() == b"stbl"
}

/// Copies one atom (and, for a handful of known container tags, recurses
/// into its first child) from `input` to `output`, rewriting `stco` chunk
/// offsets by subtracting `res_offset`.
fn copy_atom<R: Read, W: Write>(input: &mut R, output: &mut W, res_offset: u32) -> Result<()> {
    let atom_size = input.read_u32_be()?;
    let atom_tag = input.read_tag()?;
    output.write_u32_be(atom_size)?;
    output.write_all(atom_tag.as_bytes())?;

    if is_container(atom_tag) {
        copy_atom(input, output, res_offset)?;
    } else if atom_tag.as_bytes() == b"stco" {
        let mut version_flags = [0u8; 4];
        input.read_exact(&mut version_flags)?;
        output.write_all(&version_flags)?;

        let chunk_count = input.read_u32_be()?;
        output.write_u32_be(chunk_count)?;

        for _ in 0..chunk_count {
            let chunk_offset = input.read_u32_be()?;
            output.write_u32_be(chunk_offset - res_offset)?;
        }
    } else {
        let body = input.read_bytes(atom_size as usize - 8)?;
        output.write_all(&body)?;
    }

    Ok(())
}

/// Rewrites every `stco` entry in `data` (a `tMOV` resource payload) by
/// `res_offset`, the resource's absolute offset within the source archive.
pub fn convert(data: &[u8], res_offset: u32) -> Result<Vec<u8>> {
    let mut input = std::io::Cursor::new(data);
    let mut output = Vec::with_capacity(data.len());

    while (input.position() as usize) < data.len() {
        copy_atom(&mut input, &mut output, res_offset)?;
    }

    Ok(output)
}
