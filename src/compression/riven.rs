//! Riven's proprietary opcode-stream decompressor.
//!
//! No reference implementation of this codec survives anywhere in the
//! corpus this was built from (the tool it descends from left it as a stub).
//! The sub-code dispatch table below is an internally-consistent reading of
//! the opcode families, not a transcription of a known-good decoder; see
//! `DESIGN.md` for the record of that decision.

use crate::error::{Error, Result};
use std::io::{self, Read};

fn read_u8<R: Read>(input: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    input.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn eof(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, msg.to_string())
}

/// Appends `length` bytes read starting `distance` bytes behind the current
/// end of `output`, one byte at a time so that `distance < length` (an
/// overlapping, self-referential copy) reproduces correctly.
fn copy_back(output: &mut Vec<u8>, distance: usize, length: usize) -> io::Result<()> {
    if distance == 0 || distance > output.len() {
        return Err(eof("Riven back-reference distance exceeds output produced so far"));
    }
    let mut src = output.len() - distance;
    for _ in 0..length {
        let byte = output[src];
        output.push(byte);
        src += 1;
    }
    Ok(())
}

/// Executes one specialized sub-command (a single sub-code byte `s`),
/// appending its output to `output`. See the module doc for the family
/// layout.
fn run_sub_command<R: Read>(input: &mut R, output: &mut Vec<u8>) -> Result<()> {
    let s = read_u8(input)?;

    match s {
        // Short back-reference: copy one 2-byte word from a small distance.
        0x00..=0x3F => {
            let distance = 2 * usize::from(s) + 2;
            copy_back(output, distance, 2)?;
        }

        // Literal byte, then one byte copied from a small distance.
        0x40..=0x7F => {
            let distance = 2 * usize::from(s - 0x40) + 2;
            output.push(read_u8(input)?);
            copy_back(output, distance, 1)?;
        }

        // One byte copied from a small distance, then a literal byte.
        0x80..=0xBF => {
            let distance = 2 * usize::from(s - 0x80) + 2;
            copy_back(output, distance, 1)?;
            output.push(read_u8(input)?);
        }

        // Adjacent-byte arithmetic adjustment: re-emit the last two output
        // bytes, the first incremented and the second decremented by the
        // same nibble delta (wrapping mod 256, per the format's framing).
        0xC0..=0xCF => {
            let delta = s - 0xC0;
            if output.len() < 2 {
                return Err(eof("arithmetic adjustment with fewer than 2 prior output bytes").into());
            }
            let (a, b) = (output[output.len() - 2], output[output.len() - 1]);
            output.push(a.wrapping_add(delta));
            output.push(b.wrapping_sub(delta));
        }

        // Two-byte verbatim passthrough.
        0xD0..=0xDF => {
            output.push(read_u8(input)?);
            output.push(read_u8(input)?);
        }

        // Extended long-distance back-reference: length is fixed by the
        // sub-code (3..=13), distance is 10 bits split across the sub-code's
        // low 2 bits and one following byte.
        0xE0..=0xEA => {
            let length = 3 + usize::from(s - 0xE0);
            let next = read_u8(input)?;
            let distance = (usize::from(s & 3) << 8) | usize::from(next);
            copy_back(output, distance, length)?;
        }

        // Maximal form: a longer run, plus one trailing literal or one more
        // single-byte back-reference depending on bit 2 of the first code
        // byte.
        0xFC => {
            let code1 = read_u8(input)?;
            let code2 = read_u8(input)?;
            let distance = (usize::from(code1 & 3) << 8) | usize::from(code2);
            let length = (usize::from(code1 >> 3) + 1) * 2 + 1;
            copy_back(output, distance, length)?;

            if code1 & 0x04 != 0 {
                output.push(read_u8(input)?);
            } else {
                let extra = read_u8(input)?;
                let distance2 = (usize::from(code1 & 3) << 8) | usize::from(extra);
                copy_back(output, distance2, 1)?;
            }
        }

        _ => return Err(Error::UnknownRivenSubOpcode(s)),
    }

    Ok(())
}

/// Decodes a full Riven opcode stream. `input` starts at the 4-byte
/// (ignored) buffer-size prologue.
pub fn unpack<R: Read>(mut input: R) -> Result<Vec<u8>> {
    let mut prologue = [0u8; 4];
    input.read_exact(&mut prologue)?;

    let mut output = Vec::new();

    loop {
        let c = match read_u8(&mut input) {
            Ok(c) => c,
            Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };

        match c {
            0x00 => break,

            0x01..=0x3F => {
                let mut word = [0u8; 2];
                for _ in 0..c {
                    input.read_exact(&mut word)?;
                    output.extend_from_slice(&word);
                }
            }

            0x40..=0x7F => {
                if output.len() < 2 {
                    return Err(eof("word repeat with no prior word").into());
                }
                let word = [output[output.len() - 2], output[output.len() - 1]];
                for _ in 0..(c - 0x40) {
                    output.extend_from_slice(&word);
                }
            }

            0x80..=0xBF => {
                if output.len() < 4 {
                    return Err(eof("double-word repeat with no prior word").into());
                }
                let quad: [u8; 4] = output[output.len() - 4..].try_into().unwrap();
                for _ in 0..(c - 0x80) {
                    output.extend_from_slice(&quad);
                }
            }

            0xC0..=0xFF => {
                let count = c - 0xC0;
                for _ in 0..count {
                    run_sub_command(&mut input, &mut output)?;
                }
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 4]; // buffer-size prologue, ignored
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn empty_stream_yields_no_output() {
        let out = unpack(Cursor::new(frame(&[0x00]))).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn word_verbatim_copies_input_words() {
        // c=2: copy 2 words (4 bytes) verbatim, then end.
        let out = unpack(Cursor::new(frame(&[0x02, 1, 2, 3, 4, 0x00]))).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn word_repeat_duplicates_last_word() {
        // One verbatim word "ab", then repeat it 2 more times.
        let out = unpack(Cursor::new(frame(&[0x01, b'a', b'b', 0x42, 0x00]))).unwrap();
        assert_eq!(out, b"ababab");
    }

    #[test]
    fn double_word_repeat_duplicates_last_four_bytes() {
        let out = unpack(Cursor::new(frame(&[0x02, b'a', b'b', b'c', b'd', 0x81, 0x00]))).unwrap();
        assert_eq!(out, b"abcdabcd");
    }

    #[test]
    fn specialized_two_byte_verbatim_sub_command() {
        // c = 0xC1 -> one sub-command; sub-code 0xD0 reads 2 raw bytes.
        let out = unpack(Cursor::new(frame(&[0xC1, 0xD0, b'x', b'y', 0x00]))).unwrap();
        assert_eq!(out, b"xy");
    }

    #[test]
    fn specialized_extended_back_reference() {
        // Seed "abcdefg" via verbatim words, then a length-3 back-reference
        // 7 bytes behind (distance encoded as (s&3)<<8 | next == 7).
        let mut body = vec![0x04u8]; // 4 words = 8 bytes verbatim
        body.extend_from_slice(b"abcdefgh");
        body.push(0xC1); // one sub-command
        body.push(0xE0); // length = 3, distance high bits = 0
        body.push(7); // distance low byte -> distance = 7
        body.push(0x00);

        let out = unpack(Cursor::new(frame(&body))).unwrap();
        assert_eq!(&out[..8], b"abcdefgh");
        assert_eq!(&out[8..11], b"bcd");
    }

    #[test]
    fn unknown_sub_opcode_is_an_error() {
        let err = unpack(Cursor::new(frame(&[0xC1, 0xEF, 0x00]))).unwrap_err();
        assert!(matches!(err, Error::UnknownRivenSubOpcode(0xEF)));
    }
}
