//! Generic Mohawk string-list resources: a byte count followed by that many
//! CP-1252 C-strings, emitted as a JSON array.

use crate::error::{Error, Result};
use crate::io::ByteReadExt;
use crate::string::StringReadExt;
use encoding::{DecoderTrap, Encoding};
use std::io::{self, Read};

/// Decodes a string-list resource into its component strings. `\r` is
/// normalized to `\n`, matching the source text's line-ending convention.
pub fn decode<R: Read>(mut input: R) -> Result<Vec<String>> {
    let count = input.read_u8()?;
    let mut strings = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let bytes = input.read_c_string()?;
        let text = encoding::all::WINDOWS_1252
            .decode(&bytes, DecoderTrap::Replace)
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e.into_owned())))?;
        strings.push(text.replace('\r', "\n"));
    }

    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_strings_and_normalizes_carriage_returns() {
        let mut data = vec![2u8];
        data.extend_from_slice(b"first\0");
        data.extend_from_slice(b"line one\rline two\0");

        let strings = decode(Cursor::new(data)).unwrap();
        assert_eq!(strings, vec!["first".to_string(), "line one\nline two".to_string()]);
    }
}
