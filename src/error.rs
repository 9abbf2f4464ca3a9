use crate::types::tag::Tag;
use std::io;

/// The error taxonomy for this crate: format-invalid, lookup-miss,
/// out-of-range, unsupported-feature, and io, per the resource-conversion
/// design. Every variant carries the offending resource type/id/value so
/// `Display` alone is the one-line diagnostic callers need.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("not a valid Mohawk archive (expected 'MHWK', found {0:?})")]
    BadMagic(Tag),

    #[error("not a valid Mohawk resource file (expected 'RSRC', found {0:?})")]
    BadRsrcTag(Tag),

    #[error("expected container tag {0:?}, found {1:?}")]
    UnexpectedContainerTag(Tag, Tag),

    #[error("unsupported Mohawk archive version 0x{0:04X}")]
    UnsupportedVersion(u16),

    #[error("resource {0} {1} not found")]
    NotFound(Tag, u16),

    #[error("name-table index {0} out of range (file table has {1} entries)")]
    BadNameIndex(u16, usize),

    #[error("file-table index {0} out of range ({1} entries)")]
    BadFileIndex(u16, usize),

    #[error("unsupported LZ dictionary size {0}")]
    BadLzDictionarySize(u16),

    #[error("unknown Riven compression sub-opcode 0x{0:02X}")]
    UnknownRivenSubOpcode(u8),

    #[error("unknown Riven script opcode {0}")]
    UnknownRivenOpcode(u16),

    #[error("unknown Riven script type {0}")]
    UnknownRivenScriptType(u16),

    #[error("invalid bits-per-pixel selector {0}")]
    BadBitsPerPixelSelector(u16),

    #[error("unknown pack type {0}")]
    UnknownPackType(u16),

    #[error("unknown draw type {0}")]
    UnknownDrawType(u16),

    #[error("{0} {1} has no palette; please specify one with --palette")]
    MissingPalette(Tag, u16),

    #[error("{0} {1} is a PICT image; PICT rendering is not supported")]
    UnsupportedPict(Tag, u16),

    #[error("unknown {0} {1} sound encoding {2}")]
    UnknownSoundEncoding(Tag, u16, u16),

    #[error("unknown Mohawk MIDI chunk tag {0:?}")]
    UnknownMidiChunk(Tag),

    #[error("{0} cannot be converted")]
    Unconvertible(Tag),
}

pub type Result<T> = std::result::Result<T, Error>;
