use std::{char, fmt, io};

/// A four-character resource tag, e.g. `MHWK` or `tBMP`.
///
/// The wire representation is a big-endian `u32` whose bytes are
/// simultaneously four ASCII characters; equality and hashing are on the
/// integer, `Display`/`Debug` show the four bytes.
#[macro_export]
macro_rules! tag {
    ($tag:literal) => {
        $crate::types::tag::Tag::new(*$tag)
    };
}

#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Tag([u8; 4]);

impl Tag {
    #[must_use]
    pub fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    #[must_use]
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    #[inline]
    fn fmt_write(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{}", char::from_u32(u32::from(*b)).unwrap_or(char::REPLACEMENT_CHARACTER))?;
        }
        Ok(())
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self([0; 4])
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_write(f)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(")?;
        self.fmt_write(f)?;
        write!(f, ")")
    }
}

impl std::str::FromStr for Tag {
    type Err = std::num::TryFromIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [b' '; 4];
        for (i, b) in s.as_bytes().iter().take(4).enumerate() {
            bytes[i] = *b;
        }
        Ok(Self(bytes))
    }
}

pub trait TagReadExt: io::Read {
    #[inline]
    fn read_tag(&mut self) -> io::Result<Tag> {
        let mut buf = [0; 4];
        self.read_exact(&mut buf)?;
        Ok(Tag(buf))
    }
}

impl<T: io::Read + ?Sized> TagReadExt for T {}
