//! Binary stream reading/writing.
//!
//! Rather than a dedicated stream type, these are blanket extension traits
//! over any `Read + Seek` (respectively `Write`) — a `File` and a
//! `Cursor<Vec<u8>>`/`&[u8]` both get the same typed accessors for free,
//! which is the file-backed/in-memory split the format calls for.

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

pub trait SeekExt: Seek {
    /// The current stream position.
    fn pos(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::Current(0))
    }

    /// The total length of the stream.
    fn stream_size(&mut self) -> io::Result<u64> {
        let pos = self.pos()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(pos))?;
        Ok(end)
    }
}

impl<T: Seek + ?Sized> SeekExt for T {}

/// Typed big/little-endian reads, plus a raw owned-buffer read, over any
/// seekable byte source.
pub trait ByteReadExt: Read {
    #[inline]
    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    #[inline]
    fn read_u8(&mut self) -> io::Result<u8> {
        ReadBytesExt::read_u8(self)
    }

    #[inline]
    fn read_i8(&mut self) -> io::Result<i8> {
        ReadBytesExt::read_i8(self)
    }

    #[inline]
    fn read_u16_be(&mut self) -> io::Result<u16> {
        self.read_u16::<BigEndian>()
    }

    #[inline]
    fn read_u16_le(&mut self) -> io::Result<u16> {
        self.read_u16::<LittleEndian>()
    }

    #[inline]
    fn read_i16_be(&mut self) -> io::Result<i16> {
        self.read_i16::<BigEndian>()
    }

    #[inline]
    fn read_i16_le(&mut self) -> io::Result<i16> {
        self.read_i16::<LittleEndian>()
    }

    #[inline]
    fn read_u32_be(&mut self) -> io::Result<u32> {
        self.read_u32::<BigEndian>()
    }

    #[inline]
    fn read_u32_le(&mut self) -> io::Result<u32> {
        self.read_u32::<LittleEndian>()
    }

    #[inline]
    fn read_i32_be(&mut self) -> io::Result<i32> {
        self.read_i32::<BigEndian>()
    }

    #[inline]
    fn read_i32_le(&mut self) -> io::Result<i32> {
        self.read_i32::<LittleEndian>()
    }
}

impl<T: Read + ?Sized> ByteReadExt for T {}

pub trait ByteWriteExt: Write {
    #[inline]
    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        WriteBytesExt::write_u8(self, value)
    }

    #[inline]
    fn write_u16_be(&mut self, value: u16) -> io::Result<()> {
        self.write_u16::<BigEndian>(value)
    }

    #[inline]
    fn write_u16_le(&mut self, value: u16) -> io::Result<()> {
        self.write_u16::<LittleEndian>(value)
    }

    #[inline]
    fn write_u32_be(&mut self, value: u32) -> io::Result<()> {
        self.write_u32::<BigEndian>(value)
    }

    #[inline]
    fn write_u32_le(&mut self, value: u32) -> io::Result<()> {
        self.write_u32::<LittleEndian>(value)
    }

    #[inline]
    fn write_i16_le(&mut self, value: i16) -> io::Result<()> {
        self.write_i16::<LittleEndian>(value)
    }
}

impl<T: Write + ?Sized> ByteWriteExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_big_and_little_endian() {
        let mut c = Cursor::new(vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(c.read_u16_be().unwrap(), 0x0102);
        assert_eq!(c.read_u16_le().unwrap(), 0x0403);
    }

    #[test]
    fn reads_raw_bytes() {
        let mut c = Cursor::new(vec![1, 2, 3, 4, 5]);
        assert_eq!(c.read_bytes(3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn pos_and_stream_size() {
        let mut c = Cursor::new(vec![0u8; 10]);
        c.seek(SeekFrom::Start(4)).unwrap();
        assert_eq!(c.pos().unwrap(), 4);
        assert_eq!(c.stream_size().unwrap(), 10);
        assert_eq!(c.pos().unwrap(), 4);
    }

    #[test]
    fn read_past_end_fails() {
        let mut c = Cursor::new(vec![1u8, 2]);
        assert!(c.read_bytes(10).is_err());
    }

    #[test]
    fn round_trips_writes() {
        let mut c = Cursor::new(Vec::new());
        c.write_u32_be(0xdead_beef).unwrap();
        c.write_u16_le(0x1234).unwrap();
        c.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(c.read_u32_be().unwrap(), 0xdead_beef);
        assert_eq!(c.read_u16_le().unwrap(), 0x1234);
    }
}
