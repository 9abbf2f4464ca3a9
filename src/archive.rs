use crate::{
    error::{Error, Result},
    io::{ByteReadExt, SeekExt},
    string::StringReadExt,
    tag,
    types::{reader::Reader, tag::Tag},
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    io::{Seek, SeekFrom},
};

/// A single file-table slot: an absolute payload offset plus its 27-bit
/// size, reassembled from the peculiar low16/mid8/flags-top3 encoding.
#[derive(Copy, Clone, Debug)]
struct FileTableEntry {
    offset: u32,
    size: u32,
}

/// A resource as recorded in the archive's directory — not yet read from
/// disk.
#[derive(Clone, Debug)]
struct Entry {
    offset: u32,
    size: u32,
    name: Option<String>,
}

/// A parsed Mohawk resource archive.
///
/// Construction reads the entire header/file-table/type-table/name-table
/// region once; after that the archive is immutable and every lookup is a
/// map access plus, for [`MohawkArchive::get`], a single seek-and-read of
/// the payload. The underlying reader is wrapped in a `RefCell` because
/// every read is a seek-then-read pair that mutates the stream position —
/// mirroring the resource-file readers this is modeled on, which hand out
/// `&self` resource handles backed by the same shared, interior-mutable
/// cursor rather than requiring `&mut self` everywhere.
#[derive(Debug)]
pub struct MohawkArchive<T> {
    input: RefCell<T>,
    file_size: u64,
    types: HashMap<Tag, BTreeMap<u16, Entry>>,
}

impl<T: Reader> MohawkArchive<T> {
    /// Parses the archive directory out of `input`. See §4.2 for the wire
    /// format this walks.
    pub fn new(mut input: T) -> Result<Self> {
        input.seek(SeekFrom::Start(0))?;

        let mhwk = input.read_tag()?;
        if mhwk != tag!(b"MHWK") {
            return Err(Error::BadMagic(mhwk));
        }
        input.read_u32_be()?; // file size, ignored: derived from the stream itself below

        let rsrc = input.read_tag()?;
        if rsrc != tag!(b"RSRC") {
            return Err(Error::BadRsrcTag(rsrc));
        }

        let version = input.read_u16_be()?;
        if version != 0x0100 {
            return Err(Error::UnsupportedVersion(version));
        }

        input.read_u16_be()?; // compaction, ignored
        input.read_u32_be()?; // RSRC size, ignored

        let abs_offset = u64::from(input.read_u32_be()?);
        let file_table_offset = u64::from(input.read_u16_be()?);
        input.read_u16_be()?; // file table size, ignored

        let file_size = input.stream_size()?;

        let file_table = Self::read_file_table(&mut input, abs_offset + file_table_offset)?;
        let types = Self::read_type_table(&mut input, abs_offset, &file_table, file_size)?;

        Ok(Self {
            input: RefCell::new(input),
            file_size,
            types,
        })
    }

    fn read_file_table(input: &mut T, offset: u64) -> Result<Vec<FileTableEntry>> {
        input.seek(SeekFrom::Start(offset))?;
        let file_count = input.read_u32_be()?;

        let mut file_table = Vec::with_capacity(file_count as usize);
        for _ in 0..file_count {
            let offset = input.read_u32_be()?;
            let mut size = u32::from(input.read_u16_be()?);
            size |= u32::from(input.read_u8()?) << 16;
            let flags = input.read_u8()?;
            input.read_u16_be()?; // unknown
            size |= u32::from(flags & 0x07) << 24;
            file_table.push(FileTableEntry { offset, size });
        }
        Ok(file_table)
    }

    fn read_type_table(
        input: &mut T,
        abs_offset: u64,
        file_table: &[FileTableEntry],
        file_size: u64,
    ) -> Result<HashMap<Tag, BTreeMap<u16, Entry>>> {
        input.seek(SeekFrom::Start(abs_offset))?;
        let string_table_offset = u64::from(input.read_u16_be()?);
        let type_count = u64::from(input.read_u16_be()?);

        let mut types = HashMap::with_capacity(type_count as usize);

        for i in 0..type_count {
            let res_tag = input.read_tag()?;
            let res_table_offset = u64::from(input.read_u16_be()?);
            let name_table_offset = u64::from(input.read_u16_be()?);

            let names =
                Self::read_name_table(input, abs_offset, string_table_offset, name_table_offset, file_table.len())?;
            let resources = Self::read_resource_table(
                input,
                abs_offset + res_table_offset,
                file_table,
                file_size,
                res_tag,
                &names,
            )?;

            types.insert(res_tag, resources);

            // The type table's 4-byte prologue (string table offset + type
            // count) means entry `i`'s triple starts 4 bytes past its own
            // index; seek there explicitly rather than trusting our
            // position after following the name/resource tables' offsets.
            input.seek(SeekFrom::Start(abs_offset + (i + 1) * 8 + 4))?;
        }

        Ok(types)
    }

    fn read_name_table(
        input: &mut T,
        abs_offset: u64,
        string_table_offset: u64,
        name_table_offset: u64,
        file_table_len: usize,
    ) -> Result<HashMap<u16, String>> {
        input.seek(SeekFrom::Start(abs_offset + name_table_offset))?;
        let name_count = input.read_u16_be()?;

        let mut names = HashMap::with_capacity(name_count as usize);
        for _ in 0..name_count {
            let name_offset = u64::from(input.read_u16_be()?);
            let index = input.read_u16_be()?;
            if index == 0 || index as usize > file_table_len {
                return Err(Error::BadNameIndex(index, file_table_len));
            }
            let resume_at = input.pos()?;

            input.seek(SeekFrom::Start(abs_offset + string_table_offset + name_offset))?;
            let name = String::from_utf8_lossy(&input.read_c_string()?).into_owned();
            names.insert(index, name);

            input.seek(SeekFrom::Start(resume_at))?;
        }
        Ok(names)
    }

    fn read_resource_table(
        input: &mut T,
        offset: u64,
        file_table: &[FileTableEntry],
        file_size: u64,
        res_tag: Tag,
        names: &HashMap<u16, String>,
    ) -> Result<BTreeMap<u16, Entry>> {
        input.seek(SeekFrom::Start(offset))?;
        let res_count = input.read_u16_be()?;

        let is_movie = res_tag == tag!(b"tMOV");
        let mut resources = BTreeMap::new();

        for _ in 0..res_count {
            let res_id = input.read_u16_be()?;
            let index = input.read_u16_be()?;

            if index == 0 || index as usize > file_table.len() {
                return Err(Error::BadFileIndex(index, file_table.len()));
            }
            let file_entry = file_table[index as usize - 1];

            let size = if is_movie {
                if index as usize == file_table.len() {
                    file_size - u64::from(file_entry.offset)
                } else {
                    u64::from(file_table[index as usize].offset) - u64::from(file_entry.offset)
                }
            } else {
                u64::from(file_entry.size)
            };

            resources.insert(
                res_id,
                Entry {
                    offset: file_entry.offset,
                    size: size as u32,
                    name: names.get(&index).cloned(),
                },
            );
        }

        Ok(resources)
    }

    fn entry(&self, res_tag: Tag, id: u16) -> Result<&Entry> {
        self.types
            .get(&res_tag)
            .and_then(|ids| ids.get(&id))
            .ok_or(Error::NotFound(res_tag, id))
    }

    /// The set of resource tags present in the archive.
    pub fn types(&self) -> impl Iterator<Item = Tag> + '_ {
        self.types.keys().copied()
    }

    /// Whether `(tag, id)` is present in the archive.
    #[must_use]
    pub fn has_resource(&self, res_tag: Tag, id: u16) -> bool {
        self.types.get(&res_tag).is_some_and(|ids| ids.contains_key(&id))
    }

    /// The ids present for `tag`, sorted ascending.
    pub fn ids(&self, res_tag: Tag) -> Vec<u16> {
        self.types.get(&res_tag).map(|ids| ids.keys().copied().collect()).unwrap_or_default()
    }

    /// The name recorded for `(tag, id)`, if any.
    pub fn name(&self, res_tag: Tag, id: u16) -> Result<Option<String>> {
        Ok(self.entry(res_tag, id)?.name.clone())
    }

    /// Reads and returns the full payload of `(tag, id)`.
    pub fn get(&self, res_tag: Tag, id: u16) -> Result<Vec<u8>> {
        let entry = self.entry(res_tag, id)?;
        let (offset, size) = (entry.offset, entry.size);

        let mut input = self.input.borrow_mut();
        input.seek(SeekFrom::Start(u64::from(offset)))?;
        Ok(input.read_bytes(size as usize)?)
    }

    /// The absolute offset of `(tag, id)`'s payload within the archive file,
    /// needed by the QuickTime atom rewriter.
    pub fn offset(&self, res_tag: Tag, id: u16) -> Result<u32> {
        Ok(self.entry(res_tag, id)?.offset)
    }

    /// The total size of the underlying archive file.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, WriteBytesExt};
    use std::io::{Cursor, Write};

    /// Builds the minimal archive from spec scenario 1: a valid header with
    /// an empty file table and no types.
    fn empty_archive_bytes() -> Vec<u8> {
        let mut header = Vec::new();
        header.extend_from_slice(b"MHWK");
        header.write_u32::<BigEndian>(0).unwrap(); // file size, ignored
        header.extend_from_slice(b"RSRC");
        header.write_u16::<BigEndian>(0x0100).unwrap();
        header.write_u16::<BigEndian>(0).unwrap(); // compaction
        header.write_u32::<BigEndian>(0).unwrap(); // rsrc size
        header.write_u32::<BigEndian>(24).unwrap(); // absOffset: right after this 24-byte header
        header.write_u16::<BigEndian>(24).unwrap(); // fileTableOffset (relative to absOffset)
        header.write_u16::<BigEndian>(0).unwrap(); // file table size, ignored
        assert_eq!(header.len(), 24);

        // Type table at absOffset: stringTableOffset, typeCount=0.
        header.write_u16::<BigEndian>(4).unwrap();
        header.write_u16::<BigEndian>(0).unwrap();

        // File table at absOffset + 24: fileCount=0.
        header.write_u32::<BigEndian>(0).unwrap();

        header
    }

    #[test]
    fn header_scenario_empty_archive() {
        let archive = MohawkArchive::new(Cursor::new(empty_archive_bytes())).unwrap();
        assert_eq!(archive.types().count(), 0);
    }

    #[test]
    fn bad_magic_is_format_invalid() {
        let mut bytes = empty_archive_bytes();
        bytes[0] = b'X';
        let err = MohawkArchive::new(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::BadMagic(_)));
    }

    #[test]
    fn unsupported_version_fails() {
        let mut bytes = empty_archive_bytes();
        // Version field is at offset 12 (after MHWK + size + RSRC).
        (&mut bytes[12..14]).write_u16::<BigEndian>(0x0200).unwrap();
        let err = MohawkArchive::new(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(0x0200)));
    }

    /// Builds an archive with one `tBMP` resource and checks lookup, listing
    /// and payload extraction.
    #[test]
    fn single_resource_round_trip() {
        let payload = b"hello mohawk";

        // Lay out: 24-byte header, type table, name table, resource table,
        // file table, payload — each section's size is fixed, so offsets are
        // computed as running totals rather than hand-counted.
        let abs_offset = 24u64;
        let type_table_len = 2 + 2 + 8u64; // stringTableOffset+typeCount + one (tag,resOff,nameOff) triple
        let name_table_off = type_table_len;
        let name_table_len = 2u64; // empty name table (count=0)
        let res_table_off = name_table_off + name_table_len;
        let res_table_len = 2 + 4u64; // count=1, then (resID, index)
        let file_table_off = res_table_off + res_table_len;
        let file_table_len = 4 + 10u64; // fileCount + one 10-byte entry
        let payload_offset = abs_offset + file_table_off + file_table_len;

        let mut data = Vec::new();
        data.extend_from_slice(b"MHWK");
        data.write_u32::<BigEndian>(0).unwrap();
        data.extend_from_slice(b"RSRC");
        data.write_u16::<BigEndian>(0x0100).unwrap();
        data.write_u16::<BigEndian>(0).unwrap();
        data.write_u32::<BigEndian>(0).unwrap();
        data.write_u32::<BigEndian>(abs_offset as u32).unwrap();
        data.write_u16::<BigEndian>(file_table_off as u16).unwrap();
        data.write_u16::<BigEndian>(0).unwrap();
        assert_eq!(data.len() as u64, abs_offset);

        // Type table.
        data.write_u16::<BigEndian>(0).unwrap(); // stringTableOffset (unused, no names)
        data.write_u16::<BigEndian>(1).unwrap(); // typeCount
        data.extend_from_slice(b"tBMP");
        data.write_u16::<BigEndian>(res_table_off as u16).unwrap();
        data.write_u16::<BigEndian>(name_table_off as u16).unwrap();

        // Name table (empty).
        data.write_u16::<BigEndian>(0).unwrap();

        // Resource table: one resource, id=5, index=1 (-> file table[0]).
        data.write_u16::<BigEndian>(1).unwrap();
        data.write_u16::<BigEndian>(5).unwrap();
        data.write_u16::<BigEndian>(1).unwrap();

        // File table: one entry pointing at the payload appended below.
        data.write_u32::<BigEndian>(1).unwrap(); // fileCount
        data.write_u32::<BigEndian>(payload_offset as u32).unwrap();
        data.write_u16::<BigEndian>(payload.len() as u16).unwrap();
        data.write_u8(0).unwrap(); // size mid byte
        data.write_u8(0).unwrap(); // flags
        data.write_u16::<BigEndian>(0).unwrap(); // unknown

        assert_eq!(data.len() as u64, payload_offset);
        data.extend_from_slice(payload);

        let archive = MohawkArchive::new(Cursor::new(data)).unwrap();
        assert!(archive.has_resource(tag!(b"tBMP"), 5));
        assert_eq!(archive.ids(tag!(b"tBMP")), vec![5]);
        assert_eq!(archive.get(tag!(b"tBMP"), 5).unwrap(), payload);
        assert!(!archive.has_resource(tag!(b"tBMP"), 6));
    }

    #[test]
    fn missing_resource_is_lookup_miss() {
        let archive = MohawkArchive::new(Cursor::new(empty_archive_bytes())).unwrap();
        let err = archive.get(tag!(b"tBMP"), 1).unwrap_err();
        assert!(matches!(err, Error::NotFound(_, 1)));
    }
}
