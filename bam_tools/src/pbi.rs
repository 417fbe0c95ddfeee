//! PacBio BAM index (`.pbi`).
//!
//! The index is a BGZF stream holding a 32 byte header followed by
//! column-oriented sections. Only the BasicData section, which every index
//! carries, is read:
//!
//! | column        | type      |
//! |---------------|-----------|
//! | `rgId`        | `i32[n]`  |
//! | `qStart`      | `i32[n]`  |
//! | `qEnd`        | `i32[n]`  |
//! | `holeNumber`  | `i32[n]`  |
//! | `readQual`    | `f32[n]`  |
//! | `ctxtFlag`    | `u8[n]`   |
//! | `fileOffset`  | `i64[n]`  |
//!
//! `fileOffset` is the virtual position of the record in the BAM file.
//! Mapped, coordinate and barcode sections that may follow are skipped.

use crate::error::{IndexError, Result};
use crate::{Reader, VirtualPosition, Writer};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::ops::Range;
use std::path::Path;

pub const PBI_MAGIC: [u8; 4] = *b"PBI\x01";
/// Version written by [`PbiIndex::write`] (3.0.1).
pub const PBI_VERSION: u32 = 0x0003_0001;
const MIN_SUPPORTED_VERSION: u32 = 0x0003_0000;
pub const PBI_HEADER_SIZE: usize = 32;
const RESERVED_SIZE: usize = 18;

/// Section flags of the header.
pub mod flags {
    pub const BASIC: u16 = 0x0000;
    pub const MAPPED: u16 = 0x0001;
    pub const COORDINATE_SORTED: u16 = 0x0002;
    pub const BARCODE: u16 = 0x0004;
}

/// One row of the BasicData section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PbiRecord {
    pub rg_id: i32,
    pub q_start: i32,
    pub q_end: i32,
    /// ZMW hole number. Records of a ZMW are contiguous.
    pub hole_number: i32,
    pub read_qual: f32,
    pub ctxt_flag: u8,
    pub file_offset: VirtualPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PbiIndex {
    version: u32,
    flags: u16,
    records: Vec<PbiRecord>,
}

impl PbiIndex {
    pub fn new(records: Vec<PbiRecord>) -> Self {
        Self {
            version: PBI_VERSION,
            flags: flags::BASIC,
            records,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!("Reading index {}", path.as_ref().display());
        Self::read(BufReader::new(file))
    }

    /// Reads an index from its compressed representation.
    pub fn read<R: Read>(inner: R) -> Result<Self> {
        let mut reader = Reader::new(inner);

        let mut magic = [0; 4];
        reader.read_exact(&mut magic)?;
        if magic != PBI_MAGIC {
            return Err(IndexError::InvalidMagic(magic).into());
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version < MIN_SUPPORTED_VERSION {
            return Err(IndexError::UnsupportedVersion(version).into());
        }
        let flags = reader.read_u16::<LittleEndian>()?;
        let n_reads = reader.read_u32::<LittleEndian>()? as usize;
        let mut reserved = [0; RESERVED_SIZE];
        reader.read_exact(&mut reserved)?;

        let rg_id = read_column(&mut reader, "rgId", n_reads, 4)?;
        let q_start = read_column(&mut reader, "qStart", n_reads, 4)?;
        let q_end = read_column(&mut reader, "qEnd", n_reads, 4)?;
        let hole_number = read_column(&mut reader, "holeNumber", n_reads, 4)?;
        let read_qual = read_column(&mut reader, "readQual", n_reads, 4)?;
        let ctxt_flag = read_column(&mut reader, "ctxtFlag", n_reads, 1)?;
        let file_offset = read_column(&mut reader, "fileOffset", n_reads, 8)?;

        if flags != flags::BASIC {
            debug!("Skipping index sections beyond BasicData (flags {:#06x})", flags);
        }

        let records = (0..n_reads)
            .map(|i| PbiRecord {
                rg_id: LittleEndian::read_i32(&rg_id[4 * i..]),
                q_start: LittleEndian::read_i32(&q_start[4 * i..]),
                q_end: LittleEndian::read_i32(&q_end[4 * i..]),
                hole_number: LittleEndian::read_i32(&hole_number[4 * i..]),
                read_qual: LittleEndian::read_f32(&read_qual[4 * i..]),
                ctxt_flag: ctxt_flag[i],
                file_offset: VirtualPosition::from(
                    LittleEndian::read_i64(&file_offset[8 * i..]) as u64,
                ),
            })
            .collect();

        Ok(Self {
            version,
            flags,
            records,
        })
    }

    /// Writes the header and the BasicData section as a BGZF stream.
    pub fn write<W: Write>(&self, inner: W) -> Result<W> {
        let mut writer = Writer::new(inner);

        writer.write_all(&PBI_MAGIC)?;
        writer.write_u32::<LittleEndian>(PBI_VERSION)?;
        writer.write_u16::<LittleEndian>(flags::BASIC)?;
        writer.write_u32::<LittleEndian>(self.records.len() as u32)?;
        writer.write_all(&[0; RESERVED_SIZE])?;

        for rec in &self.records {
            writer.write_i32::<LittleEndian>(rec.rg_id)?;
        }
        for rec in &self.records {
            writer.write_i32::<LittleEndian>(rec.q_start)?;
        }
        for rec in &self.records {
            writer.write_i32::<LittleEndian>(rec.q_end)?;
        }
        for rec in &self.records {
            writer.write_i32::<LittleEndian>(rec.hole_number)?;
        }
        for rec in &self.records {
            writer.write_f32::<LittleEndian>(rec.read_qual)?;
        }
        for rec in &self.records {
            writer.write_u8(rec.ctxt_flag)?;
        }
        for rec in &self.records {
            writer.write_i64::<LittleEndian>(u64::from(rec.file_offset) as i64)?;
        }

        Ok(writer.finish()?)
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut out = self.write(BufWriter::new(file))?;
        out.flush()?;
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PbiRecord] {
        &self.records
    }

    /// `(hole number, virtual position)` of every record, in file order.
    pub fn positions(&self) -> impl Iterator<Item = (i32, VirtualPosition)> + '_ {
        self.records
            .iter()
            .map(|rec| (rec.hole_number, rec.file_offset))
    }

    /// Index of the first record whose block starts at or after `offset`.
    pub fn first_record_at(&self, offset: u64) -> usize {
        self.records
            .partition_point(|rec| rec.file_offset.compressed() < offset)
    }

    /// Index for a chunk holding `records`, whose data was copied from
    /// `start` onwards and placed right after a header ending at
    /// `header_end`.
    pub fn rebased(&self, records: Range<usize>, start: u64, header_end: u64) -> Self {
        let records = self.records[records]
            .iter()
            .map(|rec| {
                let compressed = rec.file_offset.compressed() - start + header_end;
                let packed = (compressed << 16) | u64::from(rec.file_offset.uncompressed());
                PbiRecord {
                    file_offset: VirtualPosition::from(packed),
                    ..*rec
                }
            })
            .collect();
        Self::new(records)
    }
}

// Raw bytes of one column. The buffer grows with the data actually present,
// so a corrupt record count cannot force a huge allocation.
fn read_column<R: Read>(
    reader: &mut R,
    column: &'static str,
    n_reads: usize,
    width: usize,
) -> Result<Vec<u8>> {
    let expected = n_reads as u64 * width as u64;
    let mut bytes = Vec::new();
    reader.by_ref().take(expected).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < expected {
        return Err(IndexError::Truncated {
            column,
            n_reads,
            found: bytes.len() / width,
        }
        .into());
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Cursor;

    fn record(hole_number: i32, compressed: u64, uncompressed: u16) -> PbiRecord {
        PbiRecord {
            rg_id: -1_310_598_926,
            q_start: 0,
            q_end: 1200,
            hole_number,
            read_qual: 0.8,
            ctxt_flag: 3,
            file_offset: VirtualPosition::new(compressed, uncompressed).unwrap(),
        }
    }

    #[test]
    fn test_write_then_read() {
        let index = PbiIndex::new(vec![
            record(1650, 396, 0),
            record(1650, 396, 1410),
            record(7247, 26575, 0),
        ]);
        let data = index.write(Vec::new()).unwrap();
        let parsed = PbiIndex::read(Cursor::new(data)).unwrap();
        assert_eq!(parsed, index);
        assert_eq!(parsed.version(), PBI_VERSION);
        assert_eq!(parsed.flags(), flags::BASIC);
        assert_eq!(
            parsed.positions().map(|(zmw, _)| zmw).collect::<Vec<_>>(),
            vec![1650, 1650, 7247]
        );
    }

    #[test]
    fn test_invalid_magic() {
        let mut writer = Writer::new(Vec::new());
        writer.write_all(b"BAI\x01").unwrap();
        writer.write_all(&[0; 28]).unwrap();
        let data = writer.finish().unwrap();
        match PbiIndex::read(Cursor::new(data)) {
            Err(Error::Index(IndexError::InvalidMagic(magic))) => assert_eq!(&magic, b"BAI\x01"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_truncated_index() {
        let index = PbiIndex::new(vec![record(1650, 396, 0), record(7247, 26575, 0)]);
        let mut writer = Writer::new(Vec::new());
        // Header claims two records but the columns are missing.
        let full = index.write(Vec::new()).unwrap();
        let mut inflated = Vec::new();
        Reader::new(Cursor::new(full)).read_to_end(&mut inflated).unwrap();
        writer.write_all(&inflated[..PBI_HEADER_SIZE + 6]).unwrap();
        let data = writer.finish().unwrap();
        match PbiIndex::read(Cursor::new(data)) {
            Err(Error::Index(IndexError::Truncated {
                column,
                n_reads,
                found,
            })) => {
                assert_eq!(column, "rgId");
                assert_eq!(n_reads, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_huge_record_count() {
        let mut writer = Writer::new(Vec::new());
        writer.write_all(&PBI_MAGIC).unwrap();
        writer.write_u32::<LittleEndian>(PBI_VERSION).unwrap();
        writer.write_u16::<LittleEndian>(flags::BASIC).unwrap();
        writer.write_u32::<LittleEndian>(u32::MAX).unwrap();
        writer.write_all(&[0; RESERVED_SIZE]).unwrap();
        writer.write_all(&[0; 6]).unwrap();
        let data = writer.finish().unwrap();

        let err = PbiIndex::read(Cursor::new(data)).unwrap_err();
        assert!(err.is_malformed_index());
        assert!(matches!(err, Error::Index(IndexError::Truncated { found: 1, .. })));
    }

    #[test]
    fn test_rebased() {
        let index = PbiIndex::new(vec![
            record(1650, 396, 0),
            record(7247, 26575, 0),
            record(7247, 26575, 870),
            record(30983, 77209, 0),
        ]);
        assert_eq!(index.first_record_at(396), 0);
        assert_eq!(index.first_record_at(26575), 1);
        assert_eq!(index.first_record_at(77209), 3);
        assert_eq!(index.first_record_at(90000), 4);

        let chunk = index.rebased(1..3, 26575, 396);
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.records()[0].file_offset, VirtualPosition::new(396, 0).unwrap());
        assert_eq!(chunk.records()[1].file_offset, VirtualPosition::new(396, 870).unwrap());
        assert_eq!(chunk.records()[1].hole_number, 7247);
    }
}
