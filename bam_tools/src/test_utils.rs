//! Synthetic unaligned PacBio BAM files and their indices.

use crate::error::Result;
use crate::pbi::{PbiIndex, PbiRecord};
use crate::{Writer, MAGIC_NUMBER};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const HEADER_TEXT: &str = "@HD\tVN:1.5\tSO:unknown\tpb:3.0.1\n\
@RG\tID:b89a4406\tPL:PACBIO\tDS:READTYPE=SUBREAD\tPU:m54006_160504_020705\n";
const RG_ID: i32 = -1_180_613_626;
const SEQ_LEN: usize = 120;

pub(crate) fn encode_header(text: &str, refs: &[(&str, u32)]) -> Vec<u8> {
    let mut buf = MAGIC_NUMBER.to_vec();
    buf.write_u32::<LittleEndian>(text.len() as u32).unwrap();
    buf.extend_from_slice(text.as_bytes());
    buf.write_u32::<LittleEndian>(refs.len() as u32).unwrap();
    for (name, len) in refs {
        buf.write_u32::<LittleEndian>(name.len() as u32 + 1).unwrap();
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        buf.write_u32::<LittleEndian>(*len).unwrap();
    }
    buf
}

/// Unmapped record with a fixed sequence, prefixed with its block_size.
pub(crate) fn encode_record(name: &str) -> Vec<u8> {
    let mut rec = Vec::new();
    rec.write_i32::<LittleEndian>(-1).unwrap(); // refID
    rec.write_i32::<LittleEndian>(-1).unwrap(); // pos
    rec.write_u8(name.len() as u8 + 1).unwrap();
    rec.write_u8(255).unwrap(); // mapq
    rec.write_u16::<LittleEndian>(4680).unwrap(); // bin
    rec.write_u16::<LittleEndian>(0).unwrap(); // n_cigar_op
    rec.write_u16::<LittleEndian>(4).unwrap(); // flag: unmapped
    rec.write_u32::<LittleEndian>(SEQ_LEN as u32).unwrap();
    rec.write_i32::<LittleEndian>(-1).unwrap(); // next_refID
    rec.write_i32::<LittleEndian>(-1).unwrap(); // next_pos
    rec.write_i32::<LittleEndian>(0).unwrap(); // tlen
    rec.extend_from_slice(name.as_bytes());
    rec.push(0);
    // ACGT packed two bases per byte.
    rec.extend((0..SEQ_LEN / 2).map(|i| if i % 2 == 0 { 0x12 } else { 0x48 }));
    rec.extend((0..SEQ_LEN).map(|i| (i % 40) as u8));

    let mut buf = Vec::with_capacity(rec.len() + 4);
    buf.write_u32::<LittleEndian>(rec.len() as u32).unwrap();
    buf.extend_from_slice(&rec);
    buf
}

/// Subreads of one ZMW. An aligned group starts a new BGZF block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Group {
    pub hole_number: i32,
    pub n_records: usize,
    pub aligned: bool,
}

impl Group {
    pub fn aligned(hole_number: i32, n_records: usize) -> Self {
        Self {
            hole_number,
            n_records,
            aligned: true,
        }
    }

    pub fn unaligned(hole_number: i32, n_records: usize) -> Self {
        Self {
            hole_number,
            n_records,
            aligned: false,
        }
    }
}

pub(crate) struct Fixture {
    pub bam: PathBuf,
    pub index: PbiIndex,
    pub names: Vec<String>,
}

/// Writes `<dir>/<file_name>` and its `.pbi`.
pub(crate) fn write_fixture(dir: &Path, file_name: &str, groups: &[Group]) -> Result<Fixture> {
    let bam = dir.join(file_name);
    let mut writer = Writer::new(BufWriter::new(File::create(&bam)?));
    writer.write_all(&encode_header(HEADER_TEXT, &[]))?;
    writer.flush_block()?;

    let mut records = Vec::new();
    let mut names = Vec::new();
    for group in groups {
        if group.aligned {
            writer.flush_block()?;
        }
        for j in 0..group.n_records {
            let q_start = (j * 1000) as i32;
            let q_end = q_start + 900;
            let name = format!("m54006_160504_020705/{}/{}_{}", group.hole_number, q_start, q_end);
            records.push(PbiRecord {
                rg_id: RG_ID,
                q_start,
                q_end,
                hole_number: group.hole_number,
                read_qual: 0.8,
                ctxt_flag: 0,
                file_offset: writer.virtual_position(),
            });
            writer.write_all(&encode_record(&name))?;
            names.push(name);
        }
    }
    writer.finish()?.flush()?;

    let index = PbiIndex::new(records);
    let mut pbi = bam.as_os_str().to_owned();
    pbi.push(".pbi");
    index.to_path(PathBuf::from(pbi))?;

    Ok(Fixture { bam, index, names })
}

/// 20 ZMWs with 4 subreads each; only the ZMWs starting at records 0, 16 and
/// 48 begin a block.
pub(crate) fn three_border_groups() -> Vec<Group> {
    (0..20)
        .map(|i| {
            let hole_number = match i {
                0 => 1650,
                4 => 7247,
                12 => 30983,
                _ => 1650 + i * 1000 + 1,
            };
            if i == 0 || i == 4 || i == 12 {
                Group::aligned(hole_number, 4)
            } else {
                Group::unaligned(hole_number, 4)
            }
        })
        .collect()
}
