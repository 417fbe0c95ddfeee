use crate::error::{Error, Result};
use crate::gz::{ends_with_eof, BGZF_EOF};
use crate::Reader;
use log::{debug, warn};
use memmap2::Mmap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Offset of the first block after the BAM header. Fails if the header does
/// not end exactly on a block boundary.
pub fn header_end<P: AsRef<Path>>(src: P) -> Result<u64> {
    let file = File::open(src)?;
    let mut reader = Reader::new(BufReader::new(file));
    reader.read_header()?;
    let pos = reader.virtual_position();
    if !pos.is_block_start() {
        return Err(Error::HeaderNotBlockAligned(pos));
    }
    Ok(pos.compressed())
}

/// Offset where compressed data ends: right before the trailing EOF marker,
/// or the file length if the marker is missing.
pub fn data_end<P: AsRef<Path>>(src: P) -> Result<u64> {
    let mut file = File::open(src.as_ref())?;
    let len = file.metadata()?.len();
    let marker_len = BGZF_EOF.len() as u64;
    if len < marker_len {
        return Ok(len);
    }
    let mut tail = [0; BGZF_EOF.len()];
    file.seek(SeekFrom::Start(len - marker_len))?;
    file.read_exact(&mut tail)?;
    if ends_with_eof(&tail) {
        Ok(len - marker_len)
    } else {
        warn!("{} has no BGZF EOF marker", src.as_ref().display());
        Ok(len)
    }
}

/// Writes a standalone BAM file made of the source header (`0..header_end`),
/// the compressed bytes `start..end` copied as they are, and an EOF marker.
///
/// The output is assembled next to `dst` and renamed into place once
/// complete, so an interrupted run never leaves a truncated chunk under the
/// final name. An existing `dst` is replaced.
pub fn extract_chunk<P, Q>(src: P, header_end: u64, start: u64, end: u64, dst: Q) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    if header_end > start || start > end {
        return Err(Error::InvalidRange {
            header_end,
            start,
            end,
        });
    }

    let file = File::open(src.as_ref())?;
    let found = file.metadata()?.len();
    if found < end {
        return Err(Error::Truncated {
            expected: end,
            found,
        });
    }
    // Safety: the source is only read, and its length was checked above.
    let mmap = unsafe { Mmap::map(&file)? };

    let dst = dst.as_ref();
    let partial = partial_path(dst);
    let res = write_chunk(
        &partial,
        &mmap[..header_end as usize],
        &mmap[start as usize..end as usize],
    )
    .and_then(|_| fs::rename(&partial, dst));
    if let Err(e) = res {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }

    debug!(
        "Wrote {} ({} data bytes from {}..{})",
        dst.display(),
        end - start,
        start,
        end
    );
    Ok(())
}

fn write_chunk(path: &Path, header: &[u8], data: &[u8]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(header)?;
    out.write_all(data)?;
    out.write_all(&BGZF_EOF)?;
    out.flush()
}

fn partial_path(dst: &Path) -> PathBuf {
    let mut name = dst.as_os_str().to_owned();
    name.push(OsString::from(".partial"));
    PathBuf::from(name)
}
