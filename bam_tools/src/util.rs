// Block framing follows https://github.com/zaeleus/noodles/blob/master/noodles-bgzf/src/reader.rs

use super::gz::{
    CompressionMethod, OperatingSystem, BGZF_HEADER_SIZE, BGZF_SI, BGZF_XLEN, FLG_FEXTRA,
    MAGIC_NUMBER, MAX_BLOCK_SIZE, MTIME_NONE, TRAILER_SIZE,
};
use super::Block;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

pub(crate) fn inflate_data<R>(reader: R, writer: &mut Vec<u8>) -> io::Result<usize>
where
    R: Read,
{
    let mut decoder = DeflateDecoder::new(reader);
    decoder.read_to_end(writer)
}

pub(crate) fn deflate_data(data: &[u8], compression: Compression) -> io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), compression);
    encoder.write_all(data)?;
    encoder.finish()
}

/// Reads the next block into `block`, inflating and checking it. Returns the
/// size of the block on disk, or 0 at the end of the stream.
pub(crate) fn fetch_block(
    reader: &mut dyn Read,
    cdata: &mut Vec<u8>,
    block: &mut Block,
) -> io::Result<usize> {
    let block_size = match read_block_size(reader)? {
        0 => return Ok(0),
        bs => bs,
    };

    if block_size < BGZF_HEADER_SIZE + TRAILER_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "expected clen >= {}, got {}",
                BGZF_HEADER_SIZE + TRAILER_SIZE,
                block_size
            ),
        ));
    }

    let cdata_len = block_size - BGZF_HEADER_SIZE - TRAILER_SIZE;
    cdata.resize(cdata_len, Default::default());
    reader.read_exact(cdata)?;

    let (crc32, isize) = read_trailer(reader)?;

    block.set_len(block_size as u64);

    let udata = block.data_mut();
    let udata_buf = udata.get_mut();
    udata_buf.clear();
    inflate_data(&cdata[..], udata_buf)?;
    udata.set_position(0);

    let udata_buf = udata.get_ref();
    if udata_buf.len() != isize as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "block size mismatch: expected {}, got {}",
                isize,
                udata_buf.len()
            ),
        ));
    }
    if crc32fast::hash(udata_buf) != crc32 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "block checksum mismatch",
        ));
    }

    Ok(block_size)
}

/// Compresses `data` into a single BGZF block and writes it out. Returns the
/// size of the written block.
pub(crate) fn write_block<W>(
    writer: &mut W,
    data: &[u8],
    compression: Compression,
) -> io::Result<usize>
where
    W: Write,
{
    let cdata = deflate_data(data, compression)?;
    let block_size = BGZF_HEADER_SIZE + cdata.len() + TRAILER_SIZE;

    if block_size > MAX_BLOCK_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("block too large: {block_size} bytes"),
        ));
    }

    writer.write_all(&MAGIC_NUMBER)?;
    writer.write_u8(CompressionMethod::Deflate as u8)?;
    writer.write_u8(FLG_FEXTRA)?;
    writer.write_u32::<LittleEndian>(MTIME_NONE)?;
    // XFL
    writer.write_u8(0)?;
    writer.write_u8(OperatingSystem::Unknown as u8)?;
    writer.write_u16::<LittleEndian>(BGZF_XLEN as u16)?;
    writer.write_all(&BGZF_SI)?;
    // SLEN
    writer.write_u16::<LittleEndian>(2)?;
    writer.write_u16::<LittleEndian>((block_size - 1) as u16)?;

    writer.write_all(&cdata)?;

    writer.write_u32::<LittleEndian>(crc32fast::hash(data))?;
    writer.write_u32::<LittleEndian>(data.len() as u32)?;

    Ok(block_size)
}

// Returns 0 on a clean end of stream.
fn read_block_size(reader: &mut dyn Read) -> io::Result<usize> {
    let mut header = [0; BGZF_HEADER_SIZE];

    match read_fully(reader, &mut header)? {
        0 => return Ok(0),
        n if n < BGZF_HEADER_SIZE => {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "truncated BGZF block header",
            ))
        }
        _ => {}
    }

    if header[..2] != MAGIC_NUMBER || header[3] & FLG_FEXTRA == 0 || header[12..14] != BGZF_SI {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid BGZF header",
        ));
    }

    let bsize = &header[16..18];

    // Add 1 because BSIZE is "total Block SIZE minus 1".
    Ok(usize::from(LittleEndian::read_u16(bsize)) + 1)
}

fn read_trailer(reader: &mut dyn Read) -> io::Result<(u32, u32)> {
    let mut trailer = [0; TRAILER_SIZE];
    reader.read_exact(&mut trailer)?;
    Ok((
        LittleEndian::read_u32(&trailer[..4]),
        LittleEndian::read_u32(&trailer[4..]),
    ))
}

// Like `read_exact`, but reports how many bytes were read before the end of
// the stream instead of failing.
fn read_fully(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
