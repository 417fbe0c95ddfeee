mod records;

use crate::block::Block;
use crate::util::fetch_block;
use crate::{VirtualPosition, MAGIC_NUMBER};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

pub use records::Records;

/// Sequential BGZF reader. Inflates one block at a time and keeps track of
/// the virtual position of the next unread byte, which is what index files
/// refer to.
pub struct Reader<R> {
    inner: R,
    cdata: Vec<u8>,
    block: Block,
    // Offset of the next block in the compressed stream.
    position: u64,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cdata: Vec::new(),
            block: Block::default(),
            position: 0,
        }
    }

    pub fn virtual_position(&self) -> VirtualPosition {
        self.block.virtual_position()
    }

    pub fn read_record(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        buf.clear();
        self.append_record(buf)
    }

    // Resizes the buffer so an additional record can fit in the end and fills this empty section.
    pub fn append_record(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let block_size = match self.read_u32::<LittleEndian>() {
            Ok(bs) => bs as usize,
            Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(0),
            Err(e) => return Err(e),
        };

        let prev_len = buf.len();
        buf.resize(prev_len + block_size, 0);
        self.read_exact(&mut buf[prev_len..prev_len + block_size])?;

        Ok(block_size)
    }

    pub fn records(&mut self) -> Records<'_, R> {
        Records::new(self)
    }

    /// Reads the BAM header and returns it without the magic number.
    pub fn read_header(&mut self) -> io::Result<Vec<u8>> {
        let magic = read_magic(self)?;

        if magic != MAGIC_NUMBER {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid BAM header",
            ));
        }

        read_header(self)
    }

    // Returns false once the stream is exhausted.
    fn next_block(&mut self) -> io::Result<bool> {
        let position = self.position;
        let block_size = fetch_block(&mut self.inner, &mut self.cdata, &mut self.block)?;
        if block_size == 0 {
            return Ok(false);
        }
        self.block.set_position(position);
        self.position += block_size as u64;
        Ok(true)
    }
}

impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = self.block.data_mut().read(buf)?;
            if n > 0 || buf.is_empty() {
                return Ok(n);
            }
            // Block exhausted, get new. Empty blocks (such as the EOF marker)
            // are skipped.
            if !self.next_block()? {
                return Ok(0);
            }
        }
    }
}

fn read_magic<R>(reader: &mut R) -> io::Result<[u8; 4]>
where
    R: Read,
{
    let mut magic = [0; 4];
    reader.read_exact(&mut magic)?;
    Ok(magic)
}

/// Parses header fully into byte buffer.
fn read_header<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: Read,
{
    let mut bytes = Vec::new();

    let l_text = reader.read_u32::<LittleEndian>()?;
    bytes.write_u32::<LittleEndian>(l_text)?;
    bytes.resize(std::mem::size_of::<u32>() + l_text as usize, 0);
    reader.read_exact(&mut bytes[std::mem::size_of::<u32>()..])?;

    let n_ref = reader.read_u32::<LittleEndian>()?;
    bytes.write_u32::<LittleEndian>(n_ref)?;

    for _ in 0..n_ref {
        let l_name = reader.read_u32::<LittleEndian>()?;
        bytes.write_u32::<LittleEndian>(l_name)?;

        let cur_len = bytes.len();
        bytes.resize(cur_len + l_name as usize, 0);
        reader.read_exact(&mut bytes[cur_len..])?;

        let l_ref = reader.read_u32::<LittleEndian>()?;
        bytes.write_u32::<LittleEndian>(l_ref)?;
    }

    Ok(bytes)
}
