use crate::gz::{BGZF_EOF, MAX_UNCOMPRESSED_DATA_SIZE};
use crate::util::write_block;
use crate::VirtualPosition;
use flate2::Compression;
use std::io::{self, Write};

/// BGZF writer. Buffers up to one block of uncompressed data and emits it as
/// a single deflated block, either when the buffer fills up or when
/// [`Writer::flush_block`] is called.
pub struct Writer<W: Write> {
    inner: W,
    buf: Vec<u8>,
    // Offset of the next block in the compressed stream.
    position: u64,
    compression: Compression,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self::with_compression(inner, Compression::default())
    }

    pub fn with_compression(inner: W, compression: Compression) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(MAX_UNCOMPRESSED_DATA_SIZE),
            position: 0,
            compression,
        }
    }

    /// Position the next written byte will have in the stream.
    pub fn virtual_position(&self) -> VirtualPosition {
        VirtualPosition::new(self.position, self.buf.len() as u16).unwrap_or_default()
    }

    /// Compresses buffered data into a block. Data written afterwards starts
    /// a new block.
    pub fn flush_block(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let block_size = write_block(&mut self.inner, &self.buf, self.compression)?;
        self.position += block_size as u64;
        self.buf.clear();
        Ok(())
    }

    /// Flushes remaining data, appends the EOF marker and returns the inner
    /// writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush_block()?;
        self.inner.write_all(&BGZF_EOF)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = std::cmp::min(MAX_UNCOMPRESSED_DATA_SIZE - self.buf.len(), buf.len());
        self.buf.extend_from_slice(&buf[..n]);
        // A full buffer is written out right away so the virtual position
        // never points past the end of a block.
        if self.buf.len() >= MAX_UNCOMPRESSED_DATA_SIZE {
            self.flush_block()?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_block()?;
        self.inner.flush()
    }
}
