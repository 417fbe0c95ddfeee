//! JSON summary of a split, for pipeline steps that pick up the chunks.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One produced chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub path: PathBuf,
    /// Byte range of the source copied into the chunk.
    pub start: u64,
    pub end: u64,
    pub n_records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub source: PathBuf,
    pub requested_chunks: usize,
    pub chunks: Vec<ChunkInfo>,
}

impl SplitSummary {
    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn n_records(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.n_records).sum()
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_json(&mut out)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}
