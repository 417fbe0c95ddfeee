use super::borders::{locate_borders, Border};
use super::extract::{data_end, extract_chunk, header_end};
use super::partition::{choose_offsets, ChunkPlan};
use crate::error::{Error, IndexError, Result};
use crate::manifest::{ChunkInfo, SplitSummary};
use crate::pbi::PbiIndex;
use log::info;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Where and how chunks are written.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub out_dir: PathBuf,
    /// Chunk file name prefix. Defaults to the source file name without its
    /// extension.
    pub prefix: Option<String>,
    /// Number of chunks extracted concurrently.
    pub threads: usize,
    /// Write a `.pbi` next to every chunk.
    pub write_index: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            prefix: None,
            threads: 1,
            write_index: false,
        }
    }
}

/// `<bam>.pbi`
pub fn pbi_path<P: AsRef<Path>>(bam: P) -> PathBuf {
    let mut name = bam.as_ref().as_os_str().to_owned();
    name.push(".pbi");
    PathBuf::from(name)
}

/// `<out_dir>/<prefix>.chunk<i>.bam`
pub fn chunk_path<P: AsRef<Path>>(out_dir: P, prefix: &str, i: usize) -> PathBuf {
    out_dir.as_ref().join(format!("{prefix}.chunk{i}.bam"))
}

fn default_prefix(src: &Path) -> String {
    src.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reads".to_string())
}

/// Borders of the BAM file at `src`, read from its `.pbi`.
pub fn get_zmw_bgzf_borders<P: AsRef<Path>>(src: P) -> Result<Vec<Border>> {
    let index = PbiIndex::from_path(pbi_path(src))?;
    locate_borders(index.positions())
}

/// Start offsets of the chunks `src` would be split into.
pub fn get_bam_offsets<P: AsRef<Path>>(src: P, requested: usize) -> Result<Vec<u64>> {
    if requested < 1 {
        return Err(Error::InvalidChunkCount(requested));
    }
    let index = PbiIndex::from_path(pbi_path(src))?;
    let borders = locate_borders(index.positions())?;
    choose_offsets(&borders, index.len(), requested)
}

/// Splits `src` into at most `requested` chunks with default options and
/// returns how many were written.
pub fn split<P: AsRef<Path>>(src: P, requested: usize) -> Result<usize> {
    split_bam(src, requested, &SplitOptions::default()).map(|summary| summary.n_chunks())
}

/// Splits `src` into at most `requested` record-aligned chunks.
///
/// Fewer chunks are produced when the index offers fewer legal split
/// points. Chunks are numbered by their position in the file, whatever
/// order the workers finish in.
pub fn split_bam<P: AsRef<Path>>(
    src: P,
    requested: usize,
    opts: &SplitOptions,
) -> Result<SplitSummary> {
    let src = src.as_ref();
    if requested < 1 {
        return Err(Error::InvalidChunkCount(requested));
    }

    let index = PbiIndex::from_path(pbi_path(src))?;
    let borders = locate_borders(index.positions())?;
    let starts = choose_offsets(&borders, index.len(), requested)?;

    let header_end = header_end(src)?;
    if header_end != starts[0] {
        return Err(IndexError::HeaderMismatch {
            header_end,
            first_record: starts[0],
        }
        .into());
    }
    let plan = ChunkPlan::new(starts, data_end(src)?)?;
    info!(
        "Splitting {} ({} records) into {} chunks",
        src.display(),
        index.len(),
        plan.n_chunks()
    );

    let prefix = opts
        .prefix
        .clone()
        .unwrap_or_else(|| default_prefix(src));
    let jobs: Vec<_> = plan.ranges().enumerate().collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.threads.max(1))
        .build()?;
    let chunks = pool.install(|| {
        jobs.into_par_iter()
            .map(|(i, range)| -> Result<ChunkInfo> {
                let path = chunk_path(&opts.out_dir, &prefix, i);
                extract_chunk(src, header_end, range.start, range.end, &path)?;

                let records = index.first_record_at(range.start)..index.first_record_at(range.end);
                let n_records = records.len();
                if opts.write_index {
                    index
                        .rebased(records, range.start, header_end)
                        .to_path(pbi_path(&path))?;
                }
                Ok(ChunkInfo {
                    path,
                    start: range.start,
                    end: range.end,
                    n_records,
                })
            })
            .collect::<Result<Vec<ChunkInfo>>>()
    })?;

    for chunk in &chunks {
        info!("{}: {} records", chunk.path.display(), chunk.n_records);
    }

    Ok(SplitSummary {
        source: src.to_path_buf(),
        requested_chunks: requested,
        chunks,
    })
}
