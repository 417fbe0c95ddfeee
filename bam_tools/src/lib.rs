//! Record-aligned splitting of BGZF-compressed PacBio BAM files.
//!
//! A BAM file is cut into chunks by copying ranges of its compressed blocks,
//! never inflating or re-encoding the records. Legal cut points are read
//! from the PacBio index (`.pbi`): a chunk may only start with the first
//! subread of a ZMW, and only if that subread begins a BGZF block.
//!
//! ```no_run
//! use bam_tools::{split_bam, SplitOptions};
//!
//! let summary = split_bam("movie.subreads.bam", 4, &SplitOptions::default()).unwrap();
//! for chunk in &summary.chunks {
//!     println!("{} {}", chunk.path.display(), chunk.n_records);
//! }
//! ```

mod block;
mod error;
pub mod gz;
pub mod manifest;
pub mod pbi;
mod util;
mod virtual_position;
pub mod writer;

// Module responsible for chunking.
pub mod chunking {
    /// Legal split points.
    pub mod borders;
    /// Standalone chunk files.
    pub mod extract;
    /// Choice of split points.
    pub mod partition;
    /// Composition of the above over file paths.
    pub mod split;
}
mod reader;
pub mod record;

#[cfg(test)]
pub(crate) mod test_utils;

use block::Block;
pub use chunking::borders::{locate_borders, Border};
pub use chunking::extract::extract_chunk;
pub use chunking::partition::{choose_offsets, ChunkPlan};
pub use chunking::split::{
    get_bam_offsets, get_zmw_bgzf_borders, split, split_bam, SplitOptions,
};
pub use error::{Error, IndexError, Result};
pub use reader::{Reader, Records};
pub use virtual_position::VirtualPosition;
pub use writer::Writer;

use std::mem;

const U32_SIZE: usize = mem::size_of::<u32>();
const U16_SIZE: usize = mem::size_of::<u16>();
const U8_SIZE: usize = mem::size_of::<u8>();
const MAGIC_NUMBER: &[u8] = b"BAM\x01";
