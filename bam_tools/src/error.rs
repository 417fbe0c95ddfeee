use crate::VirtualPosition;

/// Result type of the chunking operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while locating borders, planning or writing chunks.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The positional index is unusable for splitting
    #[error("Malformed index: {0}")]
    Index(#[from] IndexError),

    #[error("Invalid chunk count: {0}, at least one chunk is required")]
    InvalidChunkCount(usize),

    /// The source ends before a byte range that was requested from it
    #[error("Source is truncated: expected at least {expected} bytes, found {found}")]
    Truncated { expected: u64, found: u64 },

    #[error("Invalid byte range {start}..{end} (header ends at {header_end})")]
    InvalidRange {
        header_end: u64,
        start: u64,
        end: u64,
    },

    /// The BAM header shares a block with the first record, so it cannot be
    /// copied on its own
    #[error("BAM header does not end on a BGZF block boundary (ends at {0})")]
    HeaderNotBlockAligned(VirtualPosition),

    #[error("Error with IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error writing manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unable to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// True for errors caused by the positional index rather than by the
    /// filesystem or the caller's arguments.
    pub fn is_malformed_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

/// Violations of the positional index invariants.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IndexError {
    #[error("index contains no records")]
    Empty,

    #[error("virtual offsets are not increasing at record {record_index} ({previous} >= {current})")]
    NotIncreasing {
        record_index: usize,
        previous: VirtualPosition,
        current: VirtualPosition,
    },

    #[error("first record does not start a BGZF block ({0})")]
    FirstRecordNotAligned(VirtualPosition),

    #[error("invalid PBI magic number: {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("unsupported PBI version: {0:#x}")]
    UnsupportedVersion(u32),

    #[error("index declares {n_reads} records but its {column} column holds only {found}")]
    Truncated {
        column: &'static str,
        n_reads: usize,
        found: usize,
    },

    #[error("BAM header ends at {header_end} but the first indexed record is at {first_record}")]
    HeaderMismatch { header_end: u64, first_record: u64 },

    #[error("record offset {offset} lies beyond the end of compressed data ({data_end})")]
    OffsetBeyondData { offset: u64, data_end: u64 },
}
