use std::fmt;

// Compressed offsets occupy the upper 48 bits of a packed position.
const MAX_COMPRESSED_POSITION: u64 = (1 << 48) - 1;
const UNCOMPRESSED_BITS: u32 = 16;

/// Position of a byte inside a BGZF stream.
///
/// `compressed` is the file offset where the enclosing block starts and
/// `uncompressed` is the offset of the byte inside the inflated block.
/// Ordering compares the block first, as the packed form does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualPosition {
    compressed: u64,
    uncompressed: u16,
}

impl VirtualPosition {
    /// Returns `None` if `compressed` does not fit into 48 bits.
    pub fn new(compressed: u64, uncompressed: u16) -> Option<Self> {
        if compressed > MAX_COMPRESSED_POSITION {
            return None;
        }
        Some(Self {
            compressed,
            uncompressed,
        })
    }

    pub fn compressed(&self) -> u64 {
        self.compressed
    }

    pub fn uncompressed(&self) -> u16 {
        self.uncompressed
    }

    /// True if the position points at the first byte of a block.
    pub fn is_block_start(&self) -> bool {
        self.uncompressed == 0
    }
}

impl From<u64> for VirtualPosition {
    fn from(pos: u64) -> Self {
        Self {
            compressed: pos >> UNCOMPRESSED_BITS,
            uncompressed: pos as u16,
        }
    }
}

impl From<VirtualPosition> for u64 {
    fn from(pos: VirtualPosition) -> Self {
        (pos.compressed << UNCOMPRESSED_BITS) | u64::from(pos.uncompressed)
    }
}

impl fmt::Display for VirtualPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.compressed, self.uncompressed)
    }
}
