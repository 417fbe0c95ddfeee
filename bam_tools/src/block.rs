use crate::VirtualPosition;
use std::io::Cursor;

/// A single inflated BGZF block together with its location in the
/// compressed stream.
#[derive(Debug, Default)]
pub(crate) struct Block {
    // Offset of the block in the compressed stream.
    position: u64,
    // Size of the block on disk, header and trailer included.
    len: u64,
    data: Cursor<Vec<u8>>,
}

impl Block {
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    pub fn set_len(&mut self, len: u64) {
        self.len = len;
    }

    pub fn data_mut(&mut self) -> &mut Cursor<Vec<u8>> {
        &mut self.data
    }

    /// Position of the next unread byte. An exhausted block points at the
    /// start of the block that follows it.
    pub fn virtual_position(&self) -> VirtualPosition {
        let consumed = self.data.position();
        let pos = if consumed < self.data.get_ref().len() as u64 {
            VirtualPosition::new(self.position, consumed as u16)
        } else {
            VirtualPosition::new(self.position + self.len, 0)
        };
        pos.unwrap_or_default()
    }
}
