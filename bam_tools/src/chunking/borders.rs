//! Finds the places where a BAM file may be cut without splitting a ZMW or
//! a BGZF block.

use crate::error::{IndexError, Result};
use crate::VirtualPosition;

/// First record of a ZMW that also starts a BGZF block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    /// Position of the record in the index.
    pub record_index: usize,
    /// ZMW hole number.
    pub group_id: i32,
    /// File offset of the block the record starts.
    pub offset: u64,
}

impl Border {
    pub fn new(record_index: usize, group_id: i32, offset: u64) -> Self {
        Self {
            record_index,
            group_id,
            offset,
        }
    }
}

/// Walks `(group id, virtual position)` pairs in file order and returns a
/// border for every group whose first record sits at the very start of a
/// block. Records further inside a block are never borders: the block they
/// live in already began with an earlier record.
///
/// The first record must start a block, since everything before it is the
/// file header.
pub fn locate_borders<I>(entries: I) -> Result<Vec<Border>>
where
    I: IntoIterator<Item = (i32, VirtualPosition)>,
{
    let mut borders = Vec::new();
    let mut previous: Option<(i32, VirtualPosition)> = None;

    for (record_index, (group_id, pos)) in entries.into_iter().enumerate() {
        match previous {
            None => {
                if !pos.is_block_start() {
                    return Err(IndexError::FirstRecordNotAligned(pos).into());
                }
                borders.push(Border::new(record_index, group_id, pos.compressed()));
            }
            Some((prev_group, prev_pos)) => {
                if pos <= prev_pos {
                    return Err(IndexError::NotIncreasing {
                        record_index,
                        previous: prev_pos,
                        current: pos,
                    }
                    .into());
                }
                if group_id != prev_group && pos.is_block_start() {
                    borders.push(Border::new(record_index, group_id, pos.compressed()));
                }
            }
        }
        previous = Some((group_id, pos));
    }

    if previous.is_none() {
        return Err(IndexError::Empty.into());
    }

    Ok(borders)
}
