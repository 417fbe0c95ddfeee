//! Accessors over raw BAM records, as returned by [`Reader::records`](crate::Reader::records).

use crate::{U16_SIZE, U32_SIZE, U8_SIZE};
use std::io;

// refID (4) + pos (4)
const L_READ_NAME_OFFSET: usize = 2 * U32_SIZE;

// refID + pos + l_read_name + mapq + bin + n_cigar_op + flag + l_seq +
// next_refID + next_pos + tlen
pub(crate) const FIXED_FIELDS_SIZE: usize = 6 * U32_SIZE + 2 * U8_SIZE + 3 * U16_SIZE;

/// Returns the read name of a raw record without its trailing NUL.
pub fn read_name(record: &[u8]) -> io::Result<&[u8]> {
    if record.len() < FIXED_FIELDS_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("record too short: {} bytes", record.len()),
        ));
    }
    let l_read_name = usize::from(record[L_READ_NAME_OFFSET]);
    let end = FIXED_FIELDS_SIZE + l_read_name;
    if l_read_name == 0 || record.len() < end {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid read name length",
        ));
    }
    // l_read_name counts the NUL terminator.
    Ok(&record[FIXED_FIELDS_SIZE..end - 1])
}
