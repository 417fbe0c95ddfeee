// Source: https://github.com/zaeleus/noodles/blob/master/noodles-bam/src/reader/records.rs

use std::io::{self, Read};

use super::Reader;

/// An iterator over raw records of a BAM reader. Each item is the record
/// without its leading `block_size` field.
///
/// This is created by calling [`Reader::records`].
pub struct Records<'a, R> {
    reader: &'a mut Reader<R>,
    record: Vec<u8>,
}

impl<'a, R: Read> Records<'a, R> {
    pub(crate) fn new(reader: &'a mut Reader<R>) -> Self {
        Self {
            reader,
            record: Vec::default(),
        }
    }
}

impl<'a, R: Read> Iterator for Records<'a, R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(0) => None,
            Ok(_) => Some(Ok(self.record.clone())),
            Err(e) => Some(Err(e)),
        }
    }
}
