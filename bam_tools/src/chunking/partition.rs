use super::borders::Border;
use crate::error::{Error, IndexError, Result};
use itertools::Itertools;
use log::info;
use std::ops::Range;

/// Picks the start offsets of up to `requested` chunks, balancing chunks by
/// record count.
///
/// The first chunk always starts at the first border. For each further
/// chunk `k` the border whose record index is closest to
/// `k * n_records / n` is taken, where `n` is the chunk count after
/// clamping to the number of borders. Candidates are restricted so that
/// every later chunk still has a border of its own, hence offsets never
/// repeat and no chunk is empty.
pub fn choose_offsets(borders: &[Border], n_records: usize, requested: usize) -> Result<Vec<u64>> {
    if requested < 1 {
        return Err(Error::InvalidChunkCount(requested));
    }
    if borders.is_empty() {
        return Err(IndexError::Empty.into());
    }

    let n_chunks = requested.min(borders.len());
    if n_chunks < requested {
        info!(
            "Only {} legal split points found, producing {} chunks instead of {}",
            borders.len(),
            n_chunks,
            requested
        );
    }

    let mut chosen = 0;
    let mut offsets = Vec::with_capacity(n_chunks);
    offsets.push(borders[0].offset);

    for k in 1..n_chunks {
        // The target is k * n_records / n_chunks; compare scaled by n_chunks
        // to stay in integers.
        let target = (k * n_records) as i128;
        let last_candidate = borders.len() - (n_chunks - k);
        let pick = (chosen + 1..=last_candidate)
            .min_by_key(|&i| ((borders[i].record_index * n_chunks) as i128 - target).abs())
            .unwrap_or(chosen + 1);
        offsets.push(borders[pick].offset);
        chosen = pick;
    }

    Ok(offsets)
}

/// Byte layout of the chunks: the offset where the header ends, one offset
/// per chunk boundary and the end of compressed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    offsets: Vec<u64>,
}

impl ChunkPlan {
    /// Closes the chunk starts returned by [`choose_offsets`] with
    /// `data_end`, the offset right before the EOF marker.
    pub fn new(mut starts: Vec<u64>, data_end: u64) -> Result<Self> {
        if starts.is_empty() {
            return Err(IndexError::Empty.into());
        }
        for (&a, &b) in starts.iter().tuple_windows() {
            if a >= b {
                return Err(Error::InvalidRange {
                    header_end: starts[0],
                    start: a,
                    end: b,
                });
            }
        }
        if let Some(&last) = starts.last() {
            if last >= data_end {
                return Err(IndexError::OffsetBeyondData {
                    offset: last,
                    data_end,
                }
                .into());
            }
        }
        starts.push(data_end);
        Ok(Self { offsets: starts })
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// The header occupies `0..header_end`.
    pub fn header_end(&self) -> u64 {
        self.offsets[0]
    }

    pub fn data_end(&self) -> u64 {
        self.offsets[self.offsets.len() - 1]
    }

    pub fn n_chunks(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Byte range of every chunk, in order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        self.offsets
            .iter()
            .copied()
            .tuple_windows()
            .map(|(start, end)| start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_a() -> Vec<Border> {
        vec![
            Border::new(0, 1650, 396),
            Border::new(16, 7247, 26575),
            Border::new(48, 30983, 77209),
        ]
    }

    #[test]
    fn test_choose_offsets_fixture_a() {
        let borders = fixture_a();
        assert_eq!(choose_offsets(&borders, 80, 4).unwrap(), vec![396, 26575, 77209]);
        assert_eq!(choose_offsets(&borders, 80, 3).unwrap(), vec![396, 26575, 77209]);
        assert_eq!(choose_offsets(&borders, 80, 2).unwrap(), vec![396, 77209]);
        assert_eq!(choose_offsets(&borders, 80, 1).unwrap(), vec![396]);
    }

    #[test]
    fn test_choose_offsets_single_border() {
        let borders = vec![Border::new(0, 5_177_614, 447)];
        for n in 1..6 {
            assert_eq!(choose_offsets(&borders, 12, n).unwrap(), vec![447]);
        }
    }

    #[test]
    fn test_choose_offsets_balances_records() {
        // A border every 10 records.
        let borders: Vec<Border> = (0..10)
            .map(|i| Border::new(i * 10, i as i32, 1000 + i as u64 * 5000))
            .collect();
        let offsets = choose_offsets(&borders, 100, 4).unwrap();
        // Targets are records 25, 50 and 75; ties go to the earlier border.
        assert_eq!(offsets, vec![1000, 11000, 26000, 36000]);
    }

    #[test]
    fn test_choose_offsets_crowded_end() {
        // All borders near the end: every chunk still gets its own border.
        let borders = vec![
            Border::new(0, 1, 100),
            Border::new(97, 2, 900),
            Border::new(98, 3, 950),
            Border::new(99, 4, 990),
        ];
        let offsets = choose_offsets(&borders, 100, 4).unwrap();
        assert_eq!(offsets, vec![100, 900, 950, 990]);
    }

    #[test]
    fn test_choose_offsets_properties() {
        let borders: Vec<Border> = (0..37)
            .map(|i| Border::new(i * i, i as i32, 500 + (i * i) as u64 * 300))
            .collect();
        for requested in 1..50 {
            let offsets = choose_offsets(&borders, 1400, requested).unwrap();
            assert_eq!(offsets.len(), requested.min(borders.len()));
            assert_eq!(offsets[0], 500);
            assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_invalid_chunk_count() {
        let res = choose_offsets(&fixture_a(), 80, 0);
        assert!(matches!(res, Err(Error::InvalidChunkCount(0))));
    }

    #[test]
    fn test_chunk_plan() {
        let plan = ChunkPlan::new(vec![396, 26575, 77209], 90112).unwrap();
        assert_eq!(plan.n_chunks(), 3);
        assert_eq!(plan.header_end(), 396);
        assert_eq!(plan.data_end(), 90112);
        assert_eq!(
            plan.ranges().collect::<Vec<_>>(),
            vec![396..26575, 26575..77209, 77209..90112]
        );
    }

    #[test]
    fn test_chunk_plan_rejects_offsets_past_data() {
        let res = ChunkPlan::new(vec![396, 26575, 77209], 77209);
        assert!(matches!(
            res,
            Err(Error::Index(IndexError::OffsetBeyondData { .. }))
        ));
        let res = ChunkPlan::new(vec![396, 396], 1000);
        assert!(matches!(res, Err(Error::InvalidRange { .. })));
    }
}
