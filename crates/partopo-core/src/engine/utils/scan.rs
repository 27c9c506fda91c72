use bitvec::prelude::*;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use std::sync::{Mutex, PoisonError};

/// Rows handed to one worker at a time.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
const CHUNK_SIZE: usize = 4096;

fn endpoints_match<F>(row: &[i64; 2], predicate: &F) -> bool
where
    F: Fn(usize) -> bool,
{
    row.iter()
        .all(|&index| usize::try_from(index).is_ok_and(|i| predicate(i)))
}

/// Marks every bond whose two endpoints both satisfy `predicate`.
///
/// Rows with a negative endpoint are never selected. With the `parallel`
/// feature the rows are split into chunks; each chunk fills a private mask
/// that is merged into the result under a single lock.
pub fn select_bonds<F>(topology: &[[i64; 2]], predicate: F) -> BitVec
where
    F: Fn(usize) -> bool + Sync,
{
    #[cfg(feature = "parallel")]
    let selection = {
        let merged = Mutex::new(bitvec![0; topology.len()]);
        topology
            .par_chunks(CHUNK_SIZE)
            .enumerate()
            .for_each(|(chunk_index, rows)| {
                let mut local: BitVec = BitVec::repeat(false, rows.len());
                for (row_index, row) in rows.iter().enumerate() {
                    if endpoints_match(row, &predicate) {
                        local.set(row_index, true);
                    }
                }
                if local.not_any() {
                    return;
                }
                let offset = chunk_index * CHUNK_SIZE;
                let mut merged = merged.lock().unwrap_or_else(PoisonError::into_inner);
                for row_index in local.iter_ones() {
                    merged.set(offset + row_index, true);
                }
            });
        merged.into_inner().unwrap_or_else(PoisonError::into_inner)
    };

    #[cfg(not(feature = "parallel"))]
    let selection = {
        topology
            .iter()
            .map(|row| endpoints_match(row, &predicate))
            .collect::<BitVec>()
    };

    debug!(
        bonds = topology.len(),
        selected = selection.count_ones(),
        "Selected bonds by endpoint predicate."
    );
    selection
}

/// Mask of particles whose `Selection` value is non-zero.
pub fn selection_mask(selection: &[i32]) -> BitVec {
    selection.iter().map(|&value| value != 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_bonds_requires_both_endpoints() {
        let topology = vec![[0, 1], [1, 2], [2, 3], [3, 0], [-1, 1]];
        let selected = select_bonds(&topology, |p| p <= 2);
        assert_eq!(selected.iter_ones().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn select_bonds_spans_multiple_chunks() {
        let count = CHUNK_SIZE * 2 + 17;
        let topology: Vec<[i64; 2]> = (0..count as i64).map(|i| [i, i + 1]).collect();
        let selected = select_bonds(&topology, |p| p % 2 == 0 || p > CHUNK_SIZE * 2);

        assert_eq!(selected.len(), count);
        let expected: Vec<usize> = (0..count).filter(|&i| i >= CHUNK_SIZE * 2).collect();
        assert_eq!(selected.iter_ones().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn select_bonds_on_empty_topology_is_empty() {
        let selected = select_bonds(&[], |_| true);
        assert!(selected.is_empty());
    }

    #[test]
    fn selection_mask_flags_non_zero_values() {
        let mask = selection_mask(&[0, 1, 0, -3]);
        assert_eq!(mask.len(), 4);
        assert_eq!(mask.iter_ones().collect::<Vec<_>>(), vec![1, 3]);
    }
}
