use crate::core::models::topology::Bond;
use nalgebra::Vector3;

/// Per-particle bond lists over a bond topology column.
///
/// Every bond row `i` contributes two half-bond slots: slot `2i` is linked
/// into the list of its first endpoint and slot `2i + 1` into the list of its
/// second endpoint. Lists are singly linked through `next`, with `2 * B` as the
/// end marker. The index borrows the topology it was built from, so it cannot
/// outlive a mutation of that column.
#[derive(Debug, Clone)]
pub struct AdjacencyIndex<'a> {
    topology: &'a [[i64; 2]],
    shifts: Option<&'a [Vector3<i32>]>,
    start: Vec<usize>,
    next: Vec<usize>,
}

impl<'a> AdjacencyIndex<'a> {
    /// Builds the index in one pass over the bond rows.
    ///
    /// Rows with an endpoint outside `0..particle_count` are not linked into
    /// any list. A `shifts` column shorter than the topology is treated as
    /// absent.
    pub fn new(
        topology: &'a [[i64; 2]],
        shifts: Option<&'a [Vector3<i32>]>,
        particle_count: usize,
    ) -> Self {
        let shifts = shifts.filter(|s| s.len() >= topology.len());
        let end = topology.len() * 2;
        let in_range = |endpoint: i64| usize::try_from(endpoint).is_ok_and(|i| i < particle_count);

        let mut start = vec![end; particle_count];
        let mut next = vec![end; end];
        for (bond_index, row) in topology.iter().enumerate() {
            if !(in_range(row[0]) && in_range(row[1])) {
                continue;
            }
            for (half, &endpoint) in row.iter().enumerate() {
                let slot = bond_index * 2 + half;
                let head = &mut start[endpoint as usize];
                next[slot] = *head;
                *head = slot;
            }
        }

        Self {
            topology,
            shifts,
            start,
            next,
        }
    }

    pub fn bond_count(&self) -> usize {
        self.topology.len()
    }

    fn end_slot(&self) -> usize {
        self.next.len()
    }

    fn head(&self, particle: usize) -> usize {
        self.start
            .get(particle)
            .copied()
            .unwrap_or_else(|| self.end_slot())
    }

    fn shift(&self, bond_index: usize) -> Vector3<i32> {
        self.shifts
            .map(|s| s[bond_index])
            .unwrap_or_else(Vector3::zeros)
    }

    fn slots(&self, particle: usize) -> SlotIter<'_> {
        SlotIter {
            next: &self.next,
            slot: self.head(particle),
        }
    }

    /// Indices of all bond rows touching `particle`.
    ///
    /// A bond connecting the particle to itself is reported twice.
    pub fn neighbors_of(&self, particle: usize) -> impl Iterator<Item = usize> + '_ {
        self.slots(particle).map(|slot| slot / 2)
    }

    /// Bonds touching `particle`, each oriented so that `index1 == particle`.
    pub fn oriented_neighbors_of(&self, particle: usize) -> impl Iterator<Item = Bond> + '_ {
        self.slots(particle).map(move |slot| {
            let bond_index = slot / 2;
            let row = self.topology[bond_index];
            let stored = Bond::with_shift(row[0] as usize, row[1] as usize, self.shift(bond_index));
            if slot % 2 == 0 { stored } else { stored.reversed() }
        })
    }

    /// Number of half-bonds registered at `particle`.
    pub fn degree(&self, particle: usize) -> usize {
        self.slots(particle).count()
    }

    /// Row index of the bond `index1 -> index2` crossing `shift`, in either
    /// stored orientation. Returns [`bond_count`](Self::bond_count) if absent.
    pub fn find_bond_index(&self, index1: usize, index2: usize, shift: &Vector3<i32>) -> usize {
        for slot in self.slots(index1) {
            let bond_index = slot / 2;
            let row = self.topology[bond_index];
            let stored = self.shift(bond_index);
            let matches = if slot % 2 == 0 {
                row[1] as usize == index2 && stored == *shift
            } else {
                row[0] as usize == index2 && stored == -*shift
            };
            if matches {
                return bond_index;
            }
        }
        self.bond_count()
    }

    pub fn find_bond(&self, bond: &Bond) -> Option<usize> {
        let index = self.find_bond_index(bond.index1, bond.index2, &bond.shift);
        (index != self.bond_count()).then_some(index)
    }
}

struct SlotIter<'i> {
    next: &'i [usize],
    slot: usize,
}

impl Iterator for SlotIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let slot = self.slot;
        if slot >= self.next.len() {
            return None;
        }
        self.slot = self.next[slot];
        Some(slot)
    }
}
