use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A fixed-arity tuple of particle row indices stored in a topology column.
///
/// Implemented for `[i64; N]`, which covers bond pairs, angle triplets and
/// dihedral/improper quadruplets with one generic code path.
pub trait IndexTuple: Copy + Send + Sync {
    const ARITY: usize;

    fn indices(&self) -> &[i64];
    fn indices_mut(&mut self) -> &mut [i64];

    /// Whether every index lies in `0..bound`.
    fn all_within(&self, bound: usize) -> bool {
        self.indices()
            .iter()
            .all(|&index| index >= 0 && (index as u64) < bound as u64)
    }
}

impl<const N: usize> IndexTuple for [i64; N] {
    const ARITY: usize = N;

    fn indices(&self) -> &[i64] {
        self
    }

    fn indices_mut(&mut self) -> &mut [i64] {
        self
    }
}

/// An undirected bond between two particle rows, crossing `shift` periodic
/// cell boundaries when going from `index1` to `index2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub index1: usize,
    pub index2: usize,
    pub shift: Vector3<i32>,
}

impl Bond {
    pub fn new(index1: usize, index2: usize) -> Self {
        Self::with_shift(index1, index2, Vector3::zeros())
    }

    pub fn with_shift(index1: usize, index2: usize, shift: Vector3<i32>) -> Self {
        Self {
            index1,
            index2,
            shift,
        }
    }

    /// The same physical bond encoded from the other endpoint.
    pub fn reversed(&self) -> Self {
        Self {
            index1: self.index2,
            index2: self.index1,
            shift: -self.shift,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.index1 == index || self.index2 == index
    }

    /// Canonical orientation: smaller endpoint first, ties broken by shift.
    pub fn canonical(&self) -> Self {
        let reversed = self.reversed();
        if (reversed.index1, reversed.index2, reversed.shift.as_slice())
            < (self.index1, self.index2, self.shift.as_slice())
        {
            reversed
        } else {
            *self
        }
    }

    pub fn topology(&self) -> [i64; 2] {
        [self.index1 as i64, self.index2 as i64]
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid bond specification '{0}', expected 'I-J' or 'I-J@SX,SY,SZ'")]
pub struct ParseBondError(pub String);

impl FromStr for Bond {
    type Err = ParseBondError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseBondError(s.to_string());
        let (pair, shift) = match s.trim().split_once('@') {
            Some((pair, shift)) => (pair, Some(shift)),
            None => (s.trim(), None),
        };
        let (i1, i2) = pair.split_once('-').ok_or_else(err)?;
        let index1 = i1.trim().parse().map_err(|_| err())?;
        let index2 = i2.trim().parse().map_err(|_| err())?;

        let shift = match shift {
            Some(shift) => {
                let components = shift
                    .split(',')
                    .map(|c| c.trim().parse::<i32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| err())?;
                match components.as_slice() {
                    &[x, y, z] => Vector3::new(x, y, z),
                    _ => return Err(err()),
                }
            }
            None => Vector3::zeros(),
        };
        Ok(Self::with_shift(index1, index2, shift))
    }
}

impl fmt::Display for Bond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.index1, self.index2)?;
        if self.shift != Vector3::zeros() {
            write!(f, "@{},{},{}", self.shift.x, self.shift.y, self.shift.z)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_tuple_arity_matches_array_length() {
        assert_eq!(<[i64; 2] as IndexTuple>::ARITY, 2);
        assert_eq!(<[i64; 3] as IndexTuple>::ARITY, 3);
        assert_eq!(<[i64; 4] as IndexTuple>::ARITY, 4);
    }

    #[test]
    fn all_within_rejects_negative_and_out_of_bounds_indices() {
        assert!([0i64, 3].all_within(4));
        assert!(![0i64, 4].all_within(4));
        assert!(![-1i64, 1, 2].all_within(4));
    }

    #[test]
    fn indices_mut_rewrites_in_place() {
        let mut quad = [1i64, 2, 3, 4];
        for index in quad.indices_mut() {
            *index *= 10;
        }
        assert_eq!(quad, [10, 20, 30, 40]);
    }

    #[test]
    fn reversed_swaps_endpoints_and_negates_shift() {
        let bond = Bond::with_shift(3, 7, Vector3::new(1, 0, -1));
        let reversed = bond.reversed();
        assert_eq!(reversed, Bond::with_shift(7, 3, Vector3::new(-1, 0, 1)));
        assert_eq!(reversed.reversed(), bond);
    }

    #[test]
    fn canonical_is_shared_by_both_encodings() {
        let bond = Bond::with_shift(5, 2, Vector3::new(0, 1, 0));
        assert_eq!(bond.canonical(), bond.reversed().canonical());
        assert_eq!(bond.canonical().index1, 2);
    }

    #[test]
    fn contains_checks_both_endpoints() {
        let bond = Bond::new(1, 2);
        assert!(bond.contains(1));
        assert!(bond.contains(2));
        assert!(!bond.contains(3));
    }

    #[test]
    fn from_str_parses_plain_and_shifted_bonds() {
        assert_eq!("0-1".parse::<Bond>().unwrap(), Bond::new(0, 1));
        assert_eq!(
            " 4-2@1,0,-1 ".parse::<Bond>().unwrap(),
            Bond::with_shift(4, 2, Vector3::new(1, 0, -1))
        );
    }

    #[test]
    fn from_str_rejects_malformed_bonds() {
        assert!("0".parse::<Bond>().is_err());
        assert!("a-1".parse::<Bond>().is_err());
        assert!("0-1@1,0".parse::<Bond>().is_err());
        assert!("-1-2".parse::<Bond>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for bond in [Bond::new(0, 1), Bond::with_shift(2, 3, Vector3::new(0, -1, 0))] {
            assert_eq!(bond.to_string().parse::<Bond>().unwrap(), bond);
        }
    }
}
