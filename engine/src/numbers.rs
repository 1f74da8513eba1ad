//! Pick-6 number selections.
//!
//! A selection is 6 distinct numbers from 1..=42, stored as a bitmask so
//! that counting matches is a single popcount.

use std::fmt;

use rand::{seq::index, Rng};

use crate::error::{Result, SimulationError};

/// Highest number that can be drawn.
pub const MAX_NUMBER: u8 = 42;

/// How many numbers make up a selection.
pub const PICK_COUNT: usize = 6;

/// A set of 6 distinct numbers in 1..=42.
///
/// Bit `n` is set when number `n` is part of the selection; bit 0 is unused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "Vec<u8>", try_from = "Vec<u8>")
)]
pub struct Numbers(u64);

impl Numbers {
    /// Draw 6 numbers uniformly without replacement.
    ///
    /// Used identically for winning draws and for ticket numbers.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bits = 0u64;
        for idx in index::sample(rng, MAX_NUMBER as usize, PICK_COUNT).into_iter() {
            bits |= 1 << (idx + 1);
        }
        Self(bits)
    }

    /// Build a selection from explicit numbers.
    pub fn from_slice(values: &[u8]) -> Result<Self> {
        if values.len() != PICK_COUNT {
            return Err(SimulationError::InvalidNumbers(format!(
                "expected {PICK_COUNT} numbers, got {}",
                values.len()
            )));
        }

        let mut bits = 0u64;
        for &value in values {
            if value == 0 || value > MAX_NUMBER {
                return Err(SimulationError::InvalidNumbers(format!(
                    "{value} is outside 1..={MAX_NUMBER}"
                )));
            }
            let bit = 1u64 << value;
            if bits & bit != 0 {
                return Err(SimulationError::InvalidNumbers(format!(
                    "{value} appears more than once"
                )));
            }
            bits |= bit;
        }
        Ok(Self(bits))
    }

    /// Number of values shared with another selection (0..=6).
    #[inline]
    pub fn matches(&self, other: &Numbers) -> u8 {
        (self.0 & other.0).count_ones() as u8
    }

    /// Whether the selection contains `value`.
    pub fn contains(&self, value: u8) -> bool {
        value <= MAX_NUMBER && self.0 & (1u64 << value) != 0
    }

    /// The numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=MAX_NUMBER).filter(move |&n| self.contains(n))
    }

    /// The numbers in ascending order, as an array.
    pub fn to_array(&self) -> [u8; PICK_COUNT] {
        let mut out = [0u8; PICK_COUNT];
        for (slot, n) in out.iter_mut().zip(self.iter()) {
            *slot = n;
        }
        out
    }
}

impl fmt::Display for Numbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for n in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{n}")?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Numbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Numbers({self})")
    }
}

impl From<Numbers> for Vec<u8> {
    fn from(numbers: Numbers) -> Self {
        numbers.iter().collect()
    }
}

impl TryFrom<Vec<u8>> for Numbers {
    type Error = SimulationError;

    fn try_from(values: Vec<u8>) -> Result<Self> {
        Self::from_slice(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_draw_is_six_distinct_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            let draw = Numbers::draw(&mut rng);
            let values = draw.to_array();
            assert_eq!(draw.iter().count(), PICK_COUNT);
            assert!(values.iter().all(|&n| (1..=MAX_NUMBER).contains(&n)));
            assert!(values.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_draw_covers_every_number() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut hits = [0u32; MAX_NUMBER as usize + 1];
        let draws = 42_000;
        for _ in 0..draws {
            for n in Numbers::draw(&mut rng).iter() {
                hits[n as usize] += 1;
            }
        }

        // Each number is expected in 6/42 of draws (6000 here).
        assert_eq!(hits[0], 0);
        for (n, &count) in hits.iter().enumerate().skip(1) {
            assert!(
                (5_400..6_600).contains(&count),
                "number {n} drawn {count} times"
            );
        }
    }

    #[test]
    fn test_matches() {
        let a = Numbers::from_slice(&[1, 2, 3, 4, 5, 6]).unwrap();
        let b = Numbers::from_slice(&[4, 5, 6, 7, 8, 9]).unwrap();
        let c = Numbers::from_slice(&[37, 38, 39, 40, 41, 42]).unwrap();

        assert_eq!(a.matches(&a), 6);
        assert_eq!(a.matches(&b), 3);
        assert_eq!(b.matches(&a), 3);
        assert_eq!(a.matches(&c), 0);
    }

    #[test]
    fn test_from_slice_rejects_bad_input() {
        assert!(Numbers::from_slice(&[1, 2, 3, 4, 5]).is_err());
        assert!(Numbers::from_slice(&[0, 2, 3, 4, 5, 6]).is_err());
        assert!(Numbers::from_slice(&[1, 2, 3, 4, 5, 43]).is_err());
        assert!(Numbers::from_slice(&[1, 1, 3, 4, 5, 6]).is_err());
    }

    #[test]
    fn test_display_is_sorted() {
        let n = Numbers::from_slice(&[41, 3, 25, 7, 12, 33]).unwrap();
        assert_eq!(n.to_string(), "3,7,12,25,33,41");
        assert_eq!(format!("{n:?}"), "Numbers(3,7,12,25,33,41)");
    }
}
