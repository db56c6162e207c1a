//! Advance algorithm
//!
//! Picks the index to move to when a track completes, on next/previous, and
//! when a track fails to open. Shuffle only affects forward moves; stepping
//! backward is always sequential so "previous" follows the listener's intent.

use crate::types::Direction;
use rand::seq::SliceRandom;
use rand::Rng;

/// Index to move to from `current`, or `None` for an empty playlist
///
/// - forward + shuffle: uniform draw over `[0, len)`, the current track included
/// - forward: `current + 1`, wrapping to 0
/// - backward: `current - 1`, wrapping to `len - 1`, regardless of shuffle
pub fn advance<R: Rng + ?Sized>(
    current: Option<usize>,
    len: usize,
    shuffle: bool,
    direction: Direction,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let next = match direction {
        Direction::Forward if shuffle => rng.gen_range(0..len),
        Direction::Forward => current.map_or(0, |index| (index + 1) % len),
        Direction::Backward => match current {
            Some(index) if index > 0 && index <= len => index - 1,
            _ => len - 1,
        },
    };

    Some(next)
}

/// Bounded sequence of open attempts
///
/// Yields at most `len` candidates and never the same index twice, so a
/// playlist where nothing opens ends in a typed failure instead of a spin.
#[derive(Debug, Clone)]
pub struct AdvancePlan {
    len: usize,
    direction: Direction,
    shuffle: bool,
    pending_first: Option<usize>,
    last: Option<usize>,
    tried: Vec<bool>,
    attempts: usize,
}

impl AdvancePlan {
    /// Plan whose first candidate is `index` itself (play, repeat-one)
    pub fn starting_at(index: usize, len: usize, direction: Direction, shuffle: bool) -> Self {
        Self {
            len,
            direction,
            shuffle,
            pending_first: Some(index),
            last: None,
            tried: vec![false; len],
            attempts: 0,
        }
    }

    /// Plan whose first candidate is the advance from `current` (next, previous, completion)
    pub fn from_current<R: Rng + ?Sized>(
        current: Option<usize>,
        len: usize,
        direction: Direction,
        shuffle: bool,
        rng: &mut R,
    ) -> Self {
        Self {
            len,
            direction,
            shuffle,
            pending_first: advance(current, len, shuffle, direction, rng),
            last: current,
            tried: vec![false; len],
            attempts: 0,
        }
    }

    /// Next index to try, or `None` once every track has been attempted
    pub fn next_candidate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        if self.attempts >= self.len {
            return None;
        }

        let candidate = match self.pending_first.take() {
            Some(index) => index,
            None => self.step(rng)?,
        };
        if candidate >= self.len {
            return None;
        }

        self.tried[candidate] = true;
        self.attempts += 1;
        self.last = Some(candidate);
        Some(candidate)
    }

    fn step<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.shuffle && self.direction == Direction::Forward {
            let untried: Vec<usize> = (0..self.len).filter(|&i| !self.tried[i]).collect();
            return untried.choose(rng).copied();
        }

        let mut cursor = self.last;
        for _ in 0..self.len {
            cursor = advance(cursor, self.len, false, self.direction, rng);
            match cursor {
                Some(index) if !self.tried[index] => return Some(index),
                Some(_) => {}
                None => return None,
            }
        }
        None
    }

    /// Number of candidates handed out so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the plan can still yield a candidate
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.len
    }
}
