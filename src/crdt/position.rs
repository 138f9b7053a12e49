// model = "claude-opus-4-5"
// created = "2026-10-12"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Dense, totally ordered position identifiers.
//!
//! A position is a path of small integers compared lexicographically, with
//! a strict prefix ordered before its extensions. Between any two distinct
//! positions there is always room for another one: if no digit fits at the
//! level where the paths diverge, the new path extends one level deeper.
//!
//! Two sentinels bound every real position: `start()` is the empty path
//! and `end()` is greater than every path. Neither identifies a character.
//!
//! # Allocation
//!
//! Picking the midpoint of the gap halves the room on every insertion and
//! burns through a level in `log2(base)` consecutive appends. Instead the
//! `Allocator` stays within `boundary` digits of one bound, alternating by
//! depth:
//!
//! - even depths allocate just above the lower bound (typing forwards)
//! - odd depths allocate just below the upper bound (typing backwards)
//!
//! With the default `base` of 2^16 and `boundary` of 16, a level absorbs
//! several thousand insertions at the same slot before the path grows.
//!
//! Every digit chosen to end a path is at least 1. A path ending in 0 would
//! have nothing between it and its parent, so such paths are malformed.
//!
//! # Uniqueness
//!
//! Allocation is deterministic, so two replicas allocating between the same
//! bounds get the same digits. The allocating client's id and operation
//! counter are appended after the digits to keep their positions distinct.
//! See `Allocator::between_stamped` for the layout.

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde::ser::Error as _;
use smallvec::SmallVec;
use thiserror::Error;

use crate::config::Config;
use crate::config::DEFAULT_BASE;
use crate::config::DEFAULT_BOUNDARY;
use super::primitives::id::Site;

/// Inline storage for paths. Most positions are one or two levels deep
/// plus a short site suffix.
pub type Path = SmallVec<[u32; 8]>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("lower bound does not precede upper bound")]
    NotOrdered,
    #[error("malformed position: {0}")]
    Malformed(&'static str),
    #[error("sentinel position does not identify a character")]
    Sentinel,
}

/// A position in the document.
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Vec<u32>")]
pub struct Position {
    path: Path,
    end: bool,
}

impl Position {
    /// The start sentinel, below every real position.
    pub fn start() -> Position {
        return Position { path: Path::new(), end: false };
    }

    /// The end sentinel, above every real position.
    pub fn end() -> Position {
        return Position { path: Path::new(), end: true };
    }

    /// Build a real position from its canonical path.
    pub fn from_path(path: &[u32]) -> Result<Position, PositionError> {
        let position = Position { path: Path::from_slice(path), end: false };
        position.check()?;
        return Ok(position);
    }

    /// Allocate a position strictly between `lo` and `hi` with the default
    /// strategy and no site segment.
    ///
    /// ```
    /// use scribe::crdt::position::Position;
    ///
    /// let h = Position::between(&Position::start(), &Position::end()).unwrap();
    /// let i = Position::between(&h, &Position::end()).unwrap();
    /// assert!(Position::start() < h && h < i && i < Position::end());
    /// ```
    pub fn between(lo: &Position, hi: &Position) -> Result<Position, PositionError> {
        return Allocator::anonymous().between(lo, hi);
    }

    /// The canonical flat form. Empty for both sentinels.
    #[inline]
    pub fn path(&self) -> &[u32] {
        return &self.path;
    }

    #[inline]
    pub fn depth(&self) -> usize {
        return self.path.len();
    }

    pub fn is_start(&self) -> bool {
        return !self.end && self.path.is_empty();
    }

    pub fn is_end(&self) -> bool {
        return self.end;
    }

    pub fn is_sentinel(&self) -> bool {
        return self.path.is_empty();
    }

    /// Check that this position can identify a character.
    pub fn check(&self) -> Result<(), PositionError> {
        match self.path.last() {
            None => return Err(PositionError::Sentinel),
            Some(0) => return Err(PositionError::Malformed("path ends in 0")),
            Some(_) => {}
        }
        if self.end {
            return Err(PositionError::Sentinel);
        }
        return Ok(());
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.end, other.end) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.path.as_slice().cmp(other.path.as_slice()),
        }
    }
}

impl TryFrom<Vec<u32>> for Position {
    type Error = PositionError;

    fn try_from(path: Vec<u32>) -> Result<Position, PositionError> {
        return Position::from_path(&path);
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.end {
            return Err(S::Error::custom("the end sentinel has no wire form"));
        }
        return self.path.as_slice().serialize(serializer);
    }
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.end {
            return write!(f, "Position(End)");
        }
        return write!(f, "Position({:?})", self.path.as_slice());
    }
}

/// Allocates positions between two bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocator {
    base: u32,
    boundary: u32,
    site: Option<Site>,
}

impl Allocator {
    /// An allocator that closes every position with `site`.
    pub fn new(config: &Config, site: Site) -> Allocator {
        return Allocator {
            base: config.base.max(2),
            boundary: config.boundary.max(1),
            site: Some(site),
        };
    }

    /// The default strategy without a site suffix. Positions it produces
    /// are only unique if a single replica allocates them.
    pub fn anonymous() -> Allocator {
        return Allocator {
            base: DEFAULT_BASE,
            boundary: DEFAULT_BOUNDARY,
            site: None,
        };
    }

    pub fn site(&self) -> Option<&Site> {
        return self.site.as_ref();
    }

    /// Allocate a position `c` with `lo < c < hi`, for use outside any
    /// operation. Same as `between_stamped` with counter 0.
    pub fn between(&self, lo: &Position, hi: &Position) -> Result<Position, PositionError> {
        return self.between_stamped(lo, hi, 0);
    }

    /// Allocate a position `c` with `lo < c < hi` on behalf of the
    /// operation `(site, counter)`.
    ///
    /// With a site, the path is the chosen digits followed by
    ///
    /// ```text
    /// site segments.., counter high 32 bits, counter low 32 bits, site byte length + 1
    /// ```
    ///
    /// The last segment is never 0 and says how many site segments precede
    /// the counter, so the suffix reads back unambiguously from the end.
    /// Two such paths are equal only if they name the same client and
    /// counter, which no two operations share.
    pub fn between_stamped(&self, lo: &Position, hi: &Position, counter: u64) -> Result<Position, PositionError> {
        let mut path = self.digits(lo, hi)?;
        if let Some(site) = &self.site {
            path.extend_from_slice(site.segments());
            path.push((counter >> 32) as u32);
            path.push(counter as u32);
            path.push(site.len().saturating_add(1));
        }
        return Ok(Position { path, end: false });
    }

    fn digits(&self, lo: &Position, hi: &Position) -> Result<Path, PositionError> {
        if lo >= hi {
            return Err(PositionError::NotOrdered);
        }

        let mut path = Path::new();
        // Whether `path` still equals the matching prefix of each bound.
        let mut lo_bound = true;
        let mut hi_bound = !hi.end;
        let mut depth = 0;

        loop {
            let lo_digit = if lo_bound { lo.path.get(depth).copied() } else { None };
            let hi_digit = if hi_bound {
                match hi.path.get(depth) {
                    Some(digit) => Some(*digit),
                    // Only reachable when `hi` is `lo` extended by zeros.
                    None => return Err(PositionError::Malformed("path ends in 0")),
                }
            } else {
                None
            };

            // Candidate terminal digits are [low, high).
            let low = lo_digit.map_or(1, |digit| digit as u64 + 1);
            let high = hi_digit.map_or(self.base as u64, |digit| digit as u64);

            if low < high {
                path.push(self.pick(depth, low, high));
                break;
            }

            match lo_digit {
                Some(digit) => {
                    path.push(digit);
                    hi_bound = hi_bound && hi_digit == Some(digit);
                }
                None => {
                    // Past the end of `lo`: every extension is already above it.
                    lo_bound = false;
                    path.push(0);
                    hi_bound = hi_bound && hi_digit == Some(0);
                }
            }
            depth += 1;
        }

        return Ok(path);
    }

    fn pick(&self, depth: usize, low: u64, high: u64) -> u32 {
        let window = (high - low).min(self.boundary as u64);
        let offset = window / 2;
        let digit = if depth % 2 == 0 { low + offset } else { high - 1 - offset };
        return digit as u32;
    }
}

impl Default for Allocator {
    fn default() -> Self {
        return Self::anonymous();
    }
}
