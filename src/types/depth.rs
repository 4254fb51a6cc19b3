//! Depth and Ply types for search.
//!
//! Type-safe wrappers for remaining search depth and distance from the
//! root.

use std::ops::{Add, Sub};

/// Maximum search depth.
pub const MAX_DEPTH: i32 = 64;

/// Maximum ply (half-moves from root).
pub const MAX_PLY: i32 = 128;

/// Remaining search depth in plies.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
#[repr(transparent)]
pub struct Depth(pub i32);

impl Depth {
    pub const ZERO: Depth = Depth(0);
    pub const MAX: Depth = Depth(MAX_DEPTH);

    #[inline]
    pub const fn new(d: i32) -> Self {
        Depth(d)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// True once the main search has to drop into quiescence.
    #[inline]
    pub const fn is_qs(self) -> bool {
        self.0 <= 0
    }
}

impl Add<i32> for Depth {
    type Output = Self;
    #[inline]
    fn add(self, rhs: i32) -> Self {
        Depth(self.0 + rhs)
    }
}

impl Sub<i32> for Depth {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: i32) -> Self {
        Depth(self.0 - rhs)
    }
}

impl From<i32> for Depth {
    #[inline]
    fn from(d: i32) -> Self {
        Depth(d)
    }
}

/// Distance from the root position in half-moves.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
#[repr(transparent)]
pub struct Ply(pub i32);

impl Ply {
    pub const ZERO: Ply = Ply(0);
    pub const MAX: Ply = Ply(MAX_PLY);

    #[inline]
    pub const fn new(p: i32) -> Self {
        Ply(p)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// One ply deeper.
    #[inline]
    pub const fn next(self) -> Self {
        Ply(self.0 + 1)
    }
}

impl From<i32> for Ply {
    #[inline]
    fn from(p: i32) -> Self {
        Ply(p)
    }
}
