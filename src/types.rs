//! Common core types shared by the graph and corpus layers.

use lasso::{Key, Spur};

/// Dense identifier of an author inside one interner.
///
/// Authors are interned in lexicographic order, so comparing two ids gives
/// the same answer as comparing the names they stand for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorId(pub Spur);

impl AuthorId {
    /// Position of this id in the interner, usable as a dense array index.
    pub fn index(self) -> usize {
        self.0.into_usize()
    }
}

impl From<Spur> for AuthorId {
    fn from(s: Spur) -> Self {
        Self(s)
    }
}

impl From<AuthorId> for Spur {
    fn from(a: AuthorId) -> Self {
        a.0
    }
}

/// Epoch timestamp in seconds.
pub type Timestamp = i64;

/// Edge weight: number of shared qualifying subreddits.
pub type Weight = u32;
