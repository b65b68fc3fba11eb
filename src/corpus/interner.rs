use std::hash::BuildHasher;

use lasso::{Rodeo, RodeoReader, Spur};
use twox_hash::XxHash64;

use crate::types::AuthorId;

/// Deterministic BuildHasher backed by XxHash64.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorHasher;

impl BuildHasher for AuthorHasher {
    type Hasher = XxHash64;
    fn build_hasher(&self) -> Self::Hasher {
        XxHash64::default()
    }
}

/// Frozen author interner shared by every graph snapshot of a run.
pub type AuthorInterner = RodeoReader<Spur, AuthorHasher>;

/// Intern author names in lexicographic order and freeze the result.
///
/// Sorting first makes `AuthorId` order equal to name order, which gives the
/// canonical `(min, max)` pair orientation used by the graph layer.
pub fn intern_sorted<'a, I>(names: I) -> AuthorInterner
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted: Vec<&str> = names.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut rodeo: Rodeo<Spur, AuthorHasher> = Rodeo::with_hasher(AuthorHasher);
    for name in sorted {
        rodeo.get_or_intern(name);
    }
    rodeo.into_reader()
}

/// Resolve an id back to its author name.
pub fn resolve(interner: &AuthorInterner, id: AuthorId) -> &str {
    interner.resolve(&id.0)
}
