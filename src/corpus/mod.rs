//! Input data model: cascades, contribution counts, loaders and the
//! cascade sanitizer.

pub mod cascade;
pub mod contributions;
/// Author-name interning in lexicographic order.
pub mod interner;
pub mod loader;
pub mod sanitizer;

pub use cascade::{Cascade, CascadeSet, Participation, TimeWindow};
pub use contributions::{AuthorActivity, ContributionIndex, ContributionRecord};
pub use interner::AuthorInterner;
pub use loader::{CascadeReader, ContributionReader, LoadReport};
pub use sanitizer::CascadeSanitizer;
