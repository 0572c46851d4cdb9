//! Problem data: city coordinates and the precomputed distance matrix.
//!
//! Both are built once per dataset, upstream of the evolutionary loop, and
//! shared read-only by every stage afterwards.

mod dataset;
mod distance;

pub use dataset::{City, Dataset};
pub use distance::DistanceMatrix;
