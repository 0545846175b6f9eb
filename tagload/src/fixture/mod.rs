//! Fixture sampling
//!
//! A fixture is one randomly chosen base tag followed by its ancestor chain.
//! `FixtureSampler` builds a `FixtureSet` of configurable size from a
//! `HierarchyStore`.

mod sampler;
mod types;

pub use sampler::{FixtureSampler, MAX_CHAIN_DEPTH, SampleError};
pub use types::{Fixture, FixtureSet, ID_DELIMITER};
