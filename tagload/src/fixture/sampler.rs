//! Fixture sampler: random base node plus its ancestor chain

use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;
use tracing::debug;

use super::types::{Fixture, FixtureSet};
use crate::hierarchy::{DataSourceError, HierarchyStore, Node};

/// Hop limit when walking parent links.
/// A chain this long means `parent_id` loops back on itself.
pub const MAX_CHAIN_DEPTH: usize = 1024;

/// Errors that can occur while building a fixture set
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("No base tags to sample from")]
    EmptyBaseSet,

    #[error("Fixture count must be at least 1")]
    InvalidCount,

    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

/// Builds fixtures by walking parent links in a hierarchy store
pub struct FixtureSampler<'a, S: HierarchyStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: HierarchyStore + ?Sized> FixtureSampler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Build `count` fixtures, each from a base drawn uniformly (with
    /// replacement) from `nodes`
    ///
    /// The first failed lookup aborts the whole set.
    pub async fn sample<R>(
        &self,
        nodes: &[Node],
        count: usize,
        rng: &mut R,
    ) -> Result<FixtureSet, SampleError>
    where
        R: Rng + ?Sized,
    {
        if nodes.is_empty() {
            return Err(SampleError::EmptyBaseSet);
        }
        if count == 0 {
            return Err(SampleError::InvalidCount);
        }

        debug!("Run for {} fixtures over {} base tags", count, nodes.len());

        let mut fixtures = Vec::with_capacity(count);
        for _ in 0..count {
            let base = nodes.choose(rng).ok_or(SampleError::EmptyBaseSet)?;
            debug!("Picked base tag: {} ({})", base.id, base.name);
            fixtures.push(self.build_fixture(base).await?);
        }

        Ok(FixtureSet::from(fixtures))
    }

    /// Walk from `base` to its root, collecting ids leaf first
    ///
    /// A parent id that does not resolve ends the chain like a root does.
    pub async fn build_fixture(&self, base: &Node) -> Result<Fixture, SampleError> {
        let mut fixture = Fixture::new(base.id);
        let mut current = base.clone();

        while let Some(parent) = self.store.parent_of(&current).await? {
            if fixture.len() >= MAX_CHAIN_DEPTH {
                return Err(DataSourceError::CorruptHierarchy {
                    start: base.id,
                    limit: MAX_CHAIN_DEPTH,
                }
                .into());
            }
            fixture.push_ancestor(parent.id);
            current = parent;
        }

        debug!("Got all the parents for tag {}: [{}]", base.id, fixture);
        Ok(fixture)
    }
}
