//! Fixture and fixture set types

use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;

/// Percent-encoded comma joining the ids of one fixture in a URL
pub const ID_DELIMITER: &str = "%2C";

/// A base tag id followed by its ancestors, leaf first
///
/// Never empty: the first element is always the sampled base node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    ids: Vec<i64>,
}

impl Fixture {
    /// Start a chain at the sampled base node
    pub fn new(base: i64) -> Self {
        Self { ids: vec![base] }
    }

    /// Build from a complete chain; `None` if empty
    pub fn from_chain(ids: Vec<i64>) -> Option<Self> {
        (!ids.is_empty()).then_some(Self { ids })
    }

    /// Append the parent of the current last element
    pub fn push_ancestor(&mut self, id: i64) {
        self.ids.push(id);
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// The sampled base node
    pub fn base(&self) -> i64 {
        self.ids[0]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Ids joined by [`ID_DELIMITER`], ready to append to a query string
    pub fn encode(&self) -> String {
        self.join(ID_DELIMITER)
    }

    fn join(&self, sep: &str) -> String {
        self.ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

/// Plain comma-joined ids, for logs
impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(","))
    }
}

/// Fixed-size collection of fixtures built once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureSet {
    fixtures: Vec<Fixture>,
}

impl FixtureSet {
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fixture> {
        self.fixtures.iter()
    }

    pub fn as_slice(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Draw one fixture uniformly at random
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Fixture> {
        self.fixtures.choose(rng)
    }
}

impl From<Vec<Fixture>> for FixtureSet {
    fn from(fixtures: Vec<Fixture>) -> Self {
        Self { fixtures }
    }
}

impl FromIterator<Fixture> for FixtureSet {
    fn from_iter<I: IntoIterator<Item = Fixture>>(iter: I) -> Self {
        Self {
            fixtures: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FixtureSet {
    type Item = &'a Fixture;
    type IntoIter = std::slice::Iter<'a, Fixture>;

    fn into_iter(self) -> Self::IntoIter {
        self.fixtures.iter()
    }
}
