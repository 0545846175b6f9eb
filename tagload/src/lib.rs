//! tagload Library
//!
//! Samples ancestor chains from a hierarchical tag table and either prints a
//! Blitz command for them or calls an HTTP endpoint with them at a fixed
//! interval.

pub mod blitz;
pub mod config;
pub mod control;
pub mod driver;
pub mod fixture;
pub mod hierarchy;
pub mod run;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use driver::{HttpTransport, LoadDriver, RunReport, Transport};
pub use fixture::{Fixture, FixtureSampler, FixtureSet};
pub use hierarchy::{HierarchyStore, MemoryHierarchyStore, MySqlHierarchyStore, Node};
pub use run::{Mode, Outcome, RunError};
