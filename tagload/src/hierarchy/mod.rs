//! Hierarchy store module for reading the tag forest
//!
//! This module provides:
//! - `HierarchyStore` trait for abstracting the relational source
//! - `MySqlHierarchyStore` for reading the `tags` table over sqlx
//! - `MemoryHierarchyStore` for in-process fixtures

mod memory;
mod mysql;
mod store;
mod types;

pub use memory::MemoryHierarchyStore;
pub use mysql::MySqlHierarchyStore;
pub use store::HierarchyStore;
pub use types::{DataSourceError, Node};
