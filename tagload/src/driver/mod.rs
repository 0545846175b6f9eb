//! Fixed-interval load driver
//!
//! This module provides:
//! - `Transport` trait for the outbound GET capability
//! - `HttpTransport` backed by reqwest
//! - `LoadDriver`, which issues one request per tick and drains in-flight
//!   requests after cancellation
//! - `ResponseStats` and `RunReport` for the end-of-run summary

mod load;
mod stats;
mod transport;

pub use load::{CallCounters, DriverObserver, DriverPhase, DriverState, LoadDriver};
pub use stats::{LatencyStats, ResponseStats, RunReport};
pub use transport::{HttpTransport, Transport, TransportError};
