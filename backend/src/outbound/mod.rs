//! Driven adapters implementing the domain ports.
//!
//! Purpose: keep all I/O-facing implementations (in-memory stores, the
//! HTTP batch client) behind the port traits so the domain stays free of
//! transport and storage concerns.

pub mod batch;
pub mod memory;

pub use batch::{FixtureBatchEngine, HttpBatchEngine};
pub use memory::{InMemoryImpersonationRegistry, InMemoryPortfolioStore, InMemoryUserStore};
