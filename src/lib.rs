//! Offgrid - offline-first HTTP cache proxy
//!
//! Classifies intercepted requests, answers them from versioned cache
//! partitions with cache-first or network-first strategies, and degrades to
//! precached fallbacks when both network and cache come up empty.

pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod proxy;

pub use error::{OffgridError, OffgridResult};
