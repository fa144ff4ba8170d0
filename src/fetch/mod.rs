//! Network-facing request/response model and fetch client

pub mod client;
pub mod message;

pub use client::{Fetcher, HttpFetcher};
pub use message::{resolve_target, strip_hop_by_hop, FetchRequest, FetchResponse, RequestMode};
