//! Integration tests for offgrid

mod cli;
mod engine;
mod lifecycle;
mod proxy;
mod support;
