//! # Test Helper
//! Shared tooling for the workspace tests: a software graphics driver that implements the
//! renderer and interception seams without a GPU, a logger, and helpers for reading captured
//! frames back from disk.
//!

extern crate alloc;

pub mod frames;
pub mod logger;
pub mod software;
