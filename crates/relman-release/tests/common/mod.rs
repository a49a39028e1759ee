//! Common test utilities for relman-release
//!
//! Provides a temporary release workspace (bundle + output directories),
//! build request defaults, and access to the committed RSA key fixtures.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;

pub use fixtures::*;
