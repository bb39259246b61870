//! Shared test utilities for the pact verifier.
//!
//! This crate provides:
//! - Proptest generators for JSON values, paths and header values
//! - A recording mock transport
//! - Sample contracts and provider answers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
