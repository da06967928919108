//! Property-testing and signal-generation support for quell.
//!
//! Provides deterministic packed spectra for integration tests, benchmarks
//! and examples, plus `proptest` strategies for spectra and gain inputs.

pub mod generators;
pub mod strategies;

pub use proptest;
pub use test_strategy;
