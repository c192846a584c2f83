//! Sample payload generation.
//!
//! Produces random secrets sealed into payload pairs, for demos,
//! integration tests and benchmarks. Seeded generators are reproducible.

mod generator;

pub use generator::{Sample, SampleGenerator, SECRET_ALPHABET};
