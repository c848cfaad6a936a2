//! Random trade generation for stress tests and benchmarks.

pub mod stress_test;
