//! Deterministic, pure logic shared by the harness core.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod plan;
pub mod unit;
pub mod version;
