//! I/O helpers for harness commands.

pub mod config;
pub mod discover;
pub mod engine;
pub mod envcheck;
pub mod process;
pub mod support;
