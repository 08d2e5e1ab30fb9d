//! fine-grained-deps library — per-file dependency graph construction for incremental builds.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
