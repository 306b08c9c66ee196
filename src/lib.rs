// src/lib.rs

//! Depsync
//!
//! Keeps a project's declared package dependencies in step with the
//! dependency graph published by a package distribution service.
//!
//! # Architecture
//!
//! - Version comparison: truncated prefix rule, final segment pinned as `LATEST`
//! - Alias resolution: manifest alias table, service listing, identifier fallback
//! - Graph walking: root package plus its direct dependencies, fetched concurrently
//! - Reconciliation: resolved packages first, every other entry preserved

pub mod config;
mod error;
pub mod manifest;
pub mod repository;
pub mod resolver;
pub mod update;
pub mod version;

pub use error::{Error, Result, Warning};
