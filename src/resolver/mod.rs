// src/resolver/mod.rs

//! Dependency resolution and reconciliation
//!
//! This module provides functionality for:
//! - Resolving package identifiers to manifest aliases
//! - Walking a root package's subscriber dependencies
//! - Reconciling the resolved graph with a manifest's dependency list

mod alias;
mod reconcile;
mod walker;

pub use alias::AliasResolver;
pub use reconcile::{PackageUpdate, Reconciliation, reconcile};
pub use walker::{GraphWalker, PackageRecord, ResolvedGraph};
