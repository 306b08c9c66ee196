// src/repository/mod.rs

//! Package distribution service access
//!
//! This module provides:
//! - The `DistributionService` capability used by the resolver
//! - Report and listing types returned by the service
//! - An HTTP implementation against the tooling query API

mod tooling;

pub use tooling::ToolingClient;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// How much detail to request for a package version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDetail {
    /// Include the identifiers of the version's subscriber dependencies
    Full,
    /// Identifier and version only
    Shallow,
}

/// What the service knows about one package version
///
/// Either field may be missing when the requested identifier is unknown;
/// callers treat that as a resolution failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReport {
    /// Identifier of the package this version belongs to
    pub package_id: Option<String>,

    /// Dotted numeric version, e.g. `1.4.0.7`
    pub version: Option<String>,

    /// Subscriber package version identifiers this version depends on
    pub dependency_ids: Vec<String>,
}

/// A package visible to the authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageListing {
    pub id: String,
    pub name: String,
}

/// Read access to the package distribution service
pub trait DistributionService: Send + Sync {
    /// Report the package and version behind a subscriber package version id
    fn package_version(&self, version_id: &str, detail: ReportDetail) -> Result<VersionReport>;

    /// List every package visible to the session
    fn list_packages(&self) -> Result<Vec<PackageListing>>;
}

impl VersionReport {
    pub fn new(package_id: String, version: String) -> Self {
        Self {
            package_id: Some(package_id),
            version: Some(version),
            dependency_ids: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependency_ids: Vec<String>) -> Self {
        self.dependency_ids = dependency_ids;
        self
    }
}
