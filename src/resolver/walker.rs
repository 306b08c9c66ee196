// src/resolver/walker.rs

//! Dependency graph walking
//!
//! Expands a root package version into the flat list of records it depends
//! on. Expansion is one level deep: the root is fetched with its dependency
//! identifiers, each dependency is fetched shallowly, and grand-dependencies
//! are not followed. Sibling fetches run on a bounded worker pool.

use super::alias::AliasResolver;
use crate::error::{Error, Result};
use crate::repository::{DistributionService, ReportDetail};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, info};

/// A resolved package as reported by the distribution service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub package_id: String,
    /// Subscriber package version the record was fetched as
    pub version_id: String,
    pub package_alias: String,
    pub package_version: String,
}

/// Result of a walk: the root's dependencies followed by the root itself
///
/// The root is always the last record yielded by `iter`, so that decisions
/// about the root are made after every dependency has been considered.
/// Dependencies have no guaranteed order among themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGraph {
    dependencies: Vec<PackageRecord>,
    root: PackageRecord,
}

impl ResolvedGraph {
    pub fn new(dependencies: Vec<PackageRecord>, root: PackageRecord) -> Self {
        Self { dependencies, root }
    }

    pub fn root(&self) -> &PackageRecord {
        &self.root
    }

    pub fn dependencies(&self) -> &[PackageRecord] {
        &self.dependencies
    }

    /// Every record, root last
    pub fn iter(&self) -> impl Iterator<Item = &PackageRecord> {
        self.dependencies.iter().chain(std::iter::once(&self.root))
    }

    pub fn into_records(self) -> Vec<PackageRecord> {
        let mut records = self.dependencies;
        records.push(self.root);
        records
    }
}

/// Walks a package's subscriber dependencies
pub struct GraphWalker<'a> {
    service: &'a dyn DistributionService,
    aliases: &'a AliasResolver<'a>,
    pool: ThreadPool,
}

impl<'a> GraphWalker<'a> {
    /// Create a walker that runs at most `max_concurrency` fetches at once
    pub fn new(
        service: &'a dyn DistributionService,
        aliases: &'a AliasResolver<'a>,
        max_concurrency: usize,
    ) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(Error::ConfigError(
                "Concurrency limit must be at least 1".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(max_concurrency)
            .thread_name(|i| format!("depsync-fetch-{}", i))
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create worker pool: {}", e)))?;

        Ok(Self {
            service,
            aliases,
            pool,
        })
    }

    /// Resolve the root package version and its direct dependencies
    ///
    /// Fails as a whole if any fetch fails or reports no identifier or
    /// version; a partial graph is never returned.
    pub fn resolve(&self, root_version_id: &str) -> Result<ResolvedGraph> {
        info!("Resolving dependencies of {}", root_version_id);

        let (root, dependency_ids) = self.fetch(root_version_id, ReportDetail::Full)?;

        if dependency_ids.is_empty() {
            info!("{} declares no dependencies", root.package_alias);
            return Ok(ResolvedGraph::new(Vec::new(), root));
        }

        debug!(
            "{} declares {} dependencies",
            root.package_alias,
            dependency_ids.len()
        );

        let dependencies = self.pool.install(|| {
            dependency_ids
                .par_iter()
                .map(|id| self.fetch(id, ReportDetail::Shallow).map(|(record, _)| record))
                .collect::<Result<Vec<_>>>()
        })?;

        info!(
            "Resolved {} dependencies of {} {}",
            dependencies.len(),
            root.package_alias,
            root.package_version
        );

        Ok(ResolvedGraph::new(dependencies, root))
    }

    fn fetch(&self, version_id: &str, detail: ReportDetail) -> Result<(PackageRecord, Vec<String>)> {
        debug!("Fetching package version {}", version_id);

        let report = self
            .service
            .package_version(version_id, detail)
            .map_err(|e| {
                Error::ResolutionError(format!(
                    "Failed to fetch package version {}: {}",
                    version_id, e
                ))
            })?;

        let (Some(package_id), Some(version)) = (report.package_id, report.version) else {
            return Err(Error::ResolutionError(format!(
                "No package identifier or version reported for {}",
                version_id
            )));
        };

        let record = PackageRecord {
            package_alias: self.aliases.resolve(&package_id),
            package_id,
            version_id: version_id.to_string(),
            package_version: version,
        };

        Ok((record, report.dependency_ids))
    }
}
