// src/update.rs

//! Dependency update workflow
//!
//! Loads the manifest, resolves the root package's dependency graph,
//! reconciles it with the manifest and writes the result. Nothing is written
//! unless resolution and reconciliation both succeed.

use crate::error::{Result, Warning};
use crate::manifest::Manifest;
use crate::repository::DistributionService;
use crate::resolver::{AliasResolver, GraphWalker, PackageRecord, PackageUpdate, reconcile};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// What to update and how
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Root package version identifier, or an alias naming one
    pub package: String,
    pub manifest_path: PathBuf,
    /// Package directory path; the first directory when `None`
    pub directory: Option<String>,
    pub max_concurrency: usize,
    /// Resolve and reconcile without writing the manifest
    pub dry_run: bool,
}

impl UpdateOptions {
    pub fn new(package: String, manifest_path: PathBuf) -> Self {
        Self {
            package,
            manifest_path,
            directory: None,
            max_concurrency: crate::config::DEFAULT_JOBS,
            dry_run: false,
        }
    }
}

/// Summary of an update run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReport {
    pub root: PackageRecord,
    pub updates: Vec<PackageUpdate>,
    pub added_aliases: Vec<(String, String)>,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
    /// Whether reconciliation changed the manifest contents
    pub changed: bool,
    /// Whether the manifest file was rewritten
    pub written: bool,
}

/// Bring the manifest's dependencies up to date with the root package
pub fn update_dependencies(
    service: &dyn DistributionService,
    options: &UpdateOptions,
) -> Result<UpdateReport> {
    // A malformed manifest aborts before any service request is made
    let mut manifest = Manifest::load(&options.manifest_path, options.directory.as_deref())?;
    info!(
        "Updating package directory {} in {}",
        manifest.directory_path().unwrap_or("<unnamed>"),
        options.manifest_path.display()
    );

    let root_id = manifest.resolve_reference(&options.package).to_string();
    if root_id != options.package {
        info!("Using {} for package alias {}", root_id, options.package);
    }

    let aliases = AliasResolver::new(service, manifest.aliases().clone());
    let walker = GraphWalker::new(service, &aliases, options.max_concurrency)?;
    let graph = walker.resolve(&root_id)?;

    let result = reconcile(&graph, manifest.dependencies(), &aliases);
    let changed = result.is_changed() || result.dependencies != manifest.dependencies();

    manifest.set_dependencies(result.dependencies);
    manifest.set_aliases(result.aliases);

    let written = if !changed {
        info!("Manifest is already up to date");
        false
    } else if options.dry_run {
        info!(
            "Dry run: not writing {}",
            options.manifest_path.display()
        );
        false
    } else {
        manifest.save(&options.manifest_path)?;
        true
    };

    Ok(UpdateReport {
        root: graph.root().clone(),
        updates: result.updates,
        added_aliases: result.added_aliases,
        warnings: aliases.warnings(),
        changed,
        written,
    })
}
