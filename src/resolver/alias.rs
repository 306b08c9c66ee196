// src/resolver/alias.rs

//! Package identifier to alias resolution
//!
//! Lookup order:
//! 1. The manifest's alias table
//! 2. The service's package listing (the package name becomes a new alias)
//! 3. The identifier itself, with an `AliasNotFound` warning
//!
//! Steps 2 and 3 register a mapping in the table. The table is shared by the
//! concurrent dependency fetches, so every registration re-checks the table
//! under its lock and an identifier is registered at most once per run.

use crate::error::Warning;
use crate::manifest::AliasTable;
use crate::repository::{DistributionService, PackageListing};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

pub struct AliasResolver<'a> {
    service: &'a dyn DistributionService,
    table: Mutex<AliasTable>,
    /// Service listing, fetched on first miss; empty if the fetch failed
    listing: Mutex<Option<Vec<PackageListing>>>,
    added: Mutex<Vec<(String, String)>>,
    warnings: Mutex<Vec<Warning>>,
}

impl<'a> AliasResolver<'a> {
    pub fn new(service: &'a dyn DistributionService, table: AliasTable) -> Self {
        Self {
            service,
            table: Mutex::new(table),
            listing: Mutex::new(None),
            added: Mutex::new(Vec::new()),
            warnings: Mutex::new(Vec::new()),
        }
    }

    /// Resolve the alias for a package identifier
    ///
    /// Never fails: the identifier is used as its own alias when nothing
    /// better is known.
    pub fn resolve(&self, package_id: &str) -> String {
        if let Some(alias) = lock(&self.table).alias_for(package_id) {
            return alias.to_string();
        }

        // Network lookup happens outside the table lock
        let discovered = self.lookup_listing(package_id);

        let mut table = lock(&self.table);
        if let Some(alias) = table.alias_for(package_id) {
            return alias.to_string();
        }

        let alias = match discovered {
            Some(name) if !table.contains_alias(&name) => {
                info!("Discovered alias {} for package {}", name, package_id);
                name
            }
            other => {
                if let Some(name) = other {
                    warn!(
                        "Alias {} is already bound to another package, using {} as its own alias",
                        name, package_id
                    );
                } else {
                    warn!("Could not find an alias for package {}", package_id);
                }
                lock(&self.warnings).push(Warning::AliasNotFound {
                    package_id: package_id.to_string(),
                });
                package_id.to_string()
            }
        };

        table.insert(alias.clone(), package_id.to_string());
        lock(&self.added).push((alias.clone(), package_id.to_string()));
        alias
    }

    fn lookup_listing(&self, package_id: &str) -> Option<String> {
        let mut listing = lock(&self.listing);

        if listing.is_none() {
            debug!("Fetching package listing for alias lookup");
            let packages = match self.service.list_packages() {
                Ok(packages) => packages,
                Err(e) => {
                    warn!("Failed to fetch package listing: {}", e);
                    Vec::new()
                }
            };
            *listing = Some(packages);
        }

        listing
            .as_ref()
            .and_then(|packages| packages.iter().find(|p| p.id == package_id))
            .map(|p| p.name.clone())
    }

    /// Snapshot of the alias table including every registration so far
    pub fn table(&self) -> AliasTable {
        lock(&self.table).clone()
    }

    /// Mappings registered during this run, in registration order
    pub fn added(&self) -> Vec<(String, String)> {
        lock(&self.added).clone()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        lock(&self.warnings).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::repository::{ReportDetail, VersionReport};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ListingService {
        packages: Vec<PackageListing>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ListingService {
        fn new(packages: &[(&str, &str)]) -> Self {
            Self {
                packages: packages
                    .iter()
                    .map(|(id, name)| PackageListing {
                        id: id.to_string(),
                        name: name.to_string(),
                    })
                    .collect(),
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DistributionService for ListingService {
        fn package_version(&self, _: &str, _: ReportDetail) -> Result<VersionReport> {
            Ok(VersionReport::default())
        }

        fn list_packages(&self) -> Result<Vec<PackageListing>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::RequestError("HTTP 500".to_string()));
            }
            Ok(self.packages.clone())
        }
    }

    fn table(entries: &[(&str, &str)]) -> AliasTable {
        let mut table = AliasTable::new();
        for (alias, id) in entries {
            table.insert(alias.to_string(), id.to_string());
        }
        table
    }

    #[test]
    fn test_known_alias_skips_service() {
        let service = ListingService::new(&[]);
        let resolver = AliasResolver::new(&service, table(&[("Core", "0Ho1")]));

        assert_eq!(resolver.resolve("0Ho1"), "Core");
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert!(resolver.added().is_empty());
    }

    #[test]
    fn test_listing_fallback_registers_alias() {
        let service = ListingService::new(&[("0Ho2", "Billing")]);
        let resolver = AliasResolver::new(&service, AliasTable::new());

        assert_eq!(resolver.resolve("0Ho2"), "Billing");
        assert_eq!(resolver.table().id_for("Billing"), Some("0Ho2"));
        assert_eq!(
            resolver.added(),
            vec![("Billing".to_string(), "0Ho2".to_string())]
        );
        assert!(resolver.warnings().is_empty());
    }

    #[test]
    fn test_identifier_fallback_warns() {
        let service = ListingService::new(&[("0Ho2", "Billing")]);
        let resolver = AliasResolver::new(&service, AliasTable::new());

        assert_eq!(resolver.resolve("0Ho9"), "0Ho9");
        assert_eq!(resolver.table().id_for("0Ho9"), Some("0Ho9"));
        assert_eq!(
            resolver.warnings(),
            vec![Warning::AliasNotFound {
                package_id: "0Ho9".to_string()
            }]
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let service = ListingService::new(&[("0Ho2", "Billing")]);
        let resolver = AliasResolver::new(&service, AliasTable::new());

        let first = resolver.resolve("0Ho2");
        let second = resolver.resolve("0Ho2");
        assert_eq!(first, second);
        assert_eq!(resolver.added().len(), 1);
        assert_eq!(resolver.table().len(), 1);

        resolver.resolve("0Ho9");
        resolver.resolve("0Ho9");
        assert_eq!(resolver.added().len(), 2);
        assert_eq!(resolver.warnings().len(), 1);
    }

    #[test]
    fn test_listing_fetched_once() {
        let service = ListingService::new(&[]);
        let resolver = AliasResolver::new(&service, AliasTable::new());

        resolver.resolve("0Ho1");
        resolver.resolve("0Ho2");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listing_failure_is_not_fatal() {
        let mut service = ListingService::new(&[("0Ho2", "Billing")]);
        service.fail = true;
        let resolver = AliasResolver::new(&service, AliasTable::new());

        assert_eq!(resolver.resolve("0Ho2"), "0Ho2");
        assert_eq!(resolver.warnings().len(), 1);
    }

    #[test]
    fn test_taken_name_falls_back_to_identifier() {
        let service = ListingService::new(&[("0Ho2", "Core")]);
        let resolver = AliasResolver::new(&service, table(&[("Core", "0Ho1")]));

        assert_eq!(resolver.resolve("0Ho2"), "0Ho2");
        assert_eq!(resolver.table().id_for("Core"), Some("0Ho1"));
    }

    #[test]
    fn test_concurrent_resolution_registers_once() {
        let service = ListingService::new(&[("0Ho2", "Billing")]);
        let resolver = AliasResolver::new(&service, AliasTable::new());

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| assert_eq!(resolver.resolve("0Ho2"), "Billing"));
            }
        });

        assert_eq!(resolver.added().len(), 1);
        assert_eq!(resolver.table().len(), 1);
    }
}
