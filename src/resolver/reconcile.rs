// src/resolver/reconcile.rs

//! Manifest reconciliation
//!
//! Merges a resolved dependency graph into a manifest's dependency list.
//! Entries for resolved packages come first, in graph order with the root
//! last; every other manifest entry follows unchanged in its original order.

use super::alias::AliasResolver;
use super::walker::{PackageRecord, ResolvedGraph};
use crate::manifest::{AliasTable, ManifestEntry};
use crate::version::{is_newer, pin_latest};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// A version change applied to the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageUpdate {
    pub package_id: String,
    pub package_alias: String,
    /// Version reported by the service
    pub package_version: String,
    /// Version previously pinned; `None` for newly added dependencies
    pub previous_version: Option<String>,
    /// Version written to the manifest
    pub pinned_version: String,
}

impl PackageUpdate {
    pub fn is_addition(&self) -> bool {
        self.previous_version.is_none()
    }
}

/// Outcome of reconciling a graph against a manifest
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// New dependency list for the manifest
    pub dependencies: Vec<ManifestEntry>,
    /// Changes applied, in the order they were decided
    pub updates: Vec<PackageUpdate>,
    /// Alias table including mappings registered during this run
    pub aliases: AliasTable,
    /// Mappings registered during this run
    pub added_aliases: Vec<(String, String)>,
}

impl Reconciliation {
    pub fn is_changed(&self) -> bool {
        !self.updates.is_empty() || !self.added_aliases.is_empty()
    }
}

/// Reconcile `graph` against the manifest dependency list `current`
///
/// A resolved package matches a manifest entry whose `package` is the
/// record's alias; failing that, an entry naming the package or the fetched
/// package version identifier directly or through another alias, or a
/// `Name@x.y.z-n` version alias of the record's alias. Matching entries are bumped to the
/// `LATEST` form of the resolved version when it is newer, otherwise left
/// as is. Unmatched packages are appended as new entries.
pub fn reconcile(
    graph: &ResolvedGraph,
    current: &[ManifestEntry],
    aliases: &AliasResolver<'_>,
) -> Reconciliation {
    let table = aliases.table();
    let mut consumed = vec![false; current.len()];
    let mut output: Vec<ManifestEntry> =
        Vec::with_capacity(current.len() + graph.dependencies().len() + 1);
    let mut emitted: HashMap<String, usize> = HashMap::new();
    let mut updates = Vec::new();

    for record in graph.iter() {
        // Same package seen earlier in the graph: the later record gets the final say
        if let Some(&idx) = emitted.get(&record.package_alias) {
            updates.extend(apply_candidate(&mut output[idx], record));
            continue;
        }

        let position = find_entry(current, &consumed, record, &table);

        let idx = output.len();
        match position {
            Some(pos) => {
                consumed[pos] = true;
                let mut entry = current[pos].clone();
                updates.extend(apply_candidate(&mut entry, record));
                output.push(entry);
            }
            None => {
                let alias = if record.package_alias == record.package_id {
                    aliases.resolve(&record.package_id)
                } else {
                    record.package_alias.clone()
                };
                let pinned = pin_latest(&record.package_version);
                info!("Adding dependency {} at version {}", alias, pinned);

                updates.push(PackageUpdate {
                    package_id: record.package_id.clone(),
                    package_alias: alias.clone(),
                    package_version: record.package_version.clone(),
                    previous_version: None,
                    pinned_version: pinned.clone(),
                });
                emitted.insert(alias.clone(), idx);
                output.push(ManifestEntry::new(alias, pinned));
            }
        }
        emitted.insert(record.package_alias.clone(), idx);
    }

    let untouched = current
        .iter()
        .zip(&consumed)
        .filter(|(_, consumed)| !**consumed)
        .map(|(entry, _)| entry.clone());
    output.extend(untouched);

    Reconciliation {
        dependencies: output,
        updates,
        aliases: aliases.table(),
        added_aliases: aliases.added(),
    }
}

fn find_entry(
    current: &[ManifestEntry],
    consumed: &[bool],
    record: &PackageRecord,
    table: &AliasTable,
) -> Option<usize> {
    let available = |pos: &usize| !consumed[*pos];

    (0..current.len())
        .filter(available)
        .find(|&pos| current[pos].package == record.package_alias)
        .or_else(|| {
            (0..current.len()).filter(available).find(|&pos| {
                let package = current[pos].package.as_str();
                let target = table.id_for(package).unwrap_or(package);
                target == record.package_id
                    || target == record.version_id
                    || package
                        .split_once('@')
                        .is_some_and(|(name, _)| name == record.package_alias)
            })
        })
}

/// Bump `entry` to the record's version if it is newer
fn apply_candidate(entry: &mut ManifestEntry, record: &PackageRecord) -> Option<PackageUpdate> {
    let Some(current) = entry.version_number.as_deref() else {
        debug!("{} references a specific package version, leaving it", entry.package);
        return None;
    };

    debug!(
        "Comparing package {}: original is {} and needed is {}",
        entry.package, current, record.package_version
    );

    if !is_newer(current, &record.package_version) {
        return None;
    }

    let previous = current.to_string();
    let pinned = pin_latest(&record.package_version);
    info!("Updating {} to version {}", entry.package, pinned);
    entry.version_number = Some(pinned.clone());

    Some(PackageUpdate {
        package_id: record.package_id.clone(),
        package_alias: entry.package.clone(),
        package_version: record.package_version.clone(),
        previous_version: Some(previous),
        pinned_version: pinned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::repository::{DistributionService, PackageListing, ReportDetail, VersionReport};

    struct NoListing;

    impl DistributionService for NoListing {
        fn package_version(&self, _: &str, _: ReportDetail) -> Result<VersionReport> {
            Ok(VersionReport::default())
        }

        fn list_packages(&self) -> Result<Vec<PackageListing>> {
            Ok(Vec::new())
        }
    }

    fn record(id: &str, alias: &str, version: &str) -> PackageRecord {
        PackageRecord {
            package_id: id.to_string(),
            version_id: format!("04t{}", alias),
            package_alias: alias.to_string(),
            package_version: version.to_string(),
        }
    }

    fn entry(package: &str, version: &str) -> ManifestEntry {
        ManifestEntry::new(package.to_string(), version.to_string())
    }

    fn table() -> AliasTable {
        let mut table = AliasTable::new();
        table.insert("App".to_string(), "0HoApp".to_string());
        table.insert("Core".to_string(), "0HoCore".to_string());
        table.insert("Util".to_string(), "0HoUtil".to_string());
        table.insert("Other".to_string(), "0HoOther".to_string());
        table
    }

    #[test]
    fn test_graph_precondition_root_last() {
        let graph = ResolvedGraph::new(
            vec![record("0HoCore", "Core", "1.3.0")],
            record("0HoApp", "App", "2.0.0"),
        );
        assert_eq!(graph.iter().last(), Some(graph.root()));
    }

    #[test]
    fn test_outdated_entry_updated_only() {
        let service = NoListing;
        let resolver = AliasResolver::new(&service, table());
        let current = vec![
            entry("Other", "4.0.LATEST"),
            entry("Core", "1.2.LATEST"),
            entry("Util", "2.0.LATEST"),
        ];
        let graph = ResolvedGraph::new(Vec::new(), record("0HoCore", "Core", "1.3.0"));

        let result = reconcile(&graph, &current, &resolver);

        assert_eq!(
            result.dependencies,
            vec![
                entry("Core", "1.3.LATEST"),
                entry("Other", "4.0.LATEST"),
                entry("Util", "2.0.LATEST"),
            ]
        );
        assert_eq!(result.updates.len(), 1);
        assert_eq!(result.updates[0].previous_version.as_deref(), Some("1.2.LATEST"));
        assert!(result.added_aliases.is_empty());
    }

    #[test]
    fn test_current_entry_left_untouched() {
        let service = NoListing;
        let resolver = AliasResolver::new(&service, table());
        let current = vec![entry("Core", "1.3.LATEST")];
        let graph = ResolvedGraph::new(Vec::new(), record("0HoCore", "Core", "1.3.9"));

        let result = reconcile(&graph, &current, &resolver);

        assert_eq!(result.dependencies, current);
        assert!(result.updates.is_empty());
        assert!(!result.is_changed());
    }

    #[test]
    fn test_new_dependency_appended_with_alias() {
        let service = NoListing;
        let resolver = AliasResolver::new(&service, table());
        let current = vec![entry("Core", "1.3.LATEST")];
        let graph = ResolvedGraph::new(
            vec![record("0HoNew", "0HoNew", "0.4.1")],
            record("0HoCore", "Core", "1.3.0"),
        );

        let result = reconcile(&graph, &current, &resolver);

        assert_eq!(
            result.dependencies,
            vec![entry("0HoNew", "0.4.LATEST"), entry("Core", "1.3.LATEST")]
        );
        assert_eq!(result.updates.len(), 1);
        assert!(result.updates[0].is_addition());
        assert_eq!(
            result.added_aliases,
            vec![("0HoNew".to_string(), "0HoNew".to_string())]
        );
        assert_eq!(result.aliases.id_for("0HoNew"), Some("0HoNew"));
    }

    #[test]
    fn test_new_dependency_with_known_alias_adds_no_mapping() {
        let service = NoListing;
        let resolver = AliasResolver::new(&service, table());
        let graph = ResolvedGraph::new(
            vec![record("0HoUtil", "Util", "2.2.0")],
            record("0HoApp", "App", "1.0.0"),
        );

        let result = reconcile(&graph, &[], &resolver);

        assert_eq!(
            result.dependencies,
            vec![entry("Util", "2.2.LATEST"), entry("App", "1.0.LATEST")]
        );
        assert!(result.added_aliases.is_empty());
    }

    #[test]
    fn test_unrelated_entries_preserved_in_order() {
        let service = NoListing;
        let resolver = AliasResolver::new(&service, table());
        let mut pinned = ManifestEntry {
            package: "Pinned@1.0.0-1".to_string(),
            version_number: None,
            extra: serde_json::Map::new(),
        };
        pinned
            .extra
            .insert("note".to_string(), serde_json::json!("keep"));
        let current = vec![
            entry("Zeta", "9.0.LATEST"),
            pinned.clone(),
            entry("Core", "1.0.LATEST"),
            entry("Alpha", "1.0.LATEST"),
        ];
        let graph = ResolvedGraph::new(Vec::new(), record("0HoCore", "Core", "1.1.0"));

        let result = reconcile(&graph, &current, &resolver);

        assert_eq!(
            result.dependencies,
            vec![
                entry("Core", "1.1.LATEST"),
                entry("Zeta", "9.0.LATEST"),
                pinned,
                entry("Alpha", "1.0.LATEST"),
            ]
        );
    }

    #[test]
    fn test_entry_matched_by_identifier() {
        let service = NoListing;
        let resolver = AliasResolver::new(&service, table());
        let current = vec![entry("0HoCore", "1.0.LATEST"), entry("CoreAlias", "1.0.LATEST")];
        let graph = ResolvedGraph::new(Vec::new(), record("0HoCore", "Core", "1.2.0"));

        let result = reconcile(&graph, &current, &resolver);

        assert_eq!(
            result.dependencies,
            vec![entry("0HoCore", "1.2.LATEST"), entry("CoreAlias", "1.0.LATEST")]
        );
    }

    #[test]
    fn test_versionless_entry_not_rewritten() {
        let service = NoListing;
        let resolver = AliasResolver::new(&service, table());
        let current = vec![ManifestEntry {
            package: "Core".to_string(),
            version_number: None,
            extra: serde_json::Map::new(),
        }];
        let graph = ResolvedGraph::new(Vec::new(), record("0HoCore", "Core", "9.9.9"));

        let result = reconcile(&graph, &current, &resolver);

        assert_eq!(result.dependencies, current);
        assert!(result.updates.is_empty());
    }

    #[test]
    fn test_version_alias_entry_not_duplicated() {
        let service = NoListing;
        let mut aliases = table();
        aliases.insert("Core@1.2.0-1".to_string(), "04tCore1".to_string());
        let resolver = AliasResolver::new(&service, aliases);
        let pinned = ManifestEntry {
            package: "Core@1.2.0-1".to_string(),
            version_number: None,
            extra: serde_json::Map::new(),
        };
        let current = vec![pinned.clone(), entry("App", "1.0.LATEST")];
        let mut core = record("0HoCore", "Core", "1.4.0.2");
        core.version_id = "04tCore1".to_string();
        let graph = ResolvedGraph::new(vec![core], record("0HoApp", "App", "1.0.0"));

        let result = reconcile(&graph, &current, &resolver);

        assert_eq!(result.dependencies, current);
        assert!(result.updates.is_empty());
    }

    #[test]
    fn test_version_alias_of_other_build_not_duplicated() {
        let service = NoListing;
        let mut aliases = table();
        aliases.insert("Core@1.2.0-1".to_string(), "04tCore1".to_string());
        let resolver = AliasResolver::new(&service, aliases);
        let pinned = ManifestEntry {
            package: "Core@1.2.0-1".to_string(),
            version_number: None,
            extra: serde_json::Map::new(),
        };
        let current = vec![pinned.clone()];
        let mut core = record("0HoCore", "Core", "1.4.0.2");
        core.version_id = "04tCore2".to_string();
        let graph = ResolvedGraph::new(Vec::new(), core);

        let result = reconcile(&graph, &current, &resolver);

        let packages: Vec<&str> = result
            .dependencies
            .iter()
            .map(|e| e.package.as_str())
            .collect();
        assert_eq!(packages, vec!["Core@1.2.0-1"]);
    }

    #[test]
    fn test_root_decides_after_dependencies() {
        let service = NoListing;
        let resolver = AliasResolver::new(&service, table());
        let current = vec![entry("Core", "1.0.LATEST")];
        let graph = ResolvedGraph::new(
            vec![record("0HoCore", "Core", "1.4.0")],
            record("0HoCore", "Core", "1.2.0"),
        );

        let result = reconcile(&graph, &current, &resolver);

        // The root's older version must not roll back the dependency's bump
        assert_eq!(result.dependencies, vec![entry("Core", "1.4.LATEST")]);
        assert_eq!(result.updates.len(), 1);
    }

    #[test]
    fn test_duplicate_new_package_emitted_once() {
        let service = NoListing;
        let resolver = AliasResolver::new(&service, table());
        let graph = ResolvedGraph::new(
            vec![
                record("0HoUtil", "Util", "2.0.0"),
                record("0HoUtil", "Util", "2.3.0"),
            ],
            record("0HoApp", "App", "1.0.0"),
        );

        let result = reconcile(&graph, &[], &resolver);

        assert_eq!(
            result.dependencies,
            vec![entry("Util", "2.3.LATEST"), entry("App", "1.0.LATEST")]
        );
    }
}
