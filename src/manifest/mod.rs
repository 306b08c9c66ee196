// src/manifest/mod.rs

//! Project manifest handling
//!
//! The manifest is an `sfdx-project.json` style document. Only two parts of it
//! are interpreted here:
//! - `packageDirectories[n].dependencies`: ordered `{package, versionNumber}` entries
//! - `packageAliases`: alias name to package identifier
//!
//! Everything else in the document is carried through untouched, including
//! key order.

mod aliases;

pub use aliases::AliasTable;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Default manifest file name in a project root
pub const DEFAULT_MANIFEST: &str = "sfdx-project.json";

const PACKAGE_DIRECTORIES: &str = "packageDirectories";
const DEPENDENCIES: &str = "dependencies";
const PACKAGE_ALIASES: &str = "packageAliases";
const DIRECTORY_PATH: &str = "path";

/// One entry of a package directory's dependency list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Alias or raw package identifier
    pub package: String,

    /// Pinned version; absent when the entry references a specific package version
    #[serde(
        rename = "versionNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version_number: Option<String>,

    /// Fields this tool does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestEntry {
    pub fn new(package: String, version_number: String) -> Self {
        Self {
            package,
            version_number: Some(version_number),
            extra: Map::new(),
        }
    }
}

/// A loaded project manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    document: Value,
    directory: usize,
    dependencies: Vec<ManifestEntry>,
    aliases: AliasTable,
}

impl Manifest {
    /// Read and validate a manifest file
    ///
    /// `directory` selects a package directory by its `path`; the first
    /// directory is used when it is `None`.
    pub fn load(path: &Path, directory: Option<&str>) -> Result<Self> {
        debug!("Loading manifest from {}", path.display());

        let text = fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read manifest {}: {}", path.display(), e))
        })?;

        Self::parse(&text, directory)
    }

    /// Parse and validate manifest text
    pub fn parse(text: &str, directory: Option<&str>) -> Result<Self> {
        let document: Value = serde_json::from_str(text)
            .map_err(|e| Error::ManifestParseError(format!("Invalid JSON: {}", e)))?;

        if !document.is_object() {
            return Err(Error::ManifestParseError(
                "Manifest root must be an object".to_string(),
            ));
        }

        let directories = document
            .get(PACKAGE_DIRECTORIES)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::ManifestParseError(format!("Missing '{}' array", PACKAGE_DIRECTORIES))
            })?;

        let index = match directory {
            Some(wanted) => directories
                .iter()
                .position(|d| d.get(DIRECTORY_PATH).and_then(Value::as_str) == Some(wanted))
                .ok_or_else(|| {
                    Error::ManifestParseError(format!(
                        "No package directory with path '{}'",
                        wanted
                    ))
                })?,
            None if directories.is_empty() => {
                return Err(Error::ManifestParseError(format!(
                    "'{}' is empty",
                    PACKAGE_DIRECTORIES
                )));
            }
            None => 0,
        };

        let dependencies = match directories[index].get(DEPENDENCIES) {
            Some(deps) => serde_json::from_value(deps.clone()).map_err(|e| {
                Error::ManifestParseError(format!("Invalid dependency list: {}", e))
            })?,
            None => Vec::new(),
        };

        let aliases = match document.get(PACKAGE_ALIASES) {
            Some(value) => AliasTable::from_json(value)?,
            None => AliasTable::new(),
        };

        Ok(Self {
            document,
            directory: index,
            dependencies,
            aliases,
        })
    }

    pub fn dependencies(&self) -> &[ManifestEntry] {
        &self.dependencies
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Path of the selected package directory, if it declares one
    pub fn directory_path(&self) -> Option<&str> {
        self.document
            .get(PACKAGE_DIRECTORIES)
            .and_then(|d| d.get(self.directory))
            .and_then(|d| d.get(DIRECTORY_PATH))
            .and_then(Value::as_str)
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<ManifestEntry>) {
        self.dependencies = dependencies;
    }

    pub fn set_aliases(&mut self, aliases: AliasTable) {
        self.aliases = aliases;
    }

    /// Turn a package reference into an identifier
    ///
    /// References naming a known alias map to that alias' identifier; anything
    /// else is assumed to already be an identifier.
    pub fn resolve_reference<'a>(&'a self, reference: &'a str) -> &'a str {
        self.aliases.id_for(reference).unwrap_or(reference)
    }

    /// Full document with the dependency list and alias table written back
    pub fn to_document(&self) -> Result<Value> {
        let mut document = self.document.clone();
        let dependencies = serde_json::to_value(&self.dependencies)?;

        if let Some(directory) = document
            .get_mut(PACKAGE_DIRECTORIES)
            .and_then(|d| d.get_mut(self.directory))
            .and_then(Value::as_object_mut)
            && (directory.contains_key(DEPENDENCIES) || !self.dependencies.is_empty())
        {
            directory.insert(DEPENDENCIES.to_string(), dependencies);
        }

        if let Some(root) = document.as_object_mut()
            && (root.contains_key(PACKAGE_ALIASES) || !self.aliases.is_empty())
        {
            root.insert(PACKAGE_ALIASES.to_string(), self.aliases.to_json());
        }

        Ok(document)
    }

    /// Serialize with four-space indentation
    pub fn to_json_string(&self) -> Result<String> {
        let document = self.to_document()?;

        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        document.serialize(&mut serializer)?;

        String::from_utf8(buffer)
            .map_err(|e| Error::IoError(format!("Serialized manifest is not UTF-8: {}", e)))
    }

    /// Write the manifest to `path` atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_json_string()?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        // Write to a temporary file next to the target first
        let mut temp = NamedTempFile::new_in(parent).map_err(|e| {
            Error::IoError(format!(
                "Failed to create temporary file in {}: {}",
                parent.display(),
                e
            ))
        })?;
        temp.write_all(contents.as_bytes())
            .map_err(|e| Error::IoError(format!("Failed to write manifest: {}", e)))?;

        // Temp files are created 0600; keep the mode of the file being replaced
        if let Ok(metadata) = fs::metadata(path) {
            temp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| {
                    Error::IoError(format!(
                        "Failed to set permissions on temporary manifest: {}",
                        e
                    ))
                })?;
        }

        temp.persist(path).map_err(|e| {
            Error::IoError(format!("Failed to replace {}: {}", path.display(), e.error))
        })?;

        info!("Wrote manifest to {}", path.display());
        Ok(())
    }
}

impl FromStr for Manifest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, None)
    }
}
