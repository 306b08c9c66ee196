// src/repository/tooling.rs

//! HTTP client for the tooling query API
//!
//! Package versions are read from `Package2Version` and their dependencies
//! from `SubscriberPackageVersion`; the alias fallback listing comes from
//! `Package2`. Requests are not retried: a failed or timed out request is
//! reported straight back to the caller.

use super::{DistributionService, PackageListing, ReportDetail, VersionReport};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// One page of query results
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse<T> {
    records: Vec<T>,
    #[serde(default)]
    next_records_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Package2VersionRow {
    package2_id: Option<String>,
    major_version: Option<u64>,
    minor_version: Option<u64>,
    patch_version: Option<u64>,
    build_number: Option<u64>,
}

impl Package2VersionRow {
    fn version(&self) -> Option<String> {
        Some(format!(
            "{}.{}.{}.{}",
            self.major_version?,
            self.minor_version?,
            self.patch_version?,
            self.build_number?
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubscriberPackageVersionRow {
    dependencies: Option<DependencyList>,
}

#[derive(Debug, Deserialize)]
struct DependencyList {
    #[serde(default)]
    ids: Vec<DependencyRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DependencyRef {
    subscriber_package_version_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Package2Row {
    id: String,
    name: String,
}

/// Tooling API client bound to one authenticated session
pub struct ToolingClient {
    client: Client,
    base_url: String,
    api_version: String,
    access_token: String,
}

impl ToolingClient {
    /// Create a new client from validated settings
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            api_version: config.api_version.trim().to_string(),
            access_token: config.access_token.clone(),
        })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/services/data/v{}/tooling/query",
            self.base_url, self.api_version
        )
    }

    /// Run a tooling query, following pagination until every record is read
    fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        debug!("Tooling query: {}", soql);

        let request = self.client.get(self.query_url()).query(&[("q", soql)]);
        let mut page: QueryResponse<T> = self.send(request)?;
        let mut records = std::mem::take(&mut page.records);

        while let Some(next) = page.next_records_url.take() {
            let url = format!("{}{}", self.base_url, next);
            page = self.send(self.client.get(&url))?;
            records.append(&mut page.records);
        }

        Ok(records)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    Error::RequestError(format!("Request timed out: {}", e))
                } else {
                    Error::RequestError(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(Error::RequestError(format!(
                "HTTP {} from {}",
                response.status(),
                response.url()
            )));
        }

        response
            .json()
            .map_err(|e| Error::RequestError(format!("Failed to parse response JSON: {}", e)))
    }
}

impl DistributionService for ToolingClient {
    fn package_version(&self, version_id: &str, detail: ReportDetail) -> Result<VersionReport> {
        let version_id = validate_id(version_id)?;

        let rows: Vec<Package2VersionRow> = self.query(&format!(
            "SELECT Package2Id, MajorVersion, MinorVersion, PatchVersion, BuildNumber \
             FROM Package2Version WHERE SubscriberPackageVersionId = '{}'",
            version_id
        ))?;

        let dependencies = match detail {
            ReportDetail::Full => self
                .query::<SubscriberPackageVersionRow>(&format!(
                    "SELECT Dependencies FROM SubscriberPackageVersion WHERE Id = '{}'",
                    version_id
                ))?
                .into_iter()
                .next(),
            ReportDetail::Shallow => None,
        };

        Ok(build_report(rows.into_iter().next(), dependencies))
    }

    fn list_packages(&self) -> Result<Vec<PackageListing>> {
        let rows: Vec<Package2Row> = self.query("SELECT Id, Name FROM Package2")?;
        info!("Service lists {} packages", rows.len());

        Ok(rows
            .into_iter()
            .map(|row| PackageListing {
                id: row.id,
                name: row.name,
            })
            .collect())
    }
}

fn build_report(
    version: Option<Package2VersionRow>,
    dependencies: Option<SubscriberPackageVersionRow>,
) -> VersionReport {
    let Some(version) = version else {
        return VersionReport::default();
    };

    let dependency_ids = dependencies
        .and_then(|row| row.dependencies)
        .map(|list| {
            list.ids
                .into_iter()
                .map(|d| d.subscriber_package_version_id)
                .collect()
        })
        .unwrap_or_default();

    VersionReport {
        version: version.version(),
        package_id: version.package2_id,
        dependency_ids,
    }
}

/// Identifiers are embedded in queries, so only plain alphanumerics are allowed
fn validate_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::ResolutionError(format!(
            "Invalid package version identifier: '{}'",
            id
        )));
    }
    Ok(id)
}
