//! HTTP client for the catalog and plugin archives.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::plugin::{parse_catalog, Catalog};

use super::traits::{CatalogClient, PackageDownloader};
use super::{ManagerError, ManagerResult};

const USER_AGENT: &str = concat!("pluginrepo/", env!("CARGO_PKG_VERSION"));

/// Catalog location under a repository base URL.
pub fn catalog_url(base_url: &str) -> String {
    format!("{}/pluginmaster.json", base_url.trim_end_matches('/'))
}

/// Archive of the newest build of a plugin under a repository base URL.
pub fn archive_url(base_url: &str, internal_name: &str) -> String {
    format!(
        "{}/plugins/{}/latest.zip",
        base_url.trim_end_matches('/'),
        internal_name
    )
}

/// Blocking HTTP implementation of [`CatalogClient`] and [`PackageDownloader`].
///
/// Requests have no timeout unless one is configured; a stalled connection
/// blocks the calling thread.
#[derive(Clone)]
pub struct HttpRepositoryClient {
    client: Client,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for HttpRepositoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRepositoryClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpRepositoryClient {
    /// Create a client without a request timeout.
    pub fn new() -> ManagerResult<Self> {
        Self::with_timeout(None)
    }

    /// Create a client with an optional request timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> ManagerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ManagerError::Http {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    /// Configured request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> ManagerError {
        match self.timeout {
            Some(timeout) if e.is_timeout() => ManagerError::Timeout {
                url: url.to_string(),
                timeout_secs: timeout.as_secs(),
            },
            _ => ManagerError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            },
        }
    }

    fn get(&self, url: &str) -> ManagerResult<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.map_send_error(url, e))?;

        if !response.status().is_success() {
            return Err(ManagerError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }
}

impl CatalogClient for HttpRepositoryClient {
    fn fetch_catalog(&self, url: &str) -> ManagerResult<Catalog> {
        let content = self
            .get(url)?
            .text()
            .map_err(|e| self.map_send_error(url, e))?;

        parse_catalog(&content).map_err(|e| ManagerError::CatalogParseFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl PackageDownloader for HttpRepositoryClient {
    fn download(&self, url: &str, dest: &Path) -> ManagerResult<u64> {
        let mut response = self.get(url)?;

        let mut file = File::create(dest).map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| self.map_send_error(url, e))?;

        tracing::debug!(url, bytes, path = %dest.display(), "Downloaded archive");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert_eq!(
            catalog_url("https://plugins.example.com/"),
            "https://plugins.example.com/pluginmaster.json"
        );
        assert_eq!(
            archive_url("https://plugins.example.com", "PluginX"),
            "https://plugins.example.com/plugins/PluginX/latest.zip"
        );
    }

    #[test]
    fn test_client_has_no_timeout_by_default() {
        let client = HttpRepositoryClient::new().unwrap();
        assert_eq!(client.timeout(), None);
    }

    #[test]
    fn test_client_with_timeout() {
        let client = HttpRepositoryClient::with_timeout(Some(Duration::from_secs(60))).unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_unreachable_host_is_network_failure() {
        let client = HttpRepositoryClient::with_timeout(Some(Duration::from_secs(2))).unwrap();
        let err = client
            .fetch_catalog("http://127.0.0.1:9/pluginmaster.json")
            .unwrap_err();
        assert_eq!(err.kind(), super::super::ErrorKind::NetworkFailure);
    }

    // Note: Network-dependent tests live in integration tests with mock clients.
}
