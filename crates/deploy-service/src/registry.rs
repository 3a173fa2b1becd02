//! Container registry client: published image tags for a package

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use deploy_common::{LatestImages, Package, Result};
use reqwest::header;
use serde::Deserialize;
use tracing::debug;

use crate::github::{upstream, REQUEST_TIMEOUT};

const ACCEPT_V3_JSON: &str = "application/vnd.github.v3+json";

#[derive(Debug, Deserialize)]
struct TagList {
    /// Absent or null for packages with no published tags
    tags: Option<Vec<String>>,
}

/// Client for the container registry's tag-listing API. The registry accepts
/// the SCM token base64-encoded as its bearer credential.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    registry_url: String,
    token: String,
}

impl RegistryClient {
    pub fn new(registry_url: impl Into<String>, github_token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(upstream)?;

        Ok(Self {
            http,
            registry_url: registry_url.into(),
            token: STANDARD.encode(github_token),
        })
    }

    /// List all tags for the package
    async fn tags(&self, package: &Package) -> Result<Vec<String>> {
        let url = format!("{}/v2/{}/tags/list", self.registry_url, package);
        debug!("Fetching image tags: {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT_V3_JSON)
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if !status.is_success() {
            return Err(deploy_common::Error::Upstream(format!(
                "{} returned {}",
                url, status
            )));
        }

        let list: TagList = response.json().await.map_err(upstream)?;
        Ok(list.tags.unwrap_or_default())
    }

    /// Latest published version tag and commit-hash tag for the package.
    /// Either category may be empty; that is not an error.
    pub async fn latest_images(&self, package: &Package) -> Result<LatestImages> {
        let tags = self.tags(package).await?;
        Ok(LatestImages::from_tags(&tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_list_parses_present_tags() {
        let list: TagList = serde_json::from_str(r#"{"tags": ["v1", "v2"]}"#).unwrap();
        assert_eq!(list.tags, Some(vec!["v1".to_string(), "v2".to_string()]));
    }

    #[test]
    fn test_tag_list_missing_field_is_none() {
        let list: TagList = serde_json::from_str(r#"{"name": "org/user-service"}"#).unwrap();
        assert_eq!(list.tags, None);
    }

    #[test]
    fn test_tag_list_null_field_is_none() {
        let list: TagList = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert_eq!(list.tags, None);
    }
}

