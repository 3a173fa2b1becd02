//! SCM host client: commits, cluster-config contents, workflow dispatch
//!
//! One reqwest client per instance, bearer-token auth, GitHub media types.
//! Every read is a single idempotent call with no retries; a failed call
//! fails the enclosing reconciliation.

use deploy_common::{
    ClusterDeployment, DeploymentVersion, Error, LatestCommit, Repository, Result,
};
use reqwest::{header, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_V3_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw+json";

/// Per-request timeout; a hung upstream maps to the same failure path as any
/// other transport error.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn upstream(err: reqwest::Error) -> Error {
    Error::Upstream(err.to_string())
}

/// Which sides of the cluster-config lookup to perform. A skipped side
/// short-circuits to an absent result pair without a network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterLookup {
    pub development: bool,
    pub production: bool,
}

impl ClusterLookup {
    pub fn full() -> Self {
        Self { development: true, production: true }
    }

    pub fn development_only() -> Self {
        Self { development: true, production: false }
    }
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: CommitActor,
}

#[derive(Debug, Deserialize)]
struct CommitActor {
    date: String,
}

/// Client for the SCM host's REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(upstream)?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            token: token.into(),
        })
    }

    /// Most recent commit on the repository's branch
    pub async fn latest_commit(&self, repo: &Repository) -> Result<LatestCommit> {
        let url = format!("{}/repos/{}/commits/{}", self.api_url, repo, repo.branch);
        debug!("Fetching latest commit: {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT_V3_JSON)
            .query(&[("page", "1"), ("per_page", "1")])
            .send()
            .await
            .map_err(upstream)?;

        let response = ensure_success(response)?;
        let body: CommitResponse = response.json().await.map_err(upstream)?;

        Ok(LatestCommit {
            commit: body.sha,
            date: body.commit.committer.date,
        })
    }

    /// Raw file content at the repository's branch
    async fn file_content(&self, repo: &Repository, path: &str) -> Result<String> {
        let url = format!("{}/repos/{}/contents/{}", self.api_url, repo, path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT_RAW)
            .query(&[("ref", repo.branch.as_str())])
            .send()
            .await
            .map_err(upstream)?;

        let response = ensure_success(response)?;
        response.text().await.map_err(upstream)
    }

    /// Committer date of the most recent commit touching `path`, if any
    async fn latest_commit_date_for_path(
        &self,
        repo: &Repository,
        path: &str,
    ) -> Result<Option<String>> {
        let url = format!("{}/repos/{}/commits", self.api_url, repo);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT_RAW)
            .query(&[("path", path), ("page", "1"), ("per_page", "1")])
            .send()
            .await
            .map_err(upstream)?;

        let response = ensure_success(response)?;
        let commits: Vec<CommitResponse> = response.json().await.map_err(upstream)?;

        Ok(commits.into_iter().next().map(|c| c.commit.committer.date))
    }

    /// Deployed tag and deploy date for one environment's manifest. Tag and
    /// date are independent calls and run concurrently.
    async fn environment_version(
        &self,
        repo: &Repository,
        path: &str,
        enabled: bool,
    ) -> Result<(Option<String>, Option<String>)> {
        if !enabled {
            return Ok((None, None));
        }

        let (content, date) = tokio::try_join!(
            self.file_content(repo, path),
            self.latest_commit_date_for_path(repo, path),
        )?;

        Ok((extract_new_tag(&content), date))
    }

    /// Versions currently recorded in the cluster-config repository for both
    /// environments, honoring the skip flags in `lookup`.
    pub async fn cluster_versions(
        &self,
        cluster: &ClusterDeployment,
        lookup: ClusterLookup,
    ) -> Result<DeploymentVersion> {
        let repo = &cluster.repository;

        let development_path = cluster.development_path();
        let production_path = cluster.production_path();
        let (development, production) = tokio::try_join!(
            self.environment_version(repo, &development_path, lookup.development),
            self.environment_version(repo, &production_path, lookup.production),
        )?;

        Ok(DeploymentVersion {
            development_version: development.0,
            development_date: development.1,
            production_version: production.0,
            production_date: production.1,
        })
    }

    /// Trigger a workflow run against the repository's branch. Only HTTP 204
    /// counts as accepted; any other status reports `false`. Transport
    /// failures are the only error path.
    pub async fn dispatch_workflow(&self, repo: &Repository, workflow: &str) -> Result<bool> {
        let url = format!(
            "{}/repos/{}/actions/workflows/{}/dispatches",
            self.api_url, repo, workflow
        );
        debug!("Dispatching workflow: {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT_JSON)
            .json(&serde_json::json!({ "ref": repo.branch }))
            .send()
            .await
            .map_err(upstream)?;

        Ok(response.status() == StatusCode::NO_CONTENT)
    }
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Upstream(format!(
            "{} returned {}",
            response.url(),
            status
        )))
    }
}

/// Extract the deployed image tag from a kustomization manifest: the word
/// following the literal `newTag: ` marker. No marker means no recorded
/// deployment, which is not an error.
pub fn extract_new_tag(content: &str) -> Option<String> {
    const MARKER: &str = "newTag: ";

    let start = content.find(MARKER)? + MARKER.len();
    let tag: String = content[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}
