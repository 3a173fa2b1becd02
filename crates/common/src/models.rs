//! Domain models shared across the deployment manager

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::format::short_sha;

/// A source repository on the SCM host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A published container image package in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub username: String,
    pub image: String,
}

impl Package {
    /// Registry package names are lowercase; normalize once at construction.
    pub fn new(username: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            username: username.into().to_lowercase(),
            image: image.into().to_lowercase(),
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.username, self.image)
    }
}

/// Workflow file names for each target environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflows {
    pub development: String,
    pub production: String,
}

/// Where a service's deployed version markers live inside the GitOps
/// cluster-config repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDeployment {
    pub repository: Repository,
    pub base_path: String,
    pub development: String,
    pub production: String,
}

impl ClusterDeployment {
    /// Conventional base path for a service's overlays directory.
    pub fn base_path_for(service_slug: &str) -> String {
        format!("services/{service_slug}/overlays")
    }

    pub fn development_path(&self) -> String {
        format!("{}/{}", self.base_path, self.development)
    }

    pub fn production_path(&self) -> String {
        format!("{}/{}", self.base_path, self.production)
    }
}

/// The most recent commit on a repository branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestCommit {
    /// Full 40-character commit hash; truncation happens only at display time
    pub commit: String,
    /// ISO-8601 committer date as returned by the SCM host
    pub date: String,
}

impl LatestCommit {
    pub fn short_sha(&self) -> &str {
        short_sha(&self.commit)
    }
}

/// Latest published image tags for a package, one per tag family
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestImages {
    /// Last semantic-version tag (`v` followed by digits) in registry order
    pub version: Option<String>,
    /// Last full-commit-hash tag (40 hex characters) in registry order
    pub commit: Option<String>,
}

impl LatestImages {
    /// Partition a registry tag list into version tags and commit-hash tags
    /// and keep the last positional match of each. Registry order is taken
    /// as-is; an empty partition leaves the field absent.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let version = tags
            .iter()
            .map(|tag| tag.as_ref())
            .filter(|tag: &&str| is_version_tag(tag))
            .next_back()
            .map(str::to_string);

        let commit = tags
            .iter()
            .map(|tag| tag.as_ref())
            .filter(|tag: &&str| is_commit_tag(tag))
            .next_back()
            .map(str::to_string);

        Self { version, commit }
    }

    pub fn short_sha(&self) -> Option<&str> {
        self.commit.as_deref().map(short_sha)
    }
}

fn is_version_tag(tag: &str) -> bool {
    match tag.strip_prefix('v') {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn is_commit_tag(tag: &str) -> bool {
    tag.len() == 40 && tag.chars().all(|c| c.is_ascii_hexdigit())
}

/// Versions currently recorded in the cluster-config repository.
/// Either side may be absent: not yet deployed, or the lookup was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentVersion {
    pub development_version: Option<String>,
    pub production_version: Option<String>,
    pub development_date: Option<String>,
    pub production_date: Option<String>,
}

/// A deployable service from the static catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub title: String,
    pub emoji: String,
    pub package: Package,
    pub repository: Repository,
    pub workflows: Workflows,
    pub cluster: ClusterDeployment,
}

/// A service joined with the answers from all three providers.
/// Request-scoped; built fresh on every reconciliation.
#[derive(Debug, Clone)]
pub struct ReconciledDeployment {
    pub service: Service,
    pub latest_images: Option<LatestImages>,
    pub latest_commit: Option<LatestCommit>,
    pub versions: DeploymentVersion,
}

impl ReconciledDeployment {
    /// Development drift: the deployed development version is behind either
    /// the latest commit or the latest published image version. An absent
    /// side counts as a difference.
    pub fn needs_development_update(&self) -> bool {
        let image_commit = self.latest_images.as_ref().and_then(|i| i.commit.as_deref());
        let image_version = self.latest_images.as_ref().and_then(|i| i.version.as_deref());
        let head_commit = self.latest_commit.as_ref().map(|c| c.commit.as_str());

        head_commit != image_commit
            || self.versions.development_version.as_deref() != image_version
    }

    /// Production drift: development and production record different versions.
    pub fn needs_production_update(&self) -> bool {
        self.versions.development_version != self.versions.production_version
    }
}

/// Outcome of one workflow dispatch for one service
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub service: Service,
    /// True only when the SCM host acknowledged the dispatch
    pub triggered: bool,
}

/// Outcome of a selection dispatch request
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The selection resolved to no known services; nothing was dispatched
    NothingSelected,
    /// One report per selected service, in selection order
    Dispatched(Vec<DispatchReport>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str) -> Service {
        Service {
            id: id.to_string(),
            title: id.to_string(),
            emoji: "🚀".to_string(),
            package: Package::new("iamreadyai", id),
            repository: Repository {
                owner: "InterviewAndHealth".to_string(),
                repo: id.to_string(),
                branch: "main".to_string(),
            },
            workflows: Workflows {
                development: "build.yml".to_string(),
                production: "deploy.yml".to_string(),
            },
            cluster: ClusterDeployment {
                repository: Repository {
                    owner: "InterviewAndHealth".to_string(),
                    repo: "Cluster".to_string(),
                    branch: "main".to_string(),
                },
                base_path: ClusterDeployment::base_path_for(id),
                development: "development/kustomization.yaml".to_string(),
                production: "production/kustomization.yaml".to_string(),
            },
        }
    }

    fn reconciled(
        dev_version: Option<&str>,
        prod_version: Option<&str>,
        head: &str,
        image_commit: Option<&str>,
        image_version: Option<&str>,
    ) -> ReconciledDeployment {
        ReconciledDeployment {
            service: service("users"),
            latest_images: Some(LatestImages {
                version: image_version.map(str::to_string),
                commit: image_commit.map(str::to_string),
            }),
            latest_commit: Some(LatestCommit {
                commit: head.to_string(),
                date: "2024-01-15T10:30:00+00:00".to_string(),
            }),
            versions: DeploymentVersion {
                development_version: dev_version.map(str::to_string),
                production_version: prod_version.map(str::to_string),
                development_date: None,
                production_date: None,
            },
        }
    }

    #[test]
    fn test_version_tag_selection_takes_last_match() {
        let hash = "a".repeat(40);
        let tags = vec!["v1".to_string(), "v2".to_string(), hash.clone(), "v10".to_string()];
        let images = LatestImages::from_tags(&tags);
        assert_eq!(images.version.as_deref(), Some("v10"));
        assert_eq!(images.commit.as_deref(), Some(hash.as_str()));
    }

    #[test]
    fn test_empty_tag_list_yields_absent_fields() {
        let images = LatestImages::from_tags::<String>(&[]);
        assert_eq!(images.version, None);
        assert_eq!(images.commit, None);
    }

    #[test]
    fn test_non_matching_tags_are_ignored() {
        let tags = ["latest", "v1.2.3", "version", "deadbeef"];
        let images = LatestImages::from_tags(&tags);
        assert_eq!(images.version, None);
        assert_eq!(images.commit, None);
    }

    #[test]
    fn test_commit_mismatch_alone_triggers_development_drift() {
        let head = "a".repeat(40);
        let stale = "b".repeat(40);
        let item = reconciled(Some("v3"), None, &head, Some(stale.as_str()), Some("v3"));
        assert!(item.needs_development_update());
    }

    #[test]
    fn test_version_mismatch_alone_triggers_development_drift() {
        let head = "a".repeat(40);
        let item = reconciled(Some("v2"), None, &head, Some(head.as_str()), Some("v3"));
        assert!(item.needs_development_update());
    }

    #[test]
    fn test_matching_commit_and_version_is_already_updated() {
        let head = "a".repeat(40);
        let item = reconciled(Some("v3"), None, &head, Some(head.as_str()), Some("v3"));
        assert!(!item.needs_development_update());
    }

    #[test]
    fn test_production_drift_on_version_difference() {
        let head = "a".repeat(40);
        let item = reconciled(Some("v3"), Some("v2"), &head, None, None);
        assert!(item.needs_production_update());
    }

    #[test]
    fn test_production_drift_on_absent_side() {
        let head = "a".repeat(40);
        let item = reconciled(Some("v3"), None, &head, None, None);
        assert!(item.needs_production_update());
    }

    #[test]
    fn test_production_in_sync() {
        let head = "a".repeat(40);
        let item = reconciled(Some("v3"), Some("v3"), &head, None, None);
        assert!(!item.needs_production_update());
    }

    #[test]
    fn test_cluster_paths() {
        let svc = service("users");
        assert_eq!(
            svc.cluster.development_path(),
            "services/users/overlays/development/kustomization.yaml"
        );
        assert_eq!(
            svc.cluster.production_path(),
            "services/users/overlays/production/kustomization.yaml"
        );
    }

    #[test]
    fn test_package_is_lowercased() {
        let package = Package::new("IamReadyAI", "User-Service");
        assert_eq!(package.to_string(), "iamreadyai/user-service");
    }

    #[test]
    fn test_short_sha_uses_full_hash_for_equality() {
        let commit = LatestCommit {
            commit: "0123456789abcdef0123456789abcdef01234567".to_string(),
            date: "2024-01-15T10:30:00+00:00".to_string(),
        };
        assert_eq!(commit.short_sha(), "0123456");
        assert_ne!(commit.commit, commit.short_sha());
    }
}
