//! Deployment-state reconciliation engine
//!
//! Fans catalog entries out to the three providers in parallel, joins every
//! fetch, and zips the answers back onto the catalog order. All-or-nothing:
//! one failed fetch fails the whole call, signaling "status currently
//! unknown" rather than "nothing needs attention".

use async_trait::async_trait;
use deploy_common::{
    ClusterDeployment, DeploymentVersion, LatestCommit, LatestImages, Package,
    ReconciledDeployment, Repository, Result, Service,
};
use futures::future::try_join_all;

use crate::github::{ClusterLookup, GitHubClient};
use crate::registry::RegistryClient;

/// The three independent read paths the engine reconciles
#[async_trait]
pub trait DeploymentProviders: Send + Sync {
    async fn latest_images(&self, package: &Package) -> Result<LatestImages>;

    async fn latest_commit(&self, repo: &Repository) -> Result<LatestCommit>;

    async fn cluster_versions(
        &self,
        cluster: &ClusterDeployment,
        lookup: ClusterLookup,
    ) -> Result<DeploymentVersion>;
}

/// Live providers backed by the SCM host and the container registry
#[derive(Debug, Clone)]
pub struct Providers {
    pub github: GitHubClient,
    pub registry: RegistryClient,
}

#[async_trait]
impl DeploymentProviders for Providers {
    async fn latest_images(&self, package: &Package) -> Result<LatestImages> {
        self.registry.latest_images(package).await
    }

    async fn latest_commit(&self, repo: &Repository) -> Result<LatestCommit> {
        self.github.latest_commit(repo).await
    }

    async fn cluster_versions(
        &self,
        cluster: &ClusterDeployment,
        lookup: ClusterLookup,
    ) -> Result<DeploymentVersion> {
        self.github.cluster_versions(cluster, lookup).await
    }
}

/// Which entrypoint is asking, and therefore which fetches to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Status overview: full data, no skips
    Status,
    /// Development redeploy proposal: the production cluster lookup is
    /// irrelevant to the decision and is skipped
    Development,
    /// Production promotion proposal: compares only the two cluster-recorded
    /// versions, so image and commit fetches are not issued at all
    Production,
}

impl ReconcileMode {
    fn cluster_lookup(self) -> ClusterLookup {
        match self {
            Self::Development => ClusterLookup::development_only(),
            Self::Status | Self::Production => ClusterLookup::full(),
        }
    }

    fn fetches_sources(self) -> bool {
        !matches!(self, Self::Production)
    }
}

/// Reconcile the full service list against the providers. Output length and
/// order always match the input; any single fetch failure fails the call.
pub async fn reconcile<P: DeploymentProviders>(
    providers: &P,
    services: &[Service],
    mode: ReconcileMode,
) -> Result<Vec<ReconciledDeployment>> {
    let lookup = mode.cluster_lookup();
    let versions = try_join_all(
        services
            .iter()
            .map(|s| providers.cluster_versions(&s.cluster, lookup)),
    );

    if mode.fetches_sources() {
        let images = try_join_all(services.iter().map(|s| providers.latest_images(&s.package)));
        let commits = try_join_all(services.iter().map(|s| providers.latest_commit(&s.repository)));

        let (images, commits, versions) = tokio::try_join!(images, commits, versions)?;

        Ok(services
            .iter()
            .cloned()
            .zip(images)
            .zip(commits)
            .zip(versions)
            .map(|(((service, latest_images), latest_commit), versions)| {
                ReconciledDeployment {
                    service,
                    latest_images: Some(latest_images),
                    latest_commit: Some(latest_commit),
                    versions,
                }
            })
            .collect())
    } else {
        let versions = versions.await?;

        Ok(services
            .iter()
            .cloned()
            .zip(versions)
            .map(|(service, versions)| ReconciledDeployment {
                service,
                latest_images: None,
                latest_commit: None,
                versions,
            })
            .collect())
    }
}

/// Drift rule applied after reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftRule {
    Development,
    Production,
}

/// Catalog-order-preserving partition of reconciled services by drift
#[derive(Debug, Default)]
pub struct Classified {
    pub recommended: Vec<ReconciledDeployment>,
    pub updated: Vec<ReconciledDeployment>,
}

/// Split the reconciled list into "needs update" and "already current".
/// Every service lands in exactly one group; both groups keep input order.
pub fn classify(items: Vec<ReconciledDeployment>, rule: DriftRule) -> Classified {
    let (recommended, updated) = items.into_iter().partition(|item| match rule {
        DriftRule::Development => item.needs_development_update(),
        DriftRule::Production => item.needs_production_update(),
    });

    Classified { recommended, updated }
}
