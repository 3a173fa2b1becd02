//! Static service catalog
//!
//! The catalog is plain data: a list of records loaded once at startup and
//! never mutated. Entries may leave organization-wide fields unset; those
//! resolve against [`CatalogDefaults`] exactly once at construction.

use deploy_common::{
    ClusterDeployment, Package, Repository, Result, Service, Workflows,
};
use serde::Deserialize;

use crate::config::{CatalogDefaults, Config};

/// Raw catalog entry as written in configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSpec {
    pub id: String,
    pub title: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    /// Registry image name; defaults to the service id
    #[serde(default)]
    pub image: Option<String>,
    /// Source repository name; defaults to the service id
    #[serde(default)]
    pub repo: Option<String>,
    /// Base path inside the cluster-config repository; defaults to the
    /// conventional overlays path for the service id
    #[serde(default)]
    pub cluster_base_path: Option<String>,
}

fn default_emoji() -> String {
    "🚀".to_string()
}

impl ServiceSpec {
    /// Resolve this entry into a fully-populated [`Service`]
    fn resolve(self, defaults: &CatalogDefaults) -> Service {
        let image = self.image.unwrap_or_else(|| self.id.clone());
        let repo = self.repo.unwrap_or_else(|| self.id.clone());
        let base_path = self
            .cluster_base_path
            .unwrap_or_else(|| ClusterDeployment::base_path_for(&self.id));

        Service {
            id: self.id,
            title: self.title,
            emoji: self.emoji,
            package: Package::new(&defaults.package_username, &image),
            repository: Repository {
                owner: defaults.repository_owner.clone(),
                repo,
                branch: defaults.branch.clone(),
            },
            workflows: Workflows {
                development: defaults.development_workflow.clone(),
                production: defaults.production_workflow.clone(),
            },
            cluster: ClusterDeployment {
                repository: Repository {
                    owner: defaults.repository_owner.clone(),
                    repo: defaults.cluster_repository.clone(),
                    branch: defaults.branch.clone(),
                },
                base_path,
                development: defaults.development_kustomization.clone(),
                production: defaults.production_kustomization.clone(),
            },
        }
    }
}

/// In-memory registry of deployable services, in a fixed catalog order
#[derive(Debug, Clone)]
pub struct Catalog {
    services: Vec<Service>,
}

impl Catalog {
    /// Load the catalog: a JSON file when `CATALOG_PATH` is configured,
    /// the built-in service list otherwise.
    pub fn load(config: &Config) -> Result<Self> {
        let specs = match &config.catalog_path {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => builtin_specs(),
        };
        Ok(Self::from_specs(specs, &config.defaults))
    }

    pub fn from_specs(specs: Vec<ServiceSpec>, defaults: &CatalogDefaults) -> Self {
        Self {
            services: specs.into_iter().map(|spec| spec.resolve(defaults)).collect(),
        }
    }

    /// All services in catalog order
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Resolve a selection of ids against the catalog. Unknown ids are
    /// silently dropped, duplicates collapse to the first occurrence, and
    /// selection order is preserved.
    pub fn resolve(&self, ids: &[String]) -> Vec<Service> {
        let mut seen: Vec<&str> = Vec::new();
        let mut selected = Vec::new();

        for id in ids {
            if seen.contains(&id.as_str()) {
                continue;
            }
            seen.push(id.as_str());
            if let Some(service) = self.services.iter().find(|s| &s.id == id) {
                selected.push(service.clone());
            }
        }

        selected
    }
}

/// The built-in service list mirroring the organization's deployable stack
fn builtin_specs() -> Vec<ServiceSpec> {
    serde_json::from_str(include_str!("catalog.json"))
        .unwrap_or_else(|_| Vec::new())
}
