//! Configuration management for the deployment service

use deploy_common::{Error, Result};
use std::env;

/// Service configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,
    pub port: String,

    /// Bearer token for the SCM host and (base64-encoded) the registry
    pub github_token: String,

    /// Base URLs; overridable so tests and stubs can point elsewhere
    pub github_api_url: String,
    pub registry_url: String,

    /// Optional path to a JSON catalog file; the built-in catalog is used
    /// when unset
    pub catalog_path: Option<String>,

    pub defaults: CatalogDefaults,
}

/// Organization-wide defaults threaded into catalog entries that leave the
/// corresponding fields unset. Resolved once here, never re-read from the
/// environment afterwards.
#[derive(Debug, Clone)]
pub struct CatalogDefaults {
    pub package_username: String,
    pub repository_owner: String,
    pub branch: String,
    pub cluster_repository: String,
    pub development_workflow: String,
    pub production_workflow: String,
    pub development_kustomization: String,
    pub production_kustomization: String,
}

impl Config {
    /// Load configuration from environment variables. A missing required
    /// credential fails startup, not a request.
    pub fn from_env() -> Result<Self> {
        let github_token = env::var("GITHUB_TOKEN")
            .map_err(|_| Error::Configuration("Missing environment variable: GITHUB_TOKEN".to_string()))?;

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_or("PORT", "8000"),
            github_token,
            github_api_url: env_or("GITHUB_API_URL", "https://api.github.com"),
            registry_url: env_or("REGISTRY_URL", "https://ghcr.io"),
            catalog_path: env::var("CATALOG_PATH").ok(),
            defaults: CatalogDefaults::from_env(),
        })
    }
}

impl CatalogDefaults {
    fn from_env() -> Self {
        Self {
            package_username: env_or("DEFAULT_PACKAGE_USERNAME", "interviewandhealth"),
            repository_owner: env_or("DEFAULT_REPOSITORY_OWNER", "InterviewAndHealth"),
            branch: env_or("DEFAULT_BRANCH", "main"),
            cluster_repository: env_or("DEFAULT_CLUSTER_REPOSITORY", "Cluster"),
            development_workflow: env_or("DEFAULT_DEVELOPMENT_WORKFLOW", "build.yml"),
            production_workflow: env_or("DEFAULT_PRODUCTION_WORKFLOW", "deploy.yml"),
            development_kustomization: env_or(
                "DEFAULT_DEVELOPMENT_KUSTOMIZATION",
                "development/kustomization.yaml",
            ),
            production_kustomization: env_or(
                "DEFAULT_PRODUCTION_KUSTOMIZATION",
                "production/kustomization.yaml",
            ),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
