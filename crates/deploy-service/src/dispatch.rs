//! Selection & dispatch controller
//!
//! Resolves a human-made selection against the catalog and fans out one
//! workflow dispatch per service. Unlike reconciliation, dispatch is
//! per-item independent: one failure never masks another's outcome.

use async_trait::async_trait;
use deploy_common::{DispatchOutcome, DispatchReport, Repository, Result, Workflows};
use futures::future::join_all;
use serde::Deserialize;
use std::fmt;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::github::GitHubClient;

/// Target environment for a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// The workflow file configured for this environment
    pub fn workflow_file<'a>(&self, workflows: &'a Workflows) -> &'a str {
        match self {
            Self::Development => &workflows.development,
            Self::Production => &workflows.production,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Triggers one remote workflow run
#[async_trait]
pub trait WorkflowDispatcher: Send + Sync {
    /// `Ok(true)` only on the provider's canonical accepted status;
    /// `Err` only for transport failures.
    async fn dispatch_workflow(&self, repo: &Repository, workflow: &str) -> Result<bool>;
}

#[async_trait]
impl WorkflowDispatcher for GitHubClient {
    async fn dispatch_workflow(&self, repo: &Repository, workflow: &str) -> Result<bool> {
        GitHubClient::dispatch_workflow(self, repo, workflow).await
    }
}

/// Dispatch the selected services to the given environment, in parallel.
/// Unknown ids are dropped; an empty resulting selection performs no
/// dispatches at all. Every selected service gets a report, in selection
/// order; a transport failure is folded into that service's report.
pub async fn dispatch_selected<D: WorkflowDispatcher>(
    dispatcher: &D,
    catalog: &Catalog,
    service_ids: &[String],
    environment: Environment,
) -> DispatchOutcome {
    let selected = catalog.resolve(service_ids);
    if selected.is_empty() {
        return DispatchOutcome::NothingSelected;
    }

    info!(
        "Dispatching {} service(s) to {}",
        selected.len(),
        environment
    );

    let results = join_all(selected.iter().map(|service| {
        dispatcher.dispatch_workflow(
            &service.repository,
            environment.workflow_file(&service.workflows),
        )
    }))
    .await;

    let reports = selected
        .into_iter()
        .zip(results)
        .map(|(service, result)| {
            let triggered = match result {
                Ok(triggered) => triggered,
                Err(err) => {
                    warn!("Dispatch failed for {}: {}", service.id, err);
                    false
                }
            };
            DispatchReport { service, triggered }
        })
        .collect();

    DispatchOutcome::Dispatched(reports)
}
