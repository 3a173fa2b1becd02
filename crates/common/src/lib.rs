pub mod error;
pub mod format;
pub mod models;

pub use error::{Error, Result};
pub use models::{
    ClusterDeployment, DeploymentVersion, DispatchOutcome, DispatchReport, LatestCommit,
    LatestImages, Package, ReconciledDeployment, Repository, Service, Workflows,
};
