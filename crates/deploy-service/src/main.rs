//! Deployment Manager
//!
//! REST surface for the chat command layer: deployment status, redeploy
//! proposals, and workflow dispatch.

use anyhow::{Context, Result};
use deploy_service::{create_router, AppState, Catalog, Config, GitHubClient, Providers, RegistryClient};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deploy_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Configuration; a missing credential fails here, not on a request
    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting Deployment Manager");
    info!("SCM API URL: {}", config.github_api_url);
    info!("Registry URL: {}", config.registry_url);

    // Static service catalog, resolved once against the configured defaults
    let catalog = Catalog::load(&config).context("Failed to load service catalog")?;
    info!("Catalog loaded with {} service(s)", catalog.services().len());

    // Provider clients
    let github = GitHubClient::new(&config.github_api_url, &config.github_token)
        .context("Failed to build SCM client")?;
    let registry = RegistryClient::new(&config.registry_url, &config.github_token)
        .context("Failed to build registry client")?;

    // Create application state
    let state = AppState {
        catalog,
        providers: Providers { github, registry },
    };

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("Deployment Manager running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
