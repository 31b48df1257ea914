use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::info;
use url_localization::{app, config::Config, localizer::ResourceSet};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("url_localization=info".parse()?),
        )
        .init();

    info!("Starting URL localization demo");

    // Load configuration from environment
    let config = Config::from_env()?;

    let resources = ResourceSet::load_dir(&config.resources_dir, &config.resource_name)
        .with_context(|| {
            format!(
                "Failed to load '{}' resources from {}",
                config.resource_name,
                config.resources_dir.display()
            )
        })?;
    info!(
        "Loaded '{}' resources for cultures {:?}",
        resources.name(),
        resources.cultures()
    );

    let router = app::build_router(&config, resources)?.layer(TraceLayer::new_for_http());

    let address = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!(
        "Listening on {} (default culture {}, supported {:?})",
        address, config.default_culture, config.supported_cultures
    );

    axum::serve(listener, router).await?;
    Ok(())
}
