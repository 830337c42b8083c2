/// Cinelog - movie review catalog server
use cinelog::{
    config::{LogFormat, LoggingConfig, ServerConfig},
    server, AppContext, CatalogResult,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> CatalogResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    init_logging(&config.logging);

    tracing::info!("Cinelog v{} starting", env!("CARGO_PKG_VERSION"));

    // Create application context
    let ctx = AppContext::new(config).await?;

    ctx.bootstrap_admin().await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cinelog={0},tower_http={0}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
