pub mod api;
pub mod completion;
pub mod config;
pub mod identity;
pub mod prompt;
pub mod session;

use tracing_subscriber::EnvFilter;

/// Initialize tracing, load configuration, and serve until interrupted.
///
/// A configuration error is fatal here, before anything binds: the
/// external-service clients cannot exist without their keys and URLs.
pub async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let config = config::AppConfig::from_env().map_err(|e| e.to_string())?;
    tracing::info!(
        mode = config.login_mode.as_str(),
        model = %config.model,
        "{} starting v{}",
        config::APP_NAME,
        config::APP_VERSION
    );

    let addr = config.listen_addr;
    let ctx = api::AppContext::new(config);
    let mut server = api::serve(ctx, addr).await?;
    tracing::info!(addr = %server.local_addr(), "ready");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for shutdown signal: {e}"))?;
    tracing::info!("shutdown requested");
    server.shutdown();
    Ok(())
}
