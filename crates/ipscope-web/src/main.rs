use anyhow::Result;
use ipscope_core::{AppError, Config};
use ipscope_lookup::IpLookupService;
use std::sync::Arc;
use warp::Filter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    ipscope_core::init()?;

    let (config, validation) = Config::load_validated()?;
    if !validation.warnings.is_empty() {
        tracing::info!("Loaded config with {} warning(s)", validation.warnings.len());
    }

    let addr = config.server.socket_addr().map_err(AppError::from)?;
    let service = IpLookupService::from_config(&config)
        .map_err(|e| AppError::Service(e.to_string()))?;

    let routes = ipscope_web::routes(Arc::new(service)).with(warp::trace::request());

    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .map_err(|e| AppError::Service(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("ipscope listening on http://{}", bound);
    server.await;

    // Graceful shutdown
    tracing::info!("ipscope stopped");
    Ok(())
}
