mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vendorsync_shopify::{BatchConfig, BatchProcessor, RetryPolicy, ShopifyClient};

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(vendorsync_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let shopify = Arc::new(ShopifyClient::from_config(&config)?);
    let batch = BatchProcessor::new(
        BatchConfig::from_config(&config),
        RetryPolicy::from_config(&config),
    );
    let auth = AuthState::from_config(&config)?;

    tracing::info!(
        shop = %config.shop_domain,
        api_version = %config.api_version,
        env = %config.env,
        max_batch_size = config.max_batch_size,
        sub_step_policy = %config.sub_step_policy,
        "starting vendorsync server"
    );

    let app = build_app(
        AppState {
            shopify,
            batch,
            config: Arc::clone(&config),
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
