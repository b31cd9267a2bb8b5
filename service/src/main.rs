#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use std::{net::SocketAddr, sync::Arc};

use tcn_directory_api::{
    build_info::BuildInfoProvider,
    config::Config,
    http::build_router,
    portal::{BulletinSync, MemberDirectory},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load and validate configuration first (fail-fast)
    let config = Config::load().map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.level))
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "tcn-directory-api starting up"
    );

    let build_info = BuildInfoProvider::from_env().build_info();
    tracing::info!(
        version = %build_info.version,
        git_sha = %build_info.short_sha(),
        build_time = %build_info.build_time,
        "resolved build metadata"
    );

    let directory = Arc::new(MemberDirectory::from_config(&config.portal));
    if directory.is_configured() {
        if directory.test_connection().await {
            tracing::info!(base_url = %config.portal.normalized_base_url(), "Portal API reachable");
        } else {
            tracing::warn!(
                base_url = %config.portal.normalized_base_url(),
                "Portal API unreachable at startup; lookups will use sample data until it recovers"
            );
        }
    }

    let bulletins = Arc::new(BulletinSync::from_config(&config.portal));

    let app = build_router(directory, bulletins, build_info, &config);

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Starting server at http://{}/api/v1", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
