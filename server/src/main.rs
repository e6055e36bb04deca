//! # ppba-server: Binary Entry Point
//!
//! Startup order: configuration, tracing, relation compilation, key
//! material, credential store, HTTP listener. Any failure before the
//! listener is bound aborts the process.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ppba_prover::{KeyRing, Relation};
use ppba_server::service::CredentialService;
use ppba_server::store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use ppba_server::{AppState, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_tracing(config.log_json);

    let relation =
        Arc::new(Relation::compile().context("failed to compile key commitment relation")?);
    let shape = relation.shape();
    tracing::info!(
        constraints = shape.num_constraints,
        witnesses = shape.num_witnesses,
        "key commitment relation compiled"
    );

    let key_paths = config.key_paths();
    let keys = tokio::task::spawn_blocking(move || KeyRing::load(relation, key_paths))
        .await?
        .context("failed to load key material")?;
    let keys = Arc::new(keys);

    let store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(url) => Arc::new(
            PgCredentialStore::connect(url, config.db_max_connections)
                .await
                .context("failed to connect to credential database")?,
        ),
        None => {
            tracing::warn!(
                "DATABASE_URL not set, credentials are kept in memory and lost on restart"
            );
            Arc::new(MemoryCredentialStore::new())
        }
    };

    #[cfg(unix)]
    tokio::spawn(reload_keys_on_sighup(Arc::clone(&keys)));

    let state = AppState::new(CredentialService::new(keys, store));
    let app = ppba_server::app(state, config.body_limit);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("ppba-server listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("ppba-server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Administrative reload: `kill -HUP <pid>` re-reads both key files.
#[cfg(unix)]
async fn reload_keys_on_sighup(keys: Arc<KeyRing>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("cannot install SIGHUP handler, key reload disabled: {e}");
            return;
        }
    };
    while hangup.recv().await.is_some() {
        tracing::info!("SIGHUP received, reloading key material");
        let keys = Arc::clone(&keys);
        match tokio::task::spawn_blocking(move || keys.reload()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "key reload failed, keeping current keys"),
            Err(e) => tracing::error!(error = %e, "key reload task panicked"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
