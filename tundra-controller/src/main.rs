//! Tundra Controller
//!
//! Keeps each repo's deployment pipeline in step with the head of its
//! tracked branch.
//!
//! Architecture:
//! - Configuration: flags with environment fallbacks
//! - Repositories: collaborator traits over the HTTP clients (store, source
//!   control, pipeline engine)
//! - Reconciler: one idempotent pass per repo
//! - Scheduler: store watcher, work queue and bounded dispatcher
//!
//! The watcher lists repos from the store, the dispatcher runs a pass for
//! every queued repo, and passes requeue themselves while runs are going.

mod config;
mod health;
mod reconciler;
mod repository;
mod scheduler;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tundra_client::{ApiClient, EngineClient, SourceControlClient, StoreClient};

use crate::config::Config;
use crate::reconciler::Reconciler;
use crate::repository::{PipelineEngine, RepoStore, SourceControl};
use crate::scheduler::{Dispatcher, Watcher, WorkQueue};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tundra_controller=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tundra Controller");

    let config = Config::parse();
    config.validate()?;
    info!(
        "Loaded configuration: store_url={}, engine_url={}, scm_url={}, manifest_path={}",
        config.store_url, config.engine_url, config.scm_url, config.manifest_path
    );

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("tundra-controller/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let store: Arc<dyn RepoStore> = Arc::new(StoreClient::from_api(ApiClient::with_client(
        &config.store_url,
        http.clone(),
    )));
    let scm: Arc<dyn SourceControl> = Arc::new(SourceControlClient::from_api(
        ApiClient::with_client(&config.scm_url, http.clone()).with_token(config.scm_token.clone()),
    ));
    let engine: Arc<dyn PipelineEngine> = Arc::new(EngineClient::from_api(ApiClient::with_client(
        &config.engine_url,
        http,
    )));

    info!("Collaborator clients initialized");

    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&store),
        scm,
        engine,
        config.reconciler_settings(),
    ));

    let queue = Arc::new(WorkQueue::new());
    let watcher = Watcher::new(
        store,
        Arc::clone(&queue),
        config.watch_interval(),
        config.resync_interval(),
        config.call_timeout(),
    );
    let dispatcher = Dispatcher::new(
        Arc::clone(&queue),
        reconciler,
        config.max_concurrent_reconciles,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let health = tokio::spawn(health::serve(
        config.health_addr,
        watcher.ready_flag(),
        shutdown_rx.clone(),
    ));
    let watcher = tokio::spawn(watcher.run(shutdown_rx.clone()));
    let dispatcher = tokio::spawn(async move { dispatcher.run(shutdown_rx).await });

    info!("Controller initialized successfully");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);

    if let Err(e) = watcher.await {
        error!("Watcher task failed: {}", e);
    }
    if let Err(e) = dispatcher.await {
        error!("Dispatcher task failed: {}", e);
    }
    match health.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Health endpoint error: {:#}", e),
        Err(e) => error!("Health endpoint task failed: {}", e),
    }

    info!("Tundra Controller stopped");
    Ok(())
}
