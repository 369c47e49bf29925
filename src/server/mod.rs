//! Server Module
//!
//! HTTP API for the scheduler and the settings form.
//! Only compiled when the `server` feature is enabled.

mod api;
mod types;

pub use api::create_router;
pub use types::*;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::cycle::{CycleResult, CycleRunner};
use crate::prices::PriceCache;
use crate::settings::SettingsStore;

/// Shared state behind every handler
pub struct ServerState {
    pub settings: Arc<SettingsStore>,
    pub prices: Arc<PriceCache>,
    pub runner: Arc<CycleRunner>,
    /// Most recent cycle result, in memory only
    pub last_cycle: RwLock<Option<CycleResult>>,
    /// Serializes overlapping cycle triggers
    cycle_lock: Mutex<()>,
}

impl ServerState {
    pub fn new(
        settings: Arc<SettingsStore>,
        prices: Arc<PriceCache>,
        runner: Arc<CycleRunner>,
    ) -> Self {
        Self {
            settings,
            prices,
            runner,
            last_cycle: RwLock::new(None),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Run one cycle on its own task so a panic inside it surfaces as an
    /// error here instead of tearing down the connection.
    pub async fn trigger_cycle(&self) -> Result<CycleResult, tokio::task::JoinError> {
        let _guard = self.cycle_lock.lock().await;
        let runner = Arc::clone(&self.runner);
        let result = tokio::spawn(async move { runner.run_cycle().await }).await?;
        *self.last_cycle.write().await = Some(result.clone());
        Ok(result)
    }
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(state: Arc<ServerState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);

    tracing::info!("MetalPost API starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
