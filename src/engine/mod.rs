//! The engine context: everything one check cycle needs, built once and shared.
//!
//! A cycle walks a snapshot of the registry in order. Each endpoint is probed, the
//! result is appended to the log and, when unhealthy, handed to the alert dispatcher.
//! Nothing that happens to one endpoint stops the cycle from reaching the next.

use std::sync::Arc;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::config::AppConfig;
use crate::http_probe::prelude::*;
use crate::notification::AlertDispatcher;
use crate::registry::{EndpointRegistry, RegistryError};
use crate::store::{ResultStore, SqliteResultStore, StoreError};

/// Errors that can occur while wiring up the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Everything that came out of one pass over the registry.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// One result per endpoint, in registry order.
    pub results: Vec<ProbeResult>,
    /// URLs whose result could not be written to the log.
    pub unlogged: Vec<String>,
}

impl CycleReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Holds the registry, prober, result log and alert dispatcher.
pub struct MonitorEngine {
    registry: Arc<EndpointRegistry>,
    prober: HttpProber,
    store: Arc<dyn ResultStore>,
    alerts: AlertDispatcher,
}

impl MonitorEngine {
    pub fn new(
        registry: Arc<EndpointRegistry>,
        prober: HttpProber,
        store: Arc<dyn ResultStore>,
        alerts: AlertDispatcher,
    ) -> Self {
        Self {
            registry,
            prober,
            store,
            alerts,
        }
    }

    /// Loads the URL list, opens the result log and picks the alert transports.
    pub async fn from_config(config: &AppConfig) -> Result<Self, EngineError> {
        let registry = Arc::new(EndpointRegistry::open(&config.urls_file)?);
        let store = Arc::new(SqliteResultStore::open(&config.database_url).await?);
        let prober = HttpProber::new(config.timeout())?;
        let alerts = AlertDispatcher::from_config(&config.notifications);
        Ok(Self::new(registry, prober, store, alerts))
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Runs one check cycle over the endpoints registered right now.
    pub async fn run_cycle(&self) -> CycleReport {
        let urls = self.registry.list();
        let started_at = Local::now();
        let mut results = Vec::with_capacity(urls.len());
        let mut unlogged = Vec::new();

        if urls.is_empty() {
            log::debug!("No URLs to check");
        } else {
            log::debug!("Checking {} URL(s)...", urls.len());
        }

        for url in urls {
            let result = self.prober.probe(&url).await;

            if let Err(e) = self.store.append(&result).await {
                log::error!("{e}");
                unlogged.push(url);
            }

            if !result.is_success() {
                self.alerts.notify_result(&result).await;
            }

            results.push(result);
        }

        let report = CycleReport {
            started_at,
            finished_at: Local::now(),
            results,
            unlogged,
        };
        log::debug!(
            "Cycle finished: {} checked, {} unhealthy",
            report.results.len(),
            report.failures()
        );
        report
    }

    /// Runs one check cycle and returns its results in registry order.
    pub async fn run_once(&self) -> Vec<ProbeResult> {
        self.run_cycle().await.results
    }
}
