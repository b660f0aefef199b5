// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sync engine coordinator.
//!
//! The [`HolidaySyncEngine`] ties the components together:
//! - [`ResilientFetcher`] over a [`HolidayProvider`]
//! - [`CountryReconciler`] and [`HolidayReconciler`]
//! - country and holiday stores (SQL or in-memory)
//! - the search read path
//!
//! # Passes
//!
//! ```text
//! initial_load:   countries → every country × [start_year, end_year]
//! periodic_sync:  known countries × [last year, this year]
//! ```
//!
//! Passes are serialized by an internal gate. Unit failures are isolated.
//!
//! # Example
//!
//! ```rust,no_run
//! use holiday_sync::{HolidaySyncConfig, HolidaySyncEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), holiday_sync::SyncError> {
//! let config = HolidaySyncConfig {
//!     sql_url: Some("sqlite:holidays.db?mode=rwc".into()),
//!     ..Default::default()
//! };
//! let engine = HolidaySyncEngine::connect(config).await?;
//!
//! let report = engine.initial_load().await;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

mod search_api;
mod sync;
mod types;

pub use types::{periodic_years, PassKind, SyncReport};

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::config::HolidaySyncConfig;
use crate::error::SyncError;
use crate::model::Country;
use crate::provider::{HolidayProvider, NagerDateClient, ResilientFetcher};
use crate::reconcile::{CountryReconciler, HolidayReconciler};
use crate::storage::{CountryStore, HolidayStore, MemoryStore, SqlStore};

/// Holiday reference data sync engine.
///
/// # Thread Safety
///
/// The engine is `Send + Sync`. Share it behind an `Arc`; [`Self::scheduled_sync`]
/// requires one.
pub struct HolidaySyncEngine {
    pub(super) config: HolidaySyncConfig,
    pub(super) countries: Arc<dyn CountryStore>,
    pub(super) holidays: Arc<dyn HolidayStore>,
    pub(super) country_reconciler: CountryReconciler,
    pub(super) holiday_reconciler: HolidayReconciler,
    /// Held for the duration of a pass or a single-unit operation
    pub(super) pass_gate: Mutex<()>,
}

impl HolidaySyncEngine {
    /// Build an engine over one store implementing both store traits.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when `config` fails
    /// [`HolidaySyncConfig::validate`].
    pub fn new<S>(
        config: HolidaySyncConfig,
        provider: Arc<dyn HolidayProvider>,
        store: Arc<S>,
    ) -> Result<Self, SyncError>
    where
        S: CountryStore + HolidayStore + 'static,
    {
        let countries: Arc<dyn CountryStore> = store.clone();
        let holidays: Arc<dyn HolidayStore> = store;
        Self::with_stores(config, provider, countries, holidays)
    }

    /// Build an engine over separate country and holiday stores.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Validation`] when `config` fails
    /// [`HolidaySyncConfig::validate`].
    pub fn with_stores(
        config: HolidaySyncConfig,
        provider: Arc<dyn HolidayProvider>,
        countries: Arc<dyn CountryStore>,
        holidays: Arc<dyn HolidayStore>,
    ) -> Result<Self, SyncError> {
        config.validate()?;
        let fetcher = Arc::new(ResilientFetcher::new(provider, config.upstream_retry()));
        Ok(Self {
            country_reconciler: CountryReconciler::new(fetcher.clone(), countries.clone()),
            holiday_reconciler: HolidayReconciler::new(fetcher, countries.clone(), holidays.clone()),
            countries,
            holidays,
            config,
            pass_gate: Mutex::new(()),
        })
    }

    /// Wire the Nager.Date client and a store from configuration.
    ///
    /// Uses [`SqlStore`] when `sql_url` is set, otherwise an in-process
    /// [`MemoryStore`].
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, when the HTTP client cannot be built,
    /// or when the database is unreachable after startup retries.
    pub async fn connect(config: HolidaySyncConfig) -> Result<Self, SyncError> {
        config.validate()?;
        let provider: Arc<dyn HolidayProvider> = Arc::new(NagerDateClient::from_config(&config)?);

        match config.sql_url.clone() {
            Some(url) => {
                let store = Arc::new(SqlStore::with_max_connections(&url, config.sql_max_connections).await?);
                info!(sqlite = store.is_sqlite(), "Connected holiday store");
                Self::new(config, provider, store)
            }
            None => {
                info!("No sql_url configured, using in-memory holiday store");
                Self::new(config, provider, Arc::new(MemoryStore::new()))
            }
        }
    }

    #[must_use]
    pub fn config(&self) -> &HolidaySyncConfig {
        &self.config
    }

    /// Canonical country list as currently stored, ordered by code.
    pub async fn countries(&self) -> Result<Vec<Country>, SyncError> {
        Ok(self.countries.find_all().await?)
    }

    /// Whether a pass is currently running.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.pass_gate.try_lock().is_err()
    }
}
