//! # Holiday Sync
//!
//! Keeps a local store of public holidays in step with an upstream provider
//! (Nager.Date) and serves filtered, paginated queries over it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  HolidaySyncEngine (passes)                 │
//! │  • initial_load / periodic_sync / scheduled_sync           │
//! │  • refresh_unit / delete_unit                              │
//! │  • per-unit failure isolation, serialized passes           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Reconcilers                          │
//! │  • Countries: insert new, rename changed, never delete     │
//! │  • Holidays: three-way diff per (country, year) unit       │
//! │  • Empty upstream never deletes                            │
//! └─────────────────────────────────────────────────────────────┘
//!              │                                  │
//!              ▼                                  ▼
//! ┌───────────────────────────┐    ┌────────────────────────────┐
//! │     ResilientFetcher      │    │   Stores (one tx per unit) │
//! │  • retry with backoff     │    │  • SqlStore (SQLite/MySQL) │
//! │  • degrade to empty       │    │  • MemoryStore             │
//! └───────────────────────────┘    └────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use holiday_sync::{HolidayFilter, HolidaySyncConfig, HolidaySyncEngine, PageRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), holiday_sync::SyncError> {
//!     let config = HolidaySyncConfig {
//!         sql_url: Some("sqlite:holidays.db?mode=rwc".into()),
//!         start_year: 2024,
//!         end_year: 2025,
//!         ..Default::default()
//!     };
//!     let engine = HolidaySyncEngine::connect(config).await?;
//!
//!     let report = engine.initial_load().await;
//!     println!("{}", report);
//!
//!     let page = engine
//!         .search(&HolidayFilter::new().country("KR").year(2025), &PageRequest::default())
//!         .await?;
//!     for holiday in &page.content {
//!         println!("{} {} ({})", holiday.date, holiday.name, holiday.country_name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`coordinator`]: The [`HolidaySyncEngine`] and its pass reports
//! - [`provider`]: Upstream client and the resilient fetcher
//! - [`reconcile`]: Country and holiday reconciliation
//! - [`storage`]: SQL and in-memory stores
//! - [`search`]: Filters, pagination, SQL translation
//! - [`resilience`]: Retry with backoff

pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod reconcile;
pub mod resilience;
pub mod search;
pub mod storage;
pub mod validate;

pub use config::HolidaySyncConfig;
pub use coordinator::{HolidaySyncEngine, PassKind, SyncReport};
pub use error::SyncError;
pub use model::{Country, Holiday, HolidayType, UnitKey};
pub use provider::{CountryRecord, HolidayProvider, HolidayRecord, NagerDateClient, ProviderError};
pub use search::{HolidayFilter, HolidayView, Page, PageRequest};
pub use storage::{CountryStore, HolidayStore, MemoryStore, SqlStore, StorageError};
pub use resilience::retry::RetryConfig;
pub use metrics::LatencyTimer;
