//! Shared fixtures: scripted providers and failure-injecting stores.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::sync::Notify;

use holiday_sync::reconcile::UnitPlan;
use holiday_sync::search::{HolidayFilter, Page, PageRequest};
use holiday_sync::{
    CountryRecord, Holiday, HolidayProvider, HolidayRecord, HolidayStore, HolidaySyncConfig,
    ProviderError, StorageError, UnitKey,
};

/// Config with millisecond backoff so retry paths run fast.
pub fn fast_config() -> HolidaySyncConfig {
    HolidaySyncConfig {
        start_year: 2024,
        end_year: 2025,
        upstream_base_delay_ms: 1,
        upstream_max_delay_ms: 5,
        ..Default::default()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Upstream holiday with every optional field populated.
pub fn record(date_str: &str, name: &str) -> HolidayRecord {
    let mut r = HolidayRecord::new(date(date_str), name);
    r.types = Some(vec!["Public".into()]);
    r.fixed = Some(false);
    r.global = Some(true);
    r
}

// =============================================================================
// Scripted provider
// =============================================================================

type HolidayScript = Result<Vec<HolidayRecord>, ProviderError>;

/// In-memory upstream. Unscripted units return an empty list.
pub struct ScriptedProvider {
    countries: Mutex<Result<Vec<CountryRecord>, ProviderError>>,
    holidays: Mutex<HashMap<(String, i32), HolidayScript>>,
    holiday_calls: Mutex<Vec<(String, i32)>>,
    country_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            countries: Mutex::new(Ok(Vec::new())),
            holidays: Mutex::new(HashMap::new()),
            holiday_calls: Mutex::new(Vec::new()),
            country_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_countries(self, countries: &[(&str, &str)]) -> Self {
        self.set_countries(countries);
        self
    }

    pub fn set_countries(&self, countries: &[(&str, &str)]) {
        *self.countries.lock() = Ok(countries
            .iter()
            .map(|(code, name)| CountryRecord::new(*code, *name))
            .collect());
    }

    pub fn fail_countries(&self, err: ProviderError) {
        *self.countries.lock() = Err(err);
    }

    pub fn set_holidays(&self, code: &str, year: i32, records: Vec<HolidayRecord>) {
        self.holidays.lock().insert((code.to_string(), year), Ok(records));
    }

    pub fn fail_holidays(&self, code: &str, year: i32, err: ProviderError) {
        self.holidays.lock().insert((code.to_string(), year), Err(err));
    }

    pub fn holiday_calls(&self) -> Vec<(String, i32)> {
        self.holiday_calls.lock().clone()
    }

    pub fn holiday_calls_for(&self, code: &str, year: i32) -> usize {
        self.holiday_calls
            .lock()
            .iter()
            .filter(|(c, y)| c == code && *y == year)
            .count()
    }

    pub fn country_calls(&self) -> usize {
        self.country_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HolidayProvider for ScriptedProvider {
    async fn available_countries(&self) -> Result<Vec<CountryRecord>, ProviderError> {
        self.country_calls.fetch_add(1, Ordering::SeqCst);
        self.countries.lock().clone()
    }

    async fn public_holidays(
        &self,
        year: i32,
        country_code: &str,
    ) -> Result<Vec<HolidayRecord>, ProviderError> {
        self.holiday_calls.lock().push((country_code.to_string(), year));
        self.holidays
            .lock()
            .get(&(country_code.to_string(), year))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Wraps a provider and parks the first holiday fetch until released, so a
/// test can observe the engine mid-pass.
pub struct GatedProvider {
    inner: Arc<ScriptedProvider>,
    pub entered: Notify,
    pub release: Notify,
    parked: AtomicUsize,
}

impl GatedProvider {
    pub fn new(inner: Arc<ScriptedProvider>) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            release: Notify::new(),
            parked: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HolidayProvider for GatedProvider {
    async fn available_countries(&self) -> Result<Vec<CountryRecord>, ProviderError> {
        self.inner.available_countries().await
    }

    async fn public_holidays(
        &self,
        year: i32,
        country_code: &str,
    ) -> Result<Vec<HolidayRecord>, ProviderError> {
        if self.parked.fetch_add(1, Ordering::SeqCst) == 0 {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.public_holidays(year, country_code).await
    }
}

// =============================================================================
// Failing store wrapper - precise error injection
// =============================================================================

/// Injects backend errors into `apply_unit_plan`, either on chosen call
/// numbers (1-indexed) or for one country's units.
pub struct FailingHolidayStore<S: HolidayStore> {
    inner: Arc<S>,
    call_count: AtomicU64,
    fail_on_calls: Vec<u64>,
    fail_country: Option<String>,
    error_msg: String,
}

impl<S: HolidayStore> FailingHolidayStore<S> {
    pub fn new(inner: Arc<S>, fail_on_calls: Vec<u64>, error_msg: &str) -> Self {
        Self {
            inner,
            call_count: AtomicU64::new(0),
            fail_on_calls,
            fail_country: None,
            error_msg: error_msg.to_string(),
        }
    }

    /// Fail every write to `country_code`'s units.
    pub fn for_country(inner: Arc<S>, country_code: &str, error_msg: &str) -> Self {
        let mut store = Self::new(inner, Vec::new(), error_msg);
        store.fail_country = Some(country_code.to_string());
        store
    }

    fn maybe_fail(&self, unit: &UnitKey) -> Result<(), StorageError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        let by_call = self.fail_on_calls.contains(&count);
        let by_country = self.fail_country.as_deref() == Some(unit.country_code.as_str());
        if by_call || by_country {
            Err(StorageError::Backend(self.error_msg.clone()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: HolidayStore> HolidayStore for FailingHolidayStore<S> {
    async fn find_unit(&self, unit: &UnitKey) -> Result<Vec<Holiday>, StorageError> {
        self.inner.find_unit(unit).await
    }

    async fn apply_unit_plan(&self, plan: &UnitPlan) -> Result<usize, StorageError> {
        self.maybe_fail(&plan.unit)?;
        self.inner.apply_unit_plan(plan).await
    }

    async fn delete_unit(&self, unit: &UnitKey) -> Result<usize, StorageError> {
        self.inner.delete_unit(unit).await
    }

    async fn search(
        &self,
        filter: &HolidayFilter,
        page: &PageRequest,
    ) -> Result<Page<Holiday>, StorageError> {
        self.inner.search(filter, page).await
    }
}
