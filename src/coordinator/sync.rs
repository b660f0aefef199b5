// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sync passes and single-unit operations.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use super::types::{periodic_years, PassKind, SyncReport};
use super::HolidaySyncEngine;
use crate::error::SyncError;
use crate::metrics;
use crate::model::{Country, UnitKey};
use crate::validate;

impl HolidaySyncEngine {
    /// Reconcile the country list, then every country for every year in
    /// `[start_year, end_year]`.
    ///
    /// Never fails: unit errors are counted in the report, and a failure of
    /// the country step yields an aborted report.
    pub async fn initial_load(&self) -> SyncReport {
        let _gate = self.pass_gate.lock().await;
        let span = info_span!("sync_pass", pass = "initial", pass_id = %Uuid::new_v4());
        self.run_initial().instrument(span).await
    }

    /// Refresh the previous and current year for every known country.
    pub async fn periodic_sync(&self) -> SyncReport {
        self.periodic_sync_at(chrono::Local::now().date_naive()).await
    }

    /// [`Self::periodic_sync`] with an explicit notion of "today".
    pub async fn periodic_sync_at(&self, today: NaiveDate) -> SyncReport {
        let _gate = self.pass_gate.lock().await;
        let span = info_span!("sync_pass", pass = "periodic", pass_id = %Uuid::new_v4());
        self.run_periodic(today).instrument(span).await
    }

    /// Timer entry point: run a periodic pass unless one is already running.
    ///
    /// Fire-and-forget. The pass runs in its own task so even a panic inside
    /// it is contained and logged here.
    pub async fn scheduled_sync(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        let task = tokio::spawn(async move {
            let Ok(_gate) = engine.pass_gate.try_lock() else {
                warn!("Previous sync pass still running, skipping scheduled sync");
                metrics::record_pass_skipped();
                return None;
            };
            let today = chrono::Local::now().date_naive();
            let span = info_span!("sync_pass", pass = "scheduled", pass_id = %Uuid::new_v4());
            Some(engine.run_periodic(today).instrument(span).await)
        });

        match task.await {
            Ok(Some(report)) => info!(%report, "Scheduled sync finished"),
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "Scheduled sync task did not complete");
                metrics::record_pass_failure(PassKind::Periodic.as_str());
            }
        }
    }

    /// Re-sync one unit on demand. Returns records written.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`] for a malformed code or out-of-range year,
    /// [`SyncError::CountryNotFound`] when the country is not stored.
    #[instrument(skip(self))]
    pub async fn refresh_unit(&self, year: i32, country_code: &str) -> Result<usize, SyncError> {
        let code = validate::country_code(country_code)?;
        let year = validate::year(year, &self.config)?;

        let _gate = self.pass_gate.lock().await;
        let country = self
            .countries
            .find_by_code(&code)
            .await?
            .ok_or_else(|| SyncError::country_not_found(&code))?;

        let written = self.holiday_reconciler.reconcile_unit(year, &country).await?;
        metrics::record_unit_outcome("success");
        info!(unit = %UnitKey::new(code, year), written, "Unit refreshed");
        Ok(written)
    }

    /// Delete every stored holiday of one unit. Returns records removed.
    #[instrument(skip(self))]
    pub async fn delete_unit(&self, year: i32, country_code: &str) -> Result<usize, SyncError> {
        let code = validate::country_code(country_code)?;
        let year = validate::year(year, &self.config)?;

        let _gate = self.pass_gate.lock().await;
        self.holiday_reconciler.delete_unit(year, &code).await
    }

    async fn run_initial(&self) -> SyncReport {
        let start = Instant::now();
        let mut report = SyncReport::new(PassKind::Initial);
        info!(
            start_year = self.config.start_year,
            end_year = self.config.end_year,
            "Initial load starting"
        );

        let countries = match self.country_reconciler.reconcile_countries().await {
            Ok(countries) => countries,
            Err(e) => {
                error!(error = %e, "Country reconciliation failed, aborting initial load");
                metrics::record_pass_failure(PassKind::Initial.as_str());
                report.aborted = true;
                return report;
            }
        };

        let years: Vec<i32> = (self.config.start_year..=self.config.end_year).collect();
        self.run_units(&countries, &years, &mut report).await;
        self.finish(report, start)
    }

    async fn run_periodic(&self, today: NaiveDate) -> SyncReport {
        let start = Instant::now();
        let mut report = SyncReport::new(PassKind::Periodic);
        let years = periodic_years(today);
        info!(?years, "Periodic sync starting");

        let countries = match self.countries.find_all().await {
            Ok(countries) => countries,
            Err(e) => {
                error!(error = %e, "Could not list countries, aborting periodic sync");
                metrics::record_pass_failure(PassKind::Periodic.as_str());
                report.aborted = true;
                return report;
            }
        };
        metrics::set_known_countries(countries.len());

        self.run_units(&countries, &years, &mut report).await;
        self.finish(report, start)
    }

    /// Country order × year order. A failing unit is logged and counted; the
    /// loop moves on.
    async fn run_units(&self, countries: &[Country], years: &[i32], report: &mut SyncReport) {
        for country in countries {
            for &year in years {
                match self.holiday_reconciler.reconcile_unit(year, country).await {
                    Ok(written) => {
                        metrics::record_unit_outcome("success");
                        report.record_success(written);
                    }
                    Err(e) => {
                        error!(
                            unit = %UnitKey::new(country.code.clone(), year),
                            error = %e,
                            "Unit sync failed, continuing"
                        );
                        metrics::record_unit_outcome("error");
                        report.record_failure();
                    }
                }
            }
        }
    }

    fn finish(&self, report: SyncReport, start: Instant) -> SyncReport {
        let elapsed = start.elapsed();
        metrics::record_pass(report.kind.as_str(), elapsed, report.failed);
        info!(
            units = report.units,
            failed = report.failed,
            written = report.written,
            elapsed_ms = elapsed.as_millis() as u64,
            "Sync pass complete"
        );
        report
    }
}
