// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Holiday reconciliation, one (country, year) unit at a time.
//!
//! ```text
//! fetch_holidays(year, code)
//!     │ empty → return 0, store untouched
//!     ↓
//! find_unit → plan_unit (diff) → apply_unit_plan (one transaction)
//! ```

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::diff::plan_unit;
use crate::error::SyncError;
use crate::metrics;
use crate::model::{encode_type_tags, Country, Holiday, UnitKey};
use crate::provider::{HolidayRecord, ResilientFetcher};
use crate::storage::traits::{CountryStore, HolidayStore};

pub struct HolidayReconciler {
    fetcher: Arc<ResilientFetcher>,
    countries: Arc<dyn CountryStore>,
    holidays: Arc<dyn HolidayStore>,
}

impl HolidayReconciler {
    pub fn new(
        fetcher: Arc<ResilientFetcher>,
        countries: Arc<dyn CountryStore>,
        holidays: Arc<dyn HolidayStore>,
    ) -> Self {
        Self {
            fetcher,
            countries,
            holidays,
        }
    }

    /// Reconcile one unit and return the number of records written
    /// (inserts + updates).
    ///
    /// An empty upstream result writes and deletes nothing.
    #[instrument(skip(self, country), fields(country = %country.code))]
    pub async fn reconcile_unit(&self, year: i32, country: &Country) -> Result<usize, SyncError> {
        let records = self.fetcher.fetch_holidays(year, &country.code).await?;
        if records.is_empty() {
            debug!("Upstream returned no holidays, leaving unit untouched");
            return Ok(0);
        }

        let unit = UnitKey::new(country.code.clone(), year);
        let incoming: Vec<Holiday> = records
            .into_iter()
            .map(|record| to_holiday(record, country, year))
            .collect();
        let local = self.holidays.find_unit(&unit).await?;
        let plan = plan_unit(&unit, local, incoming);

        if plan.is_empty() {
            debug!(unchanged = plan.unchanged, "Unit already up to date");
            return Ok(0);
        }

        let written = self.holidays.apply_unit_plan(&plan).await?;
        metrics::record_holidays_written(written);
        metrics::record_holidays_deleted(plan.deletes.len());
        info!(
            unit = %unit,
            inserted = plan.inserts.len(),
            updated = plan.updates.len(),
            deleted = plan.deletes.len(),
            unchanged = plan.unchanged,
            "Unit reconciled"
        );
        Ok(written)
    }

    /// Remove every stored holiday of one unit. The country must exist.
    #[instrument(skip(self))]
    pub async fn delete_unit(&self, year: i32, country_code: &str) -> Result<usize, SyncError> {
        if !self.countries.exists(country_code).await? {
            return Err(SyncError::country_not_found(country_code));
        }
        let removed = self.holidays.delete_unit(&UnitKey::new(country_code, year)).await?;
        metrics::record_holidays_deleted(removed);
        info!(country = %country_code, year, removed, "Unit deleted");
        Ok(removed)
    }
}

/// Map one upstream record onto the stored shape, applying defaults for
/// absent fields.
///
/// The year is the unit's year, not the date's, so a record always lands in
/// the unit it was fetched for.
pub fn to_holiday(record: HolidayRecord, country: &Country, year: i32) -> Holiday {
    let name = record.name.filter(|n| !n.trim().is_empty());
    let local_name = record.local_name.filter(|n| !n.trim().is_empty());
    let (name, local_name) = match (name, local_name) {
        (Some(n), Some(l)) => (n, l),
        (Some(n), None) => (n.clone(), n),
        (None, Some(l)) => (l.clone(), l),
        (None, None) => (String::new(), String::new()),
    };

    Holiday {
        id: None,
        country_id: country.id,
        country_code: country.code.clone(),
        year,
        date: record.date,
        name,
        local_name,
        types: encode_type_tags(record.types.as_deref().unwrap_or_default()),
        fixed: record.fixed.unwrap_or(false),
        global: record.global.unwrap_or(false),
        launch_year: record.launch_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn korea() -> Country {
        Country { id: 7, code: "KR".into(), name: "South Korea".into() }
    }

    #[test]
    fn test_to_holiday_defaults() {
        let record: HolidayRecord = serde_json::from_str(r#"{"date": "2024-05-05"}"#).unwrap();
        let h = to_holiday(record, &korea(), 2024);

        assert_eq!(h.country_id, 7);
        assert_eq!(h.country_code, "KR");
        assert_eq!(h.year, 2024);
        assert_eq!(h.types, "Public");
        assert!(!h.fixed);
        assert!(!h.global);
        assert_eq!(h.launch_year, None);
        assert!(h.id.is_none());
    }

    #[test]
    fn test_to_holiday_names_fall_back_to_each_other() {
        let mut record = HolidayRecord::new(NaiveDate::from_ymd_opt(2024, 10, 3).unwrap(), "x");
        record.name = None;
        record.local_name = Some("개천절".into());
        let h = to_holiday(record, &korea(), 2024);
        assert_eq!(h.name, "개천절");
        assert_eq!(h.local_name, "개천절");
    }

    #[test]
    fn test_to_holiday_keeps_upstream_values() {
        let mut record = HolidayRecord::new(NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(), "Liberation Day");
        record.local_name = Some("광복절".into());
        record.types = Some(vec!["Public".into(), "Bank".into()]);
        record.fixed = Some(true);
        record.global = Some(true);
        record.launch_year = Some(1949);

        let h = to_holiday(record, &korea(), 2024);
        assert_eq!(h.name, "Liberation Day");
        assert_eq!(h.local_name, "광복절");
        assert_eq!(h.types, "Public,Bank");
        assert!(h.fixed && h.global);
        assert_eq!(h.launch_year, Some(1949));
    }
}
