// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Country reconciliation.
//!
//! Upstream is authoritative for names; codes are immutable. Countries that
//! disappear upstream are kept, since holidays still reference them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::error::SyncError;
use crate::metrics;
use crate::model::{Country, NewCountry};
use crate::provider::{CountryRecord, ResilientFetcher};
use crate::storage::traits::{CountryChanges, CountryStore};

pub struct CountryReconciler {
    fetcher: Arc<ResilientFetcher>,
    store: Arc<dyn CountryStore>,
}

impl CountryReconciler {
    pub fn new(fetcher: Arc<ResilientFetcher>, store: Arc<dyn CountryStore>) -> Self {
        Self { fetcher, store }
    }

    /// Bring the stored country list in line with upstream and return every
    /// stored country, ordered by code.
    ///
    /// An empty upstream list (including an unreachable provider) changes
    /// nothing and returns what is already stored.
    #[instrument(skip(self))]
    pub async fn reconcile_countries(&self) -> Result<Vec<Country>, SyncError> {
        let records = self.fetcher.fetch_countries().await?;

        if !records.is_empty() {
            let codes: Vec<String> = records
                .iter()
                .map(|r| r.country_code.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            let existing = self.store.find_by_codes(&codes).await?;
            let changes = plan_country_changes(&records, &existing);

            if changes.is_empty() {
                debug!(upstream = records.len(), "Country list unchanged");
            } else {
                let written = self.store.apply_country_changes(&changes).await?;
                metrics::record_countries_written(written);
                info!(
                    inserted = changes.inserts.len(),
                    renamed = changes.renames.len(),
                    "Country list reconciled"
                );
            }
        }

        let all = self.store.find_all().await?;
        metrics::set_known_countries(all.len());
        Ok(all)
    }
}

/// Compute inserts and renames for `records` against the `existing` rows.
///
/// Codes are trimmed and blank codes skipped. When upstream repeats a code
/// the last entry wins.
pub fn plan_country_changes(records: &[CountryRecord], existing: &[Country]) -> CountryChanges {
    let by_code: HashMap<&str, &Country> = existing.iter().map(|c| (c.code.as_str(), c)).collect();

    let mut latest: BTreeMap<String, String> = BTreeMap::new();
    for record in records {
        let code = record.country_code.trim();
        if code.is_empty() {
            continue;
        }
        latest.insert(code.to_string(), record.name.trim().to_string());
    }

    let mut changes = CountryChanges::default();
    for (code, name) in latest {
        match by_code.get(code.as_str()) {
            Some(stored) if stored.name == name => {}
            Some(stored) => changes.renames.push(Country {
                id: stored.id,
                code,
                name,
            }),
            None => changes.inserts.push(NewCountry { code, name }),
        }
    }
    changes
}
