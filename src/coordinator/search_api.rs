// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search API for the sync engine.

use std::collections::HashMap;

use tracing::debug;

use super::HolidaySyncEngine;
use crate::error::SyncError;
use crate::metrics::{self, LatencyTimer};
use crate::search::{HolidayFilter, HolidayView, Page, PageRequest};
use crate::validate;

impl HolidaySyncEngine {
    /// Filtered, paginated holidays ordered by date.
    ///
    /// Country names are resolved with one bulk lookup per page.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`] for a bad page size, code, year or an
    /// inverted date range.
    pub async fn search(
        &self,
        filter: &HolidayFilter,
        page: &PageRequest,
    ) -> Result<Page<HolidayView>, SyncError> {
        validate::page_request(page)?;
        let filter = validate::filter(filter, &self.config)?;
        let _timer = LatencyTimer::new("search");

        let hits = self.holidays.search(&filter, page).await?;

        let mut codes: Vec<String> = hits.content.iter().map(|h| h.country_code.clone()).collect();
        codes.sort();
        codes.dedup();
        let names: HashMap<String, String> = if codes.is_empty() {
            HashMap::new()
        } else {
            self.countries
                .find_by_codes(&codes)
                .await?
                .into_iter()
                .map(|c| (c.code, c.name))
                .collect()
        };

        debug!(
            predicates = filter.predicate_count(),
            total = hits.total_elements,
            returned = hits.len(),
            "Search complete"
        );
        metrics::record_search_results(hits.len());

        Ok(hits.map(|h| {
            let name = names.get(&h.country_code).cloned().unwrap_or_default();
            HolidayView::new(h, name)
        }))
    }
}
