// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Validation of caller-supplied input.
//!
//! Every public engine operation runs its arguments through these checks
//! before touching the provider or the store. Failures are
//! [`SyncError::Validation`].

use crate::config::HolidaySyncConfig;
use crate::error::SyncError;
use crate::search::{HolidayFilter, PageRequest, MAX_PAGE_SIZE};

/// Normalize and check an ISO-3166-1 alpha-2 code. Returns it uppercased.
pub fn country_code(code: &str) -> Result<String, SyncError> {
    let trimmed = code.trim();
    if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(SyncError::Validation(format!(
            "country code must be two ASCII letters, got '{}'",
            code
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

pub fn year(year: i32, config: &HolidaySyncConfig) -> Result<i32, SyncError> {
    if year < config.min_year || year > config.max_year {
        return Err(SyncError::Validation(format!(
            "year {} is outside {}..={}",
            year, config.min_year, config.max_year
        )));
    }
    Ok(year)
}

pub fn page_request(page: &PageRequest) -> Result<(), SyncError> {
    if page.size == 0 || page.size > MAX_PAGE_SIZE {
        return Err(SyncError::Validation(format!(
            "page size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page.size
        )));
    }
    Ok(())
}

/// Check a search filter and return it with the country code normalized.
pub fn filter(filter: &HolidayFilter, config: &HolidaySyncConfig) -> Result<HolidayFilter, SyncError> {
    let mut normalized = filter.clone();
    if let Some(code) = filter.country_predicate() {
        normalized.country_code = Some(country_code(code)?);
    }
    if let Some(y) = filter.year {
        year(y, config)?;
    }
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(SyncError::Validation(format!(
                "date range is inverted: {} is after {}",
                from, to
            )));
        }
    }
    Ok(normalized)
}
