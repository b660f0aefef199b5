// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Resilient fetcher: retry with backoff, then degrade to an empty list.
//!
//! | Failure                       | Retried | Result             |
//! |-------------------------------|---------|--------------------|
//! | transport error / HTTP status | yes     | `Ok(vec![])` after the last attempt |
//! | malformed body                | no      | `Ok(vec![])`       |
//! | unexpected provider failure   | no      | `Err(..)`          |
//!
//! Callers therefore cannot tell "upstream has nothing" from "upstream was
//! unreachable"; the holiday reconciler treats an empty result as "change
//! nothing".

use std::sync::Arc;

use tracing::{error, info, warn};

use super::{CountryRecord, HolidayProvider, HolidayRecord, ProviderError};
use crate::metrics;
use crate::resilience::retry::{retry_or_else, RetryConfig};

pub struct ResilientFetcher {
    provider: Arc<dyn HolidayProvider>,
    retry: RetryConfig,
}

impl ResilientFetcher {
    pub fn new(provider: Arc<dyn HolidayProvider>, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Supported countries, or an empty list when upstream is unavailable.
    pub async fn fetch_countries(&self) -> Result<Vec<CountryRecord>, ProviderError> {
        let operation = "upstream_countries";
        let provider = &self.provider;
        let countries = retry_or_else(
            operation,
            &self.retry,
            move || provider.available_countries(),
            ProviderError::is_transient,
            |err| Self::degrade(operation, err),
        )
        .await?;

        info!(count = countries.len(), "Fetched upstream countries");
        metrics::record_upstream_call(operation, "ok");
        Ok(countries)
    }

    /// Holidays of one unit, or an empty list when upstream is unavailable.
    pub async fn fetch_holidays(
        &self,
        year: i32,
        country_code: &str,
    ) -> Result<Vec<HolidayRecord>, ProviderError> {
        let operation = "upstream_holidays";
        let provider = &self.provider;
        let holidays = retry_or_else(
            operation,
            &self.retry,
            move || provider.public_holidays(year, country_code),
            ProviderError::is_transient,
            |err| {
                warn!(country = %country_code, year, "Holiday fetch for unit did not succeed");
                Self::degrade(operation, err)
            },
        )
        .await?;

        info!(country = %country_code, year, count = holidays.len(), "Fetched upstream holidays");
        metrics::record_upstream_call(operation, "ok");
        Ok(holidays)
    }

    fn degrade<T>(operation: &str, err: ProviderError) -> Result<Vec<T>, ProviderError> {
        match err {
            ProviderError::Transport { .. } | ProviderError::Status { .. } => {
                error!(operation, error = %err, "Upstream retries exhausted, skipping request");
                metrics::record_upstream_call(operation, "exhausted");
                Ok(Vec::new())
            }
            ProviderError::Decode { .. } => {
                warn!(operation, error = %err, "Upstream body unreadable, treating as empty");
                metrics::record_upstream_call(operation, "malformed");
                Ok(Vec::new())
            }
            ProviderError::Unexpected(_) => {
                error!(operation, error = %err, "Upstream call failed unexpectedly");
                metrics::record_upstream_call(operation, "error");
                Err(err)
            }
        }
    }
}
