// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP client for the Nager.Date public holiday API.
//!
//! Endpoints used:
//! - `GET {base}/AvailableCountries`
//! - `GET {base}/PublicHolidays/{year}/{countryCode}`
//!
//! The client performs exactly one request per call; retry lives in
//! [`super::ResilientFetcher`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{CountryRecord, HolidayProvider, HolidayRecord, ProviderError};
use crate::config::HolidaySyncConfig;

#[derive(Debug, Clone)]
pub struct NagerDateClient {
    http: reqwest::Client,
    base_url: String,
}

impl NagerDateClient {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("holiday-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &HolidaySyncConfig) -> Result<Self, ProviderError> {
        Self::new(config.provider_base_url.clone(), config.request_timeout())
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn countries_url(&self) -> String {
        format!("{}/AvailableCountries", self.base_url)
    }

    fn holidays_url(&self, year: i32, country_code: &str) -> String {
        format!("{}/PublicHolidays/{}/{}", self.base_url, year, country_code)
    }

    async fn get_list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, ProviderError> {
        debug!(url = %url, "Requesting upstream list");

        let response = self.http.get(url).send().await.map_err(|e| ProviderError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| ProviderError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        decode_list(url, &body)
    }
}

/// Decode a JSON array body. A blank body or a literal `null` is an empty list.
fn decode_list<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<Vec<T>, ProviderError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let parsed: Option<Vec<T>> = serde_json::from_slice(body).map_err(|e| ProviderError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(parsed.unwrap_or_default())
}

#[async_trait]
impl HolidayProvider for NagerDateClient {
    #[instrument(skip(self))]
    async fn available_countries(&self) -> Result<Vec<CountryRecord>, ProviderError> {
        self.get_list(&self.countries_url()).await
    }

    #[instrument(skip(self))]
    async fn public_holidays(
        &self,
        year: i32,
        country_code: &str,
    ) -> Result<Vec<HolidayRecord>, ProviderError> {
        self.get_list(&self.holidays_url(year, country_code)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = NagerDateClient::new("https://date.nager.at/api/v3/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "https://date.nager.at/api/v3");
        assert_eq!(client.countries_url(), "https://date.nager.at/api/v3/AvailableCountries");
        assert_eq!(
            client.holidays_url(2024, "KR"),
            "https://date.nager.at/api/v3/PublicHolidays/2024/KR"
        );
    }

    #[test]
    fn test_decode_blank_and_null_bodies() {
        let blank: Vec<CountryRecord> = decode_list("u", b"  \n").unwrap();
        assert!(blank.is_empty());
        let null: Vec<CountryRecord> = decode_list("u", b"null").unwrap();
        assert!(null.is_empty());
    }

    #[test]
    fn test_decode_malformed_body() {
        let result: Result<Vec<CountryRecord>, _> = decode_list("u", b"{\"oops\":");
        assert!(matches!(result, Err(ProviderError::Decode { .. })));
    }

    #[test]
    fn test_decode_country_list() {
        let body = br#"[{"countryCode":"KR","name":"South Korea"},{"countryCode":"US","name":"United States"}]"#;
        let countries: Vec<CountryRecord> = decode_list("u", body).unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[1].country_code, "US");
    }
}
