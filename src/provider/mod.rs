// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Upstream holiday provider.
//!
//! ```text
//! HolidayProvider (raw calls, may fail)
//!     ↓
//! ResilientFetcher (retry + degrade-to-empty)
//!     ↓
//! reconcilers
//! ```
//!
//! [`NagerDateClient`] is the HTTP implementation; tests plug in scripted
//! providers through the same trait.

mod fetcher;
mod nager;

pub use fetcher::ResilientFetcher;
pub use nager::NagerDateClient;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Transport error calling {url}: {message}")]
    Transport { url: String, message: String },
    #[error("Upstream returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("Malformed response body from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("Unexpected provider failure: {0}")]
    Unexpected(String),
}

impl ProviderError {
    /// Transport-level failures that another attempt may fix.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}

/// One entry of the upstream country list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryRecord {
    pub country_code: String,
    #[serde(default)]
    pub name: String,
}

impl CountryRecord {
    pub fn new(country_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            name: name.into(),
        }
    }
}

/// One upstream holiday. Every field except the date may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub local_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub fixed: Option<bool>,
    #[serde(default)]
    pub global: Option<bool>,
    /// Subdivisions the holiday applies to (not persisted)
    #[serde(default)]
    pub counties: Option<Vec<String>>,
    #[serde(default)]
    pub launch_year: Option<i32>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
}

impl HolidayRecord {
    /// Record with only a date and a name; other fields absent.
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            date,
            local_name: Some(name.clone()),
            name: Some(name),
            country_code: None,
            fixed: None,
            global: None,
            counties: None,
            launch_year: None,
            types: None,
        }
    }
}

/// Raw access to the upstream provider.
#[async_trait]
pub trait HolidayProvider: Send + Sync {
    /// List of supported countries.
    async fn available_countries(&self) -> Result<Vec<CountryRecord>, ProviderError>;

    /// Public holidays of `country_code` in `year`.
    async fn public_holidays(
        &self,
        year: i32,
        country_code: &str,
    ) -> Result<Vec<HolidayRecord>, ProviderError>;
}
