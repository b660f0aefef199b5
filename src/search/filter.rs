// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Holiday search filter.
//!
//! Every field is optional and composes with AND. An absent field imposes no
//! predicate on its dimension.
//!
//! # Example
//!
//! ```rust
//! use holiday_sync::search::HolidayFilter;
//! use chrono::NaiveDate;
//!
//! let filter = HolidayFilter::new()
//!     .country("KR")
//!     .year(2024)
//!     .from(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
//!     .types("Public");
//!
//! assert_eq!(filter.predicate_count(), 4);
//! assert!(HolidayFilter::new().is_unrestricted());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::Holiday;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayFilter {
    /// Exact country code
    pub country_code: Option<String>,
    /// Exact year
    pub year: Option<i32>,
    /// Inclusive lower date bound
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub to: Option<NaiveDate>,
    /// Substring of the stored type tag string
    pub types: Option<String>,
}

impl HolidayFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn from(mut self, date: NaiveDate) -> Self {
        self.from = Some(date);
        self
    }

    pub fn to(mut self, date: NaiveDate) -> Self {
        self.to = Some(date);
        self
    }

    pub fn between(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from(from).to(to)
    }

    pub fn types(mut self, needle: impl Into<String>) -> Self {
        self.types = Some(needle.into());
        self
    }

    /// Country code if set and non-blank.
    #[must_use]
    pub fn country_predicate(&self) -> Option<&str> {
        self.country_code.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Type substring if set and non-blank.
    #[must_use]
    pub fn types_predicate(&self) -> Option<&str> {
        self.types.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Number of predicates this filter contributes.
    #[must_use]
    pub fn predicate_count(&self) -> usize {
        usize::from(self.country_predicate().is_some())
            + usize::from(self.year.is_some())
            + usize::from(self.from.is_some())
            + usize::from(self.to.is_some())
            + usize::from(self.types_predicate().is_some())
    }

    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.predicate_count() == 0
    }

    /// In-process evaluation, used by stores without a query engine.
    #[must_use]
    pub fn matches(&self, holiday: &Holiday) -> bool {
        if let Some(code) = self.country_predicate() {
            if holiday.country_code != code {
                return false;
            }
        }
        if let Some(year) = self.year {
            if holiday.year != year {
                return false;
            }
        }
        if let Some(from) = self.from {
            if holiday.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if holiday.date > to {
                return false;
            }
        }
        if let Some(needle) = self.types_predicate() {
            // ASCII case-insensitive, like SQL LIKE
            if !holiday.types.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()) {
                return false;
            }
        }
        true
    }
}
