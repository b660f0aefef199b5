// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Holiday, HolidayType};

/// A search hit with the owning country's display name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayView {
    pub id: i64,
    pub country_code: String,
    pub country_name: String,
    pub year: i32,
    pub date: NaiveDate,
    pub name: String,
    pub local_name: String,
    pub types: String,
    pub fixed: bool,
    pub global: bool,
    pub launch_year: Option<i32>,
}

impl HolidayView {
    pub fn new(holiday: Holiday, country_name: impl Into<String>) -> Self {
        Self {
            id: holiday.id.unwrap_or_default(),
            country_code: holiday.country_code,
            country_name: country_name.into(),
            year: holiday.year,
            date: holiday.date,
            name: holiday.name,
            local_name: holiday.local_name,
            types: holiday.types,
            fixed: holiday.fixed,
            global: holiday.global,
            launch_year: holiday.launch_year,
        }
    }

    /// Parsed type tags. Unknown tags read as `Public`.
    #[must_use]
    pub fn holiday_types(&self) -> Vec<HolidayType> {
        HolidayType::parse_list(&self.types)
    }
}
