// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Country, Holiday, NewCountry, UnitKey};
use crate::reconcile::UnitPlan;
use crate::search::{HolidayFilter, Page, PageRequest};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Record not found")]
    NotFound,
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Data corruption detected for '{id}': {detail}")]
    Corruption { id: String, detail: String },
}

/// Country writes computed by the country reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryChanges {
    /// Codes not yet stored
    pub inserts: Vec<NewCountry>,
    /// Stored countries carrying their new display name
    pub renames: Vec<Country>,
}

impl CountryChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.renames.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inserts.len() + self.renames.len()
    }
}

#[async_trait]
pub trait CountryStore: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Country>, StorageError>;

    async fn exists(&self, code: &str) -> Result<bool, StorageError> {
        Ok(self.find_by_code(code).await?.is_some())
    }

    /// Bulk lookup. Unknown codes are simply absent from the result.
    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Country>, StorageError>;

    /// Every stored country, ordered by code.
    async fn find_all(&self) -> Result<Vec<Country>, StorageError>;

    /// Apply inserts and renames in one transaction. Returns rows written.
    async fn apply_country_changes(&self, changes: &CountryChanges) -> Result<usize, StorageError>;
}

#[async_trait]
pub trait HolidayStore: Send + Sync {
    /// All holidays of one unit, ordered by date.
    async fn find_unit(&self, unit: &UnitKey) -> Result<Vec<Holiday>, StorageError>;

    /// Apply deletes, updates and inserts of one unit atomically.
    /// Returns the number of records written (inserts + updates).
    async fn apply_unit_plan(&self, plan: &UnitPlan) -> Result<usize, StorageError>;

    /// Remove every holiday of one unit. Returns the number removed.
    async fn delete_unit(&self, unit: &UnitKey) -> Result<usize, StorageError>;

    /// Filtered page ordered by date, then country code, then id.
    async fn search(
        &self,
        filter: &HolidayFilter,
        page: &PageRequest,
    ) -> Result<Page<Holiday>, StorageError>;
}
