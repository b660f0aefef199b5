// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process store backed by concurrent maps.
//!
//! Countries live in a `DashMap` keyed by code. Holidays live in one ordered
//! map keyed by [`HolidayKey`], so a unit is a contiguous key range and a plan
//! is applied under a single write lock (atomic with respect to readers).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::traits::{CountryChanges, CountryStore, HolidayStore, StorageError};
use crate::model::{Country, Holiday, HolidayKey, UnitKey};
use crate::reconcile::UnitPlan;
use crate::search::{HolidayFilter, Page, PageRequest};

pub struct MemoryStore {
    countries: DashMap<String, Country>,
    holidays: RwLock<BTreeMap<HolidayKey, Holiday>>,
    next_country_id: AtomicI64,
    next_holiday_id: AtomicI64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            countries: DashMap::new(),
            holidays: RwLock::new(BTreeMap::new()),
            next_country_id: AtomicI64::new(1),
            next_holiday_id: AtomicI64::new(1),
        }
    }

    #[must_use]
    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    #[must_use]
    pub fn holiday_count(&self) -> usize {
        self.holidays.read().len()
    }

    /// Holidays stored for one unit (test and diagnostics helper).
    #[must_use]
    pub fn unit_len(&self, unit: &UnitKey) -> usize {
        self.holidays
            .read()
            .range(HolidayKey::unit_start(unit)..=HolidayKey::unit_end(unit))
            .count()
    }

    /// Clear all records
    pub fn clear(&self) {
        self.countries.clear();
        self.holidays.write().clear();
    }

    fn unit_snapshot(map: &BTreeMap<HolidayKey, Holiday>, unit: &UnitKey) -> Vec<Holiday> {
        map.range(HolidayKey::unit_start(unit)..=HolidayKey::unit_end(unit))
            .map(|(_, h)| h.clone())
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CountryStore for MemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Country>, StorageError> {
        Ok(self.countries.get(code).map(|r| r.value().clone()))
    }

    async fn exists(&self, code: &str) -> Result<bool, StorageError> {
        Ok(self.countries.contains_key(code))
    }

    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Country>, StorageError> {
        let mut found: Vec<Country> = codes
            .iter()
            .filter_map(|code| self.countries.get(code).map(|r| r.value().clone()))
            .collect();
        found.sort_by(|a, b| a.code.cmp(&b.code));
        found.dedup_by(|a, b| a.code == b.code);
        Ok(found)
    }

    async fn find_all(&self) -> Result<Vec<Country>, StorageError> {
        let mut all: Vec<Country> = self.countries.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }

    async fn apply_country_changes(&self, changes: &CountryChanges) -> Result<usize, StorageError> {
        let mut written = 0;
        for renamed in &changes.renames {
            if let Some(mut entry) = self.countries.get_mut(&renamed.code) {
                entry.name.clone_from(&renamed.name);
                written += 1;
            }
        }
        for new in &changes.inserts {
            // Codes are unique; an existing row is left as is
            if let Entry::Vacant(slot) = self.countries.entry(new.code.clone()) {
                slot.insert(Country {
                    id: self.next_country_id.fetch_add(1, Ordering::Relaxed),
                    code: new.code.clone(),
                    name: new.name.clone(),
                });
                written += 1;
            }
        }
        Ok(written)
    }
}

#[async_trait]
impl HolidayStore for MemoryStore {
    async fn find_unit(&self, unit: &UnitKey) -> Result<Vec<Holiday>, StorageError> {
        Ok(Self::unit_snapshot(&self.holidays.read(), unit))
    }

    async fn apply_unit_plan(&self, plan: &UnitPlan) -> Result<usize, StorageError> {
        let mut map = self.holidays.write();

        // Validate before mutating so a bad plan leaves the unit untouched
        if let Some(missing) = plan.updates.iter().find(|h| !map.contains_key(&h.key())) {
            return Err(StorageError::Corruption {
                id: format!("{}/{}", missing.country_code, missing.date),
                detail: "update target is not stored".into(),
            });
        }

        for deleted in &plan.deletes {
            map.remove(&deleted.key());
        }
        for updated in &plan.updates {
            map.insert(updated.key(), updated.clone());
        }
        for inserted in &plan.inserts {
            let mut record = inserted.clone();
            record.id = Some(self.next_holiday_id.fetch_add(1, Ordering::Relaxed));
            map.insert(record.key(), record);
        }
        Ok(plan.written())
    }

    async fn delete_unit(&self, unit: &UnitKey) -> Result<usize, StorageError> {
        let mut map = self.holidays.write();
        let keys: Vec<HolidayKey> = map
            .range(HolidayKey::unit_start(unit)..=HolidayKey::unit_end(unit))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            map.remove(key);
        }
        Ok(keys.len())
    }

    async fn search(
        &self,
        filter: &HolidayFilter,
        page: &PageRequest,
    ) -> Result<Page<Holiday>, StorageError> {
        let mut hits: Vec<Holiday> = self
            .holidays
            .read()
            .values()
            .filter(|h| filter.matches(h))
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.country_code.cmp(&b.country_code))
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = hits.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let content: Vec<Holiday> = hits
            .into_iter()
            .skip(offset)
            .take(page.size as usize)
            .collect();
        Ok(Page::new(content, page, total))
    }
}
