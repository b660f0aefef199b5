// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Three-way diff of one reconciliation unit.
//!
//! ```text
//! local    {A, B, C}        upstream {B', C, D}
//!
//! delete = local − upstream           → {A}
//! update = local ∩ upstream, changed  → {B ← B'}
//! insert = upstream − local           → {D}
//! (C is unchanged and produces no write)
//! ```
//!
//! Pure data-structure work over ordered maps keyed by date. No I/O.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{Holiday, UnitKey};

/// Every store change needed to bring one unit in line with upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPlan {
    pub unit: UnitKey,
    /// Local records absent upstream
    pub deletes: Vec<Holiday>,
    /// Local records (ids kept) with upstream attributes merged in
    pub updates: Vec<Holiday>,
    /// Upstream records with no local counterpart (no id yet)
    pub inserts: Vec<Holiday>,
    /// Records present on both sides with identical attributes
    pub unchanged: usize,
}

impl UnitPlan {
    pub fn empty(unit: UnitKey) -> Self {
        Self {
            unit,
            deletes: Vec::new(),
            updates: Vec::new(),
            inserts: Vec::new(),
            unchanged: 0,
        }
    }

    /// Records written by this plan (inserts + updates).
    #[must_use]
    pub fn written(&self) -> usize {
        self.inserts.len() + self.updates.len()
    }

    /// True when applying the plan would not touch the store.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty() && self.inserts.is_empty()
    }

    /// Updates followed by inserts, the order stores apply them in.
    pub fn upserts(&self) -> impl Iterator<Item = &Holiday> {
        self.updates.iter().chain(self.inserts.iter())
    }

    pub fn delete_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.deletes.iter().map(|h| h.date)
    }
}

/// Plan the changes for `unit`.
///
/// `incoming` entries sharing a date collapse to the last one, since the
/// reconciliation key cannot hold two holidays on one date.
pub fn plan_unit(unit: &UnitKey, local: Vec<Holiday>, incoming: Vec<Holiday>) -> UnitPlan {
    let mut local_by_date: BTreeMap<NaiveDate, Holiday> =
        local.into_iter().map(|h| (h.date, h)).collect();
    let incoming_by_date: BTreeMap<NaiveDate, Holiday> =
        incoming.into_iter().map(|h| (h.date, h)).collect();

    let mut plan = UnitPlan::empty(unit.clone());

    for (date, upstream) in incoming_by_date {
        match local_by_date.remove(&date) {
            Some(mut existing) => {
                if existing.same_attributes(&upstream) {
                    plan.unchanged += 1;
                } else {
                    existing.merge_from(&upstream);
                    plan.updates.push(existing);
                }
            }
            None => plan.inserts.push(upstream),
        }
    }

    // Whatever is left locally was not reported upstream
    plan.deletes = local_by_date.into_values().collect();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holiday(id: Option<i64>, date: &str, name: &str) -> Holiday {
        Holiday {
            id,
            country_id: 1,
            country_code: "KR".into(),
            year: 2024,
            date: date.parse().unwrap(),
            name: name.into(),
            local_name: name.into(),
            types: "Public".into(),
            fixed: false,
            global: true,
            launch_year: None,
        }
    }

    fn unit() -> UnitKey {
        UnitKey::new("KR", 2024)
    }

    #[test]
    fn test_three_way_diff() {
        let local = vec![
            holiday(Some(1), "2024-01-01", "A"),
            holiday(Some(2), "2024-03-01", "B"),
            holiday(Some(3), "2024-05-05", "C"),
        ];
        let incoming = vec![
            holiday(None, "2024-03-01", "B renamed"),
            holiday(None, "2024-05-05", "C"),
            holiday(None, "2024-06-06", "D"),
        ];

        let plan = plan_unit(&unit(), local, incoming);

        assert_eq!(plan.deletes.len(), 1);
        assert_eq!(plan.deletes[0].id, Some(1));
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].id, Some(2));
        assert_eq!(plan.updates[0].name, "B renamed");
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].name, "D");
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.written(), 2);
    }

    #[test]
    fn test_identical_input_plans_nothing() {
        let local = vec![holiday(Some(1), "2024-01-01", "A"), holiday(Some(2), "2024-03-01", "B")];
        let incoming = vec![holiday(None, "2024-01-01", "A"), holiday(None, "2024-03-01", "B")];

        let plan = plan_unit(&unit(), local, incoming);

        assert!(plan.is_empty());
        assert_eq!(plan.written(), 0);
        assert_eq!(plan.unchanged, 2);
    }

    #[test]
    fn test_empty_local_inserts_everything() {
        let incoming = vec![holiday(None, "2024-01-01", "A"), holiday(None, "2024-03-01", "B")];
        let plan = plan_unit(&unit(), Vec::new(), incoming);

        assert_eq!(plan.inserts.len(), 2);
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn test_duplicate_incoming_dates_last_wins() {
        let incoming = vec![
            holiday(None, "2024-01-01", "First"),
            holiday(None, "2024-01-01", "Second"),
        ];
        let plan = plan_unit(&unit(), Vec::new(), incoming);

        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].name, "Second");
    }

    #[test]
    fn test_upserts_and_delete_dates() {
        let local = vec![holiday(Some(1), "2024-01-01", "A"), holiday(Some(2), "2024-02-02", "B")];
        let incoming = vec![holiday(None, "2024-02-02", "B2"), holiday(None, "2024-03-03", "C")];
        let plan = plan_unit(&unit(), local, incoming);

        let names: Vec<&str> = plan.upserts().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["B2", "C"]);
        let dates: Vec<NaiveDate> = plan.delete_dates().collect();
        assert_eq!(dates, vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()]);
    }
}
