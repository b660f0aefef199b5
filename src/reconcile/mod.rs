// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Reconciliation of local state against the upstream provider.
//!
//! Both reconcilers compute a complete change plan first and then hand it to
//! the store in a single call, so every write of a country list or a unit is
//! one transaction.

mod countries;
mod diff;
mod holidays;

pub use countries::{plan_country_changes, CountryReconciler};
pub use diff::{plan_unit, UnitPlan};
pub use holidays::{to_holiday, HolidayReconciler};
