// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Infrastructure
//!
//! Filtered, paginated reads over stored holidays.
//!
//! # Architecture
//!
//! ```text
//! HolidayFilter + PageRequest
//!     ↓
//!     ├─→ HolidayFilter::matches → MemoryStore scan
//!     └─→ SqlTranslator → WHERE clause for SqlStore
//!     ↓
//! Page<Holiday> → Page<HolidayView> (country names resolved)
//! ```
//!
//! Results are ordered by date ascending; ties break on country code, then id.

mod filter;
mod page;
mod sql_translator;
mod view;

pub use filter::HolidayFilter;
pub use page::{Page, PageRequest, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use sql_translator::{SqlParam, SqlQuery, SqlTranslator};
pub use view::HolidayView;
