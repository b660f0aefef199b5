// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

pub mod memory;
pub mod sql;
pub mod traits;

pub use memory::MemoryStore;
pub use sql::SqlStore;
pub use traits::{CountryChanges, CountryStore, HolidayStore, StorageError};
