// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public types for the sync engine coordinator.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Which kind of pass produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassKind {
    /// Countries plus every configured year
    Initial,
    /// Previous and current year for known countries
    Periodic,
}

impl PassKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Periodic => "periodic",
        }
    }
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one sync pass.
///
/// Failed units count zero toward `written`; the pass keeps going after them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub kind: PassKind,
    /// Units attempted
    pub units: usize,
    /// Units reconciled without error (including those with nothing to write)
    pub succeeded: usize,
    /// Units that raised an error
    pub failed: usize,
    /// Records written (inserts + updates) across all units
    pub written: usize,
    /// The pass stopped before visiting every unit
    pub aborted: bool,
}

impl SyncReport {
    pub fn new(kind: PassKind) -> Self {
        Self {
            kind,
            units: 0,
            succeeded: 0,
            failed: 0,
            written: 0,
            aborted: false,
        }
    }

    pub fn record_success(&mut self, written: usize) {
        self.units += 1;
        self.succeeded += 1;
        self.written += written;
    }

    pub fn record_failure(&mut self) {
        self.units += 1;
        self.failed += 1;
    }

    /// Check if every unit succeeded and the pass ran to completion
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.aborted
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pass: {}/{} units ok, {} failed, {} written{}",
            self.kind,
            self.succeeded,
            self.units,
            self.failed,
            self.written,
            if self.aborted { " (aborted)" } else { "" }
        )
    }
}

/// Years covered by a periodic pass run on `today`: previous and current.
#[must_use]
pub fn periodic_years(today: NaiveDate) -> [i32; 2] {
    let year = today.year();
    [year - 1, year]
}
