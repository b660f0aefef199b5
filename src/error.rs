// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Engine-level error taxonomy.
//!
//! Client errors (unknown country, invalid input) propagate to the caller
//! unchanged. Transient upstream failures never get here: the fetcher absorbs
//! them. Everything else is a server failure whose details stay in the logs.

use thiserror::Error;

use crate::provider::ProviderError;
use crate::storage::traits::StorageError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Country not found: {country_code}")]
    CountryNotFound { country_code: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Upstream provider failure: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    pub fn country_not_found(country_code: impl Into<String>) -> Self {
        Self::CountryNotFound {
            country_code: country_code.into(),
        }
    }

    /// Whether the caller caused the failure (maps to a 4xx-style response).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::CountryNotFound { .. } | Self::Validation(_))
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::CountryNotFound { .. } => "COUNTRY_001",
            Self::Validation(_) => "VALIDATION_001",
            Self::Upstream(_) => "EXTERNAL_001",
            Self::Storage(_) => "SERVER_001",
            Self::Internal(_) => "SERVER_002",
        }
    }

    /// Message safe to show a caller. Server failures are reduced to a
    /// generic text.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "An internal error occurred".to_string()
        }
    }
}
