// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Holiday reference data model.
//!
//! A [`Country`] is identified by its ISO-3166-1 alpha-2 code. A [`Holiday`]
//! belongs to one country and is identified, for reconciliation purposes, by
//! its [`HolidayKey`]: `(country code, year, date)`.
//!
//! # Example
//!
//! ```
//! use holiday_sync::model::{encode_type_tags, HolidayType};
//!
//! assert_eq!(encode_type_tags(&["Public".into(), "Bank".into()]), "Public,Bank");
//! assert_eq!(encode_type_tags(&[]), "Public");
//! assert_eq!("bank".parse::<HolidayType>().unwrap(), HolidayType::Bank);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator used when type tags are flattened into one column.
pub const TYPE_DELIMITER: char = ',';

/// A country known to the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Surrogate id assigned by the store
    pub id: i64,
    /// ISO-3166-1 alpha-2 code, unique and immutable
    pub code: String,
    /// Display name, updated in place when upstream renames it
    pub name: String,
}

/// A country staged for insertion (no id yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCountry {
    pub code: String,
    pub name: String,
}

/// One (country, year) reconciliation unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey {
    pub country_code: String,
    pub year: i32,
}

impl UnitKey {
    pub fn new(country_code: impl Into<String>, year: i32) -> Self {
        Self {
            country_code: country_code.into(),
            year,
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.country_code, self.year)
    }
}

/// Natural key of a holiday record.
///
/// Field order matters: the derived `Ord` groups keys by unit and then by
/// date, which lets ordered maps answer "all records of a unit" with a range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HolidayKey {
    pub country_code: String,
    pub year: i32,
    pub date: NaiveDate,
}

impl HolidayKey {
    /// Smallest key belonging to `unit`.
    pub fn unit_start(unit: &UnitKey) -> Self {
        Self {
            country_code: unit.country_code.clone(),
            year: unit.year,
            date: NaiveDate::MIN,
        }
    }

    /// Largest key belonging to `unit`.
    pub fn unit_end(unit: &UnitKey) -> Self {
        Self {
            country_code: unit.country_code.clone(),
            year: unit.year,
            date: NaiveDate::MAX,
        }
    }
}

/// A stored (or staged) public holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// Surrogate id; `None` until the store has persisted the record
    pub id: Option<i64>,
    /// Owning country
    pub country_id: i64,
    /// Denormalized from the owning country for query convenience
    pub country_code: String,
    pub year: i32,
    pub date: NaiveDate,
    pub name: String,
    pub local_name: String,
    /// Type tags joined with [`TYPE_DELIMITER`]
    pub types: String,
    pub fixed: bool,
    pub global: bool,
    /// Year the holiday was first observed, when upstream knows it
    pub launch_year: Option<i32>,
}

impl Holiday {
    #[must_use]
    pub fn key(&self) -> HolidayKey {
        HolidayKey {
            country_code: self.country_code.clone(),
            year: self.year,
            date: self.date,
        }
    }

    #[must_use]
    pub fn unit(&self) -> UnitKey {
        UnitKey::new(self.country_code.clone(), self.year)
    }

    /// Split the stored tag string back into its parts.
    #[must_use]
    pub fn type_tags(&self) -> Vec<&str> {
        self.types
            .split(TYPE_DELIMITER)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// True when every upstream-owned attribute equals `other`'s.
    ///
    /// Identity fields (id, owner, key) are not compared.
    #[must_use]
    pub fn same_attributes(&self, other: &Holiday) -> bool {
        self.name == other.name
            && self.local_name == other.local_name
            && self.types == other.types
            && self.fixed == other.fixed
            && self.global == other.global
            && self.launch_year == other.launch_year
    }

    /// Overwrite upstream-owned attributes from `other`, keeping identity.
    pub fn merge_from(&mut self, other: &Holiday) {
        self.name.clone_from(&other.name);
        self.local_name.clone_from(&other.local_name);
        self.types.clone_from(&other.types);
        self.fixed = other.fixed;
        self.global = other.global;
        self.launch_year = other.launch_year;
    }
}

/// Holiday categories published by the upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HolidayType {
    #[default]
    Public,
    Bank,
    School,
    Authorities,
    Optional,
    Observance,
}

impl HolidayType {
    pub const ALL: [HolidayType; 6] = [
        Self::Public,
        Self::Bank,
        Self::School,
        Self::Authorities,
        Self::Optional,
        Self::Observance,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Bank => "Bank",
            Self::School => "School",
            Self::Authorities => "Authorities",
            Self::Optional => "Optional",
            Self::Observance => "Observance",
        }
    }

    /// Lenient lookup: unknown or empty tags map to [`HolidayType::Public`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }

    /// Parse a delimited tag string, skipping blanks. Empty input yields `[Public]`.
    #[must_use]
    pub fn parse_list(tags: &str) -> Vec<Self> {
        let mut parsed: Vec<Self> = Vec::new();
        for tag in tags.split(TYPE_DELIMITER).map(str::trim).filter(|t| !t.is_empty()) {
            let ty = Self::from_tag(tag);
            if !parsed.contains(&ty) {
                parsed.push(ty);
            }
        }
        if parsed.is_empty() {
            parsed.push(Self::Public);
        }
        parsed
    }
}

impl fmt::Display for HolidayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown holiday type '{0}'")]
pub struct UnknownHolidayType(pub String);

impl FromStr for HolidayType {
    type Err = UnknownHolidayType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownHolidayType(s.to_string()))
    }
}

/// Flatten upstream type strings into the stored tag column.
///
/// Tags are kept verbatim (upstream spelling wins); blanks are dropped and an
/// empty list becomes the single default tag.
#[must_use]
pub fn encode_type_tags(types: &[String]) -> String {
    let tags: Vec<&str> = types
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        HolidayType::default().as_str().to_string()
    } else {
        tags.join(TYPE_DELIMITER.to_string().as_str())
    }
}
