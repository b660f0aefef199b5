// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL Translator
//!
//! Translates a [`HolidayFilter`] to a parameterized WHERE clause over the
//! `public_holidays` table. Dates are stored as ISO `YYYY-MM-DD` text, so
//! lexicographic comparison is date comparison.
//!
//! # SQL Syntax Generated
//!
//! ```sql
//! country_code = ?                      -- Exact country
//! holiday_year = ?                      -- Exact year
//! holiday_date >= ? / holiday_date <= ? -- Inclusive range
//! types LIKE ? ESCAPE '!'               -- Type substring
//! ```

use super::filter::HolidayFilter;

/// Escape character for LIKE patterns. Accepted by both SQLite and MySQL
/// without extra quoting.
const LIKE_ESCAPE: char = '!';

/// SQL query translator for holiday filters
pub struct SqlTranslator;

/// SQL query result with parameterized placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    /// The WHERE clause (without "WHERE" keyword)
    pub clause: String,
    /// The parameter values in order
    pub params: Vec<SqlParam>,
}

/// SQL parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
}

impl SqlTranslator {
    /// Translate a filter to a parameterized SQL WHERE clause.
    ///
    /// Uses `?` placeholders. An unrestricted filter yields `1=1`.
    pub fn translate(filter: &HolidayFilter) -> SqlQuery {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(code) = filter.country_predicate() {
            conditions.push("country_code = ?".to_string());
            params.push(SqlParam::Text(code.to_string()));
        }
        if let Some(year) = filter.year {
            conditions.push("holiday_year = ?".to_string());
            params.push(SqlParam::Integer(i64::from(year)));
        }
        if let Some(from) = filter.from {
            conditions.push("holiday_date >= ?".to_string());
            params.push(SqlParam::Text(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = filter.to {
            conditions.push("holiday_date <= ?".to_string());
            params.push(SqlParam::Text(to.format("%Y-%m-%d").to_string()));
        }
        if let Some(needle) = filter.types_predicate() {
            conditions.push(format!("types LIKE ? ESCAPE '{}'", LIKE_ESCAPE));
            params.push(SqlParam::Text(format!("%{}%", Self::escape_like(needle))));
        }

        let clause = if conditions.is_empty() {
            "1=1".to_string() // Always true - no predicates
        } else {
            conditions.join(" AND ")
        };
        SqlQuery { clause, params }
    }

    /// Translate to a clause with inline values.
    ///
    /// Warning: Only use for debugging, not for actual queries (SQL injection risk)
    pub fn translate_inline(filter: &HolidayFilter) -> String {
        let query = Self::translate(filter);
        let mut result = query.clause;
        for param in query.params {
            let value = match param {
                SqlParam::Text(s) => format!("'{}'", s.replace('\'', "''")),
                SqlParam::Integer(n) => n.to_string(),
            };
            result = result.replacen('?', &value, 1);
        }
        result
    }

    fn escape_like(needle: &str) -> String {
        let mut escaped = String::with_capacity(needle.len());
        for c in needle.chars() {
            if c == '%' || c == '_' || c == LIKE_ESCAPE {
                escaped.push(LIKE_ESCAPE);
            }
            escaped.push(c);
        }
        escaped
    }
}
