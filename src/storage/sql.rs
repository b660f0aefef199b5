// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL storage backend (SQLite or MySQL through the sqlx `Any` driver).
//!
//! ```sql
//! CREATE TABLE countries (
//!   id BIGINT PRIMARY KEY AUTO_INCREMENT,
//!   country_code VARCHAR(2) NOT NULL UNIQUE,
//!   name VARCHAR(255) NOT NULL
//! );
//! CREATE TABLE public_holidays (
//!   id BIGINT PRIMARY KEY AUTO_INCREMENT,
//!   country_id BIGINT NOT NULL,
//!   country_code VARCHAR(2) NOT NULL,
//!   holiday_year BIGINT NOT NULL,
//!   holiday_date CHAR(10) NOT NULL,   -- ISO YYYY-MM-DD
//!   name, local_name, types,
//!   is_fixed BIGINT, is_global BIGINT, launch_year BIGINT NULL,
//!   UNIQUE (country_code, holiday_year, holiday_date)
//! );
//! ```
//!
//! ## sqlx Any Driver Quirks
//!
//! - No native date or bool mapping: dates are ISO text (so text order is date
//!   order) and flags are 0/1 integers.
//! - MySQL text columns may come back as bytes; reads try `String` first.
//! - Integer width depends on the backend; reads widen to `i64`.

use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row};
use tracing::{debug, instrument};

use super::traits::{CountryChanges, CountryStore, HolidayStore, StorageError};
use crate::model::{Country, Holiday, NewCountry, UnitKey};
use crate::reconcile::UnitPlan;
use crate::resilience::retry::{retry, retry_if, RetryConfig};
use crate::search::{HolidayFilter, Page, PageRequest, SqlParam, SqlTranslator};

// SQLx `Any` driver requires runtime installation
static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

/// Rows per multi-row INSERT. 10 binds per holiday keeps a chunk under
/// SQLite's default variable limit.
const CHUNK_SIZE: usize = 64;

const HOLIDAY_COLUMNS: &str = "id, country_id, country_code, holiday_year, holiday_date, name, \
     local_name, types, is_fixed, is_global, launch_year";

type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

pub struct SqlStore {
    pool: AnyPool,
    is_sqlite: bool,
}

impl SqlStore {
    /// Connect with the default pool size.
    pub async fn new(connection_string: &str) -> Result<Self, StorageError> {
        Self::with_max_connections(connection_string, 10).await
    }

    /// Connect with startup-mode retry (fails fast if config is wrong) and
    /// create the schema if missing.
    pub async fn with_max_connections(
        connection_string: &str,
        max_connections: u32,
    ) -> Result<Self, StorageError> {
        install_drivers();

        let is_sqlite = connection_string.starts_with("sqlite:");
        let in_memory = is_sqlite
            && (connection_string.contains(":memory:") || connection_string.contains("mode=memory"));

        let pool = retry("sql_connect", &RetryConfig::startup(), || async {
            let options = if in_memory {
                // Every connection to an in-memory database is a separate
                // database; pin one connection for the pool's lifetime
                AnyPoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                AnyPoolOptions::new()
                    .max_connections(max_connections.max(1))
                    .idle_timeout(Duration::from_secs(300))
            };
            options
                .acquire_timeout(Duration::from_secs(10))
                .connect(connection_string)
                .await
                .map_err(backend)
        })
        .await?;

        let store = Self { pool, is_sqlite };

        if is_sqlite && !in_memory {
            store.enable_wal_mode().await?;
        }

        store.init_schema().await?;
        Ok(store)
    }

    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.is_sqlite
    }

    /// Enable WAL (Write-Ahead Logging) mode for SQLite so search reads do
    /// not block reconciliation writes.
    async fn enable_wal_mode(&self) -> Result<(), StorageError> {
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to enable WAL mode: {}", e)))?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to set synchronous mode: {}", e)))?;

        Ok(())
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        let statements: &[&str] = if self.is_sqlite {
            &[
                r#"
                CREATE TABLE IF NOT EXISTS countries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    country_code TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS public_holidays (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    country_id INTEGER NOT NULL REFERENCES countries(id),
                    country_code TEXT NOT NULL,
                    holiday_year INTEGER NOT NULL,
                    holiday_date TEXT NOT NULL,
                    name TEXT NOT NULL,
                    local_name TEXT NOT NULL,
                    types TEXT NOT NULL,
                    is_fixed INTEGER NOT NULL DEFAULT 0,
                    is_global INTEGER NOT NULL DEFAULT 0,
                    launch_year INTEGER,
                    UNIQUE (country_code, holiday_year, holiday_date)
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_holidays_date ON public_holidays (holiday_date)",
            ]
        } else {
            &[
                r#"
                CREATE TABLE IF NOT EXISTS countries (
                    id BIGINT PRIMARY KEY AUTO_INCREMENT,
                    country_code VARCHAR(2) NOT NULL,
                    name VARCHAR(255) NOT NULL,
                    UNIQUE KEY uk_country_code (country_code)
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS public_holidays (
                    id BIGINT PRIMARY KEY AUTO_INCREMENT,
                    country_id BIGINT NOT NULL,
                    country_code VARCHAR(2) NOT NULL,
                    holiday_year BIGINT NOT NULL,
                    holiday_date CHAR(10) NOT NULL,
                    name VARCHAR(255) NOT NULL,
                    local_name VARCHAR(255) NOT NULL,
                    types VARCHAR(255) NOT NULL,
                    is_fixed BIGINT NOT NULL DEFAULT 0,
                    is_global BIGINT NOT NULL DEFAULT 0,
                    launch_year BIGINT NULL,
                    UNIQUE KEY uk_holiday_unit_date (country_code, holiday_year, holiday_date),
                    INDEX idx_holidays_date (holiday_date),
                    INDEX idx_holidays_country (country_id)
                )
                "#,
            ]
        };

        for sql in statements {
            retry("sql_init_schema", &RetryConfig::startup(), || async {
                sqlx::query(sql).execute(&self.pool).await.map_err(backend)
            })
            .await?;
        }
        Ok(())
    }

    fn holiday_upsert_sql(&self, rows: usize) -> String {
        let placeholders = vec!["(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"; rows].join(", ");
        let insert = format!(
            "INSERT INTO public_holidays (country_id, country_code, holiday_year, holiday_date, \
             name, local_name, types, is_fixed, is_global, launch_year) VALUES {}",
            placeholders
        );
        // A concurrent pass may have inserted the same key; take the newer values
        if self.is_sqlite {
            format!(
                "{} ON CONFLICT(country_code, holiday_year, holiday_date) DO UPDATE SET \
                    name = excluded.name, \
                    local_name = excluded.local_name, \
                    types = excluded.types, \
                    is_fixed = excluded.is_fixed, \
                    is_global = excluded.is_global, \
                    launch_year = excluded.launch_year",
                insert
            )
        } else {
            format!(
                "{} ON DUPLICATE KEY UPDATE \
                    name = VALUES(name), \
                    local_name = VALUES(local_name), \
                    types = VALUES(types), \
                    is_fixed = VALUES(is_fixed), \
                    is_global = VALUES(is_global), \
                    launch_year = VALUES(launch_year)",
                insert
            )
        }
    }

    fn country_insert_sql(&self, rows: usize) -> String {
        let placeholders = vec!["(?, ?)"; rows].join(", ");
        if self.is_sqlite {
            format!(
                "INSERT INTO countries (country_code, name) VALUES {} \
                 ON CONFLICT(country_code) DO NOTHING",
                placeholders
            )
        } else {
            format!(
                "INSERT INTO countries (country_code, name) VALUES {} \
                 ON DUPLICATE KEY UPDATE country_code = country_code",
                placeholders
            )
        }
    }
}

// Row decoding helpers

fn get_text(row: &AnyRow, column: &str) -> Result<String, StorageError> {
    // Try String first (SQLite TEXT), then bytes (MySQL text as blob)
    row.try_get::<String, _>(column)
        .or_else(|_| {
            row.try_get::<Vec<u8>, _>(column)
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        })
        .map_err(|e| StorageError::Backend(format!("column '{}': {}", column, e)))
}

fn get_i64(row: &AnyRow, column: &str) -> Result<i64, StorageError> {
    row.try_get::<i64, _>(column)
        .or_else(|_| row.try_get::<i32, _>(column).map(i64::from))
        .or_else(|_| row.try_get::<i16, _>(column).map(i64::from))
        .map_err(|e| StorageError::Backend(format!("column '{}': {}", column, e)))
}

fn get_opt_i64(row: &AnyRow, column: &str) -> Result<Option<i64>, StorageError> {
    row.try_get::<Option<i64>, _>(column)
        .or_else(|_| row.try_get::<Option<i32>, _>(column).map(|v| v.map(i64::from)))
        .map_err(|e| StorageError::Backend(format!("column '{}': {}", column, e)))
}

fn to_i32(value: i64, id: i64, column: &str) -> Result<i32, StorageError> {
    i32::try_from(value).map_err(|_| StorageError::Corruption {
        id: id.to_string(),
        detail: format!("{} out of range: {}", column, value),
    })
}

fn row_to_country(row: &AnyRow) -> Result<Country, StorageError> {
    Ok(Country {
        id: get_i64(row, "id")?,
        code: get_text(row, "country_code")?,
        name: get_text(row, "name")?,
    })
}

fn row_to_holiday(row: &AnyRow) -> Result<Holiday, StorageError> {
    let id = get_i64(row, "id")?;
    let raw_date = get_text(row, "holiday_date")?;
    let date = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d").map_err(|e| {
        StorageError::Corruption {
            id: id.to_string(),
            detail: format!("unparseable holiday_date '{}': {}", raw_date, e),
        }
    })?;
    let launch_year = match get_opt_i64(row, "launch_year")? {
        Some(v) => Some(to_i32(v, id, "launch_year")?),
        None => None,
    };

    Ok(Holiday {
        id: Some(id),
        country_id: get_i64(row, "country_id")?,
        country_code: get_text(row, "country_code")?,
        year: to_i32(get_i64(row, "holiday_year")?, id, "holiday_year")?,
        date,
        name: get_text(row, "name")?,
        local_name: get_text(row, "local_name")?,
        types: get_text(row, "types")?,
        fixed: get_i64(row, "is_fixed")? != 0,
        global: get_i64(row, "is_global")? != 0,
        launch_year,
    })
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn flag(value: bool) -> i64 {
    i64::from(value)
}

fn bind_params<'q>(mut query: AnyQuery<'q>, params: &[SqlParam]) -> AnyQuery<'q> {
    for param in params {
        query = match param {
            SqlParam::Text(s) => query.bind(s.clone()),
            SqlParam::Integer(n) => query.bind(*n),
        };
    }
    query
}

#[async_trait]
impl CountryStore for SqlStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Country>, StorageError> {
        retry("sql_find_country", &RetryConfig::query(), || async {
            let row = sqlx::query("SELECT id, country_code, name FROM countries WHERE country_code = ?")
                .bind(code.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
            row.as_ref().map(row_to_country).transpose()
        })
        .await
    }

    async fn exists(&self, code: &str) -> Result<bool, StorageError> {
        retry("sql_country_exists", &RetryConfig::query(), || async {
            let row = sqlx::query("SELECT 1 FROM countries WHERE country_code = ? LIMIT 1")
                .bind(code.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
            Ok(row.is_some())
        })
        .await
    }

    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Country>, StorageError> {
        let mut found = Vec::with_capacity(codes.len());
        // Chunked IN queries to avoid overly large statements
        for chunk in codes.chunks(CHUNK_SIZE) {
            let sql = format!(
                "SELECT id, country_code, name FROM countries WHERE country_code IN ({})",
                vec!["?"; chunk.len()].join(", ")
            );
            let rows = retry("sql_find_countries", &RetryConfig::query(), || async {
                let mut query = sqlx::query(&sql);
                for code in chunk {
                    query = query.bind(code.clone());
                }
                query.fetch_all(&self.pool).await.map_err(backend)
            })
            .await?;
            for row in &rows {
                found.push(row_to_country(row)?);
            }
        }
        found.sort_by(|a, b| a.code.cmp(&b.code));
        found.dedup_by(|a, b| a.code == b.code);
        Ok(found)
    }

    async fn find_all(&self) -> Result<Vec<Country>, StorageError> {
        let rows = retry("sql_all_countries", &RetryConfig::query(), || async {
            sqlx::query("SELECT id, country_code, name FROM countries ORDER BY country_code")
                .fetch_all(&self.pool)
                .await
                .map_err(backend)
        })
        .await?;
        rows.iter().map(row_to_country).collect()
    }

    #[instrument(skip(self, changes), fields(inserts = changes.inserts.len(), renames = changes.renames.len()))]
    async fn apply_country_changes(&self, changes: &CountryChanges) -> Result<usize, StorageError> {
        if changes.is_empty() {
            return Ok(0);
        }

        retry("sql_apply_countries", &RetryConfig::query(), || async {
            let mut tx = self.pool.begin().await.map_err(backend)?;
            let mut written = 0u64;

            for renamed in &changes.renames {
                written += sqlx::query("UPDATE countries SET name = ? WHERE country_code = ?")
                    .bind(renamed.name.clone())
                    .bind(renamed.code.clone())
                    .execute(&mut *tx)
                    .await
                    .map_err(backend)?
                    .rows_affected();
            }

            for chunk in changes.inserts.chunks(CHUNK_SIZE) {
                let sql = self.country_insert_sql(chunk.len());
                let mut query = sqlx::query(&sql);
                for NewCountry { code, name } in chunk {
                    query = query.bind(code.clone()).bind(name.clone());
                }
                written += query.execute(&mut *tx).await.map_err(backend)?.rows_affected();
            }

            tx.commit().await.map_err(backend)?;
            debug!(written, "Country changes committed");
            Ok(usize::try_from(written).unwrap_or(usize::MAX))
        })
        .await
    }
}

#[async_trait]
impl HolidayStore for SqlStore {
    async fn find_unit(&self, unit: &UnitKey) -> Result<Vec<Holiday>, StorageError> {
        let sql = format!(
            "SELECT {} FROM public_holidays WHERE country_code = ? AND holiday_year = ? \
             ORDER BY holiday_date",
            HOLIDAY_COLUMNS
        );
        let rows = retry("sql_find_unit", &RetryConfig::query(), || async {
            sqlx::query(&sql)
                .bind(unit.country_code.clone())
                .bind(i64::from(unit.year))
                .fetch_all(&self.pool)
                .await
                .map_err(backend)
        })
        .await?;
        rows.iter().map(row_to_holiday).collect()
    }

    #[instrument(skip(self, plan), fields(unit = %plan.unit))]
    async fn apply_unit_plan(&self, plan: &UnitPlan) -> Result<usize, StorageError> {
        if plan.is_empty() {
            return Ok(0);
        }
        let unit = &plan.unit;
        let delete_dates: Vec<String> = plan.delete_dates().map(iso).collect();

        let apply = || async {
            let mut tx = self.pool.begin().await.map_err(backend)?;

            for chunk in delete_dates.chunks(CHUNK_SIZE) {
                let sql = format!(
                    "DELETE FROM public_holidays WHERE country_code = ? AND holiday_year = ? \
                     AND holiday_date IN ({})",
                    vec!["?"; chunk.len()].join(", ")
                );
                let mut query = sqlx::query(&sql)
                    .bind(unit.country_code.clone())
                    .bind(i64::from(unit.year));
                for date in chunk {
                    query = query.bind(date.clone());
                }
                query.execute(&mut *tx).await.map_err(backend)?;
            }

            for h in &plan.updates {
                let result = sqlx::query(
                    "UPDATE public_holidays SET name = ?, local_name = ?, types = ?, \
                     is_fixed = ?, is_global = ?, launch_year = ? \
                     WHERE country_code = ? AND holiday_year = ? AND holiday_date = ?",
                )
                .bind(h.name.clone())
                .bind(h.local_name.clone())
                .bind(h.types.clone())
                .bind(flag(h.fixed))
                .bind(flag(h.global))
                .bind(h.launch_year.map(i64::from))
                .bind(h.country_code.clone())
                .bind(i64::from(h.year))
                .bind(iso(h.date))
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
                // Dropping `tx` rolls the unit back
                if result.rows_affected() != 1 {
                    return Err(StorageError::Corruption {
                        id: format!("{}/{}", h.country_code, h.date),
                        detail: "update target is not stored".into(),
                    });
                }
            }

            for chunk in plan.inserts.chunks(CHUNK_SIZE) {
                let sql = self.holiday_upsert_sql(chunk.len());
                let mut query = sqlx::query(&sql);
                for h in chunk {
                    query = query
                        .bind(h.country_id)
                        .bind(h.country_code.clone())
                        .bind(i64::from(h.year))
                        .bind(iso(h.date))
                        .bind(h.name.clone())
                        .bind(h.local_name.clone())
                        .bind(h.types.clone())
                        .bind(flag(h.fixed))
                        .bind(flag(h.global))
                        .bind(h.launch_year.map(i64::from));
                }
                query.execute(&mut *tx).await.map_err(backend)?;
            }

            tx.commit().await.map_err(backend)?;
            Ok(plan.written())
        };

        retry_if("sql_apply_unit", &RetryConfig::query(), apply, |e| {
            matches!(e, StorageError::Backend(_))
        })
        .await
    }

    async fn delete_unit(&self, unit: &UnitKey) -> Result<usize, StorageError> {
        retry("sql_delete_unit", &RetryConfig::query(), || async {
            let result = sqlx::query(
                "DELETE FROM public_holidays WHERE country_code = ? AND holiday_year = ?",
            )
            .bind(unit.country_code.clone())
            .bind(i64::from(unit.year))
            .execute(&self.pool)
            .await
            .map_err(backend)?;
            Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
        })
        .await
    }

    async fn search(
        &self,
        filter: &HolidayFilter,
        page: &PageRequest,
    ) -> Result<Page<Holiday>, StorageError> {
        let where_clause = SqlTranslator::translate(filter);
        let count_sql = format!(
            "SELECT COUNT(*) AS cnt FROM public_holidays WHERE {}",
            where_clause.clause
        );
        let page_sql = format!(
            "SELECT {} FROM public_holidays WHERE {} \
             ORDER BY holiday_date, country_code, id LIMIT ? OFFSET ?",
            HOLIDAY_COLUMNS, where_clause.clause
        );
        let limit = i64::from(page.size);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let (total, rows) = retry("sql_search", &RetryConfig::query(), || async {
            let count_row = bind_params(sqlx::query(&count_sql), &where_clause.params)
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;
            let total = get_i64(&count_row, "cnt")?;
            let rows = bind_params(sqlx::query(&page_sql), &where_clause.params)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;
            Ok((total, rows))
        })
        .await?;

        let content = rows.iter().map(row_to_holiday).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(content, page, u64::try_from(total).unwrap_or(0)))
    }
}
