//! The seam between the mapper and the SQL driver.

use crate::connection::Database;
use crate::error::DbError;
use async_trait::async_trait;
use core_types::{Cell, RawRow, Value};
use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Row, TypeInfo, ValueRef};

/// What a write statement reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// The auto-increment key assigned by the last insert.
    pub last_insert_id: i64,
}

/// Executes parameterised SQL text and returns untyped rows.
///
/// Implementations must return cells in the order of the statement's select list.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn fetch_optional(&self, sql: &str, params: &[Value]) -> Result<Option<RawRow>, DbError>;

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<RawRow>, DbError>;

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, DbError>;
}

#[async_trait]
impl Driver for Database {
    async fn fetch_optional(&self, sql: &str, params: &[Value]) -> Result<Option<RawRow>, DbError> {
        tracing::debug!(sql, params = params.len(), "fetch_optional");
        let row = match self {
            Database::MySql(pool) => bind_mysql(sqlx::query(sql), params)
                .fetch_optional(pool)
                .await?
                .map(|row| mysql_row(&row)),
            Database::Sqlite(pool) => bind_sqlite(sqlx::query(sql), params)
                .fetch_optional(pool)
                .await?
                .map(|row| sqlite_row(&row)),
        };
        Ok(row)
    }

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<RawRow>, DbError> {
        tracing::debug!(sql, params = params.len(), "fetch_all");
        let rows = match self {
            Database::MySql(pool) => bind_mysql(sqlx::query(sql), params)
                .fetch_all(pool)
                .await?
                .iter()
                .map(mysql_row)
                .collect(),
            Database::Sqlite(pool) => bind_sqlite(sqlx::query(sql), params)
                .fetch_all(pool)
                .await?
                .iter()
                .map(sqlite_row)
                .collect(),
        };
        Ok(rows)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, DbError> {
        tracing::debug!(sql, params = params.len(), "execute");
        let outcome = match self {
            Database::MySql(pool) => {
                let result = bind_mysql(sqlx::query(sql), params).execute(pool).await?;
                ExecOutcome {
                    rows_affected: result.rows_affected(),
                    last_insert_id: clamp_unsigned(result.last_insert_id(), "last_insert_id"),
                }
            }
            Database::Sqlite(pool) => {
                let result = bind_sqlite(sqlx::query(sql), params).execute(pool).await?;
                ExecOutcome {
                    rows_affected: result.rows_affected(),
                    last_insert_id: result.last_insert_rowid(),
                }
            }
        };
        Ok(outcome)
    }
}

/// Narrows an unsigned MySQL value to `i64`, saturating at `i64::MAX`.
fn clamp_unsigned(value: u64, what: &str) -> i64 {
    i64::try_from(value).unwrap_or_else(|_| {
        tracing::warn!(value, what, "unsigned value exceeds i64::MAX; clamped");
        i64::MAX
    })
}

fn bind_mysql<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Int(value) => query.bind(*value),
            Value::Float(value) => query.bind(*value),
            Value::Text(value) => query.bind(value.clone()),
            Value::Bytes(value) => query.bind(value.clone()),
        };
    }
    query
}

fn bind_sqlite<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Int(value) => query.bind(*value),
            Value::Float(value) => query.bind(*value),
            Value::Text(value) => query.bind(value.clone()),
            Value::Bytes(value) => query.bind(value.clone()),
        };
    }
    query
}

fn mysql_row(row: &MySqlRow) -> RawRow {
    (0..row.len()).map(|idx| mysql_cell(row, idx)).collect()
}

fn mysql_cell(row: &MySqlRow, idx: usize) -> Cell {
    let type_name = match row.try_get_raw(idx) {
        Ok(value) if value.is_null() => return Cell::Null,
        Ok(value) => value.type_info().name().to_ascii_uppercase(),
        Err(_) => return Cell::Null,
    };

    let decoded = if type_name.contains("INT") || type_name == "BOOLEAN" {
        if type_name.ends_with("UNSIGNED") {
            row.try_get::<u64, _>(idx)
                .ok()
                .map(|v| Cell::Int(clamp_unsigned(v, "BIGINT UNSIGNED cell")))
        } else {
            row.try_get::<i64, _>(idx).ok().map(Cell::Int)
        }
    } else if type_name == "DOUBLE" {
        row.try_get::<f64, _>(idx).ok().map(Cell::Float)
    } else if type_name == "FLOAT" {
        row.try_get::<f32, _>(idx)
            .ok()
            .map(|v| Cell::Float(f64::from(v)))
    } else {
        None
    };

    decoded
        .or_else(|| {
            row.try_get_unchecked::<String, _>(idx)
                .ok()
                .map(|s| Cell::Bytes(s.into_bytes()))
        })
        .or_else(|| row.try_get_unchecked::<Vec<u8>, _>(idx).ok().map(Cell::Bytes))
        .unwrap_or_else(|| {
            tracing::trace!(idx, type_name = %type_name, "undecodable MySQL cell read as NULL");
            Cell::Null
        })
}

fn sqlite_row(row: &SqliteRow) -> RawRow {
    (0..row.len()).map(|idx| sqlite_cell(row, idx)).collect()
}

fn sqlite_cell(row: &SqliteRow, idx: usize) -> Cell {
    // The value's storage class, not the declared column type.
    let type_name = match row.try_get_raw(idx) {
        Ok(value) if value.is_null() => return Cell::Null,
        Ok(value) => value.type_info().name().to_ascii_uppercase(),
        Err(_) => return Cell::Null,
    };

    let decoded = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(idx).ok().map(Cell::Int),
        "REAL" => row.try_get_unchecked::<f64, _>(idx).ok().map(Cell::Float),
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(idx).ok().map(Cell::Bytes),
        _ => None,
    };

    decoded
        .or_else(|| {
            row.try_get_unchecked::<String, _>(idx)
                .ok()
                .map(|s| Cell::Bytes(s.into_bytes()))
        })
        .unwrap_or_else(|| {
            tracing::trace!(idx, type_name = %type_name, "undecodable SQLite cell read as NULL");
            Cell::Null
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_values_saturate_at_i64_max() {
        assert_eq!(clamp_unsigned(42, "id"), 42);
        assert_eq!(clamp_unsigned(i64::MAX as u64, "id"), i64::MAX);
        assert_eq!(clamp_unsigned(u64::MAX, "id"), i64::MAX);
    }
}
