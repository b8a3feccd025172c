//! Table inspection and teardown used by the `tables`, `down`, `down-all` and
//! `fresh` commands.

use crate::coerce::coerce_text;
use crate::connection::Database;
use crate::driver::Driver;
use crate::error::DbError;
use crate::sql;

/// Lists every table in the connected database, sorted by name. The
/// migration bookkeeping table is included.
pub async fn list_tables(db: &Database) -> Result<Vec<String>, DbError> {
    let query = match db {
        Database::MySql(_) => "SHOW TABLES",
        Database::Sqlite(_) => {
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        }
    };

    let mut tables: Vec<String> = db
        .fetch_all(query, &[])
        .await?
        .iter()
        .filter_map(|row| row.first().map(coerce_text))
        .collect();
    tables.sort();
    Ok(tables)
}

/// Drops one table. Returns `false` if it did not exist.
pub async fn drop_table(db: &Database, table: &str) -> Result<bool, DbError> {
    let quoted = sql::quote(table)?;
    if !list_tables(db).await?.iter().any(|name| name == table) {
        return Ok(false);
    }

    db.execute(&format!("DROP TABLE IF EXISTS {quoted}"), &[]).await?;
    tracing::info!(table, "Table dropped.");
    Ok(true)
}

/// Combines the result of the drop loop with the result of switching
/// foreign key checks back on. A drop failure takes precedence.
fn drop_outcome(
    dropped: Result<(), sqlx::Error>,
    restored: Result<(), sqlx::Error>,
) -> Result<(), DbError> {
    if let (Err(_), Err(restore_error)) = (&dropped, &restored) {
        tracing::warn!(error = %restore_error, "Failed to re-enable foreign key checks.");
    }
    dropped?;
    restored?;
    Ok(())
}

/// Drops every table, foreign keys notwithstanding, and returns their names.
///
/// The foreign key switch is per session, so all statements run on one
/// connection and the switch is restored even when a drop fails.
pub async fn drop_all(db: &Database) -> Result<Vec<String>, DbError> {
    let tables = list_tables(db).await?;
    let statements = tables
        .iter()
        .map(|table| Ok(format!("DROP TABLE IF EXISTS {}", sql::quote(table)?)))
        .collect::<Result<Vec<_>, DbError>>()?;

    match db {
        Database::MySql(pool) => {
            let mut conn = pool.acquire().await?;
            sqlx::query("SET FOREIGN_KEY_CHECKS = 0").execute(&mut *conn).await?;
            let mut outcome = Ok(());
            for statement in &statements {
                if let Err(e) = sqlx::query(statement).execute(&mut *conn).await {
                    outcome = Err(e);
                    break;
                }
            }
            let restored = sqlx::query("SET FOREIGN_KEY_CHECKS = 1").execute(&mut *conn).await;
            drop_outcome(outcome, restored.map(|_| ()))?;
        }
        Database::Sqlite(pool) => {
            let mut conn = pool.acquire().await?;
            sqlx::query("PRAGMA foreign_keys = OFF").execute(&mut *conn).await?;
            let mut outcome = Ok(());
            for statement in &statements {
                if let Err(e) = sqlx::query(statement).execute(&mut *conn).await {
                    outcome = Err(e);
                    break;
                }
            }
            let restored = sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await;
            drop_outcome(outcome, restored.map(|_| ()))?;
        }
    }

    tracing::info!(count = tables.len(), "All tables dropped.");
    Ok(tables)
}
