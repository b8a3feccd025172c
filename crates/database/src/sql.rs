//! SQL text builders. Identifiers are checked against an allow-list and then
//! wrapped in backticks; every data value goes through a `?` placeholder.

use crate::DbError;

/// MySQL's identifier length limit.
const MAX_IDENTIFIER_LEN: usize = 64;

/// Accepts `[A-Za-z_][A-Za-z0-9_]*` up to 64 characters.
pub fn check_identifier(name: &str) -> Result<&str, DbError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= MAX_IDENTIFIER_LEN {
        Ok(name)
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

pub fn quote(name: &str) -> Result<String, DbError> {
    Ok(format!("`{}`", check_identifier(name)?))
}

fn column_list(columns: &[&str]) -> Result<String, DbError> {
    let quoted = columns
        .iter()
        .map(|column| quote(column))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quoted.join(", "))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub fn select_all(table: &str, columns: &[&str]) -> Result<String, DbError> {
    Ok(format!("SELECT {} FROM {}", column_list(columns)?, quote(table)?))
}

pub fn select_by_key(table: &str, columns: &[&str], key: &str) -> Result<String, DbError> {
    Ok(format!(
        "{} WHERE {} = ?",
        select_all(table, columns)?,
        quote(key)?
    ))
}

pub fn insert(table: &str, columns: &[&str]) -> Result<String, DbError> {
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(table)?,
        column_list(columns)?,
        placeholders(columns.len())
    ))
}

pub fn update(table: &str, columns: &[&str], key: &str) -> Result<String, DbError> {
    let assignments = columns
        .iter()
        .map(|column| Ok(format!("{} = ?", quote(column)?)))
        .collect::<Result<Vec<_>, DbError>>()?;
    Ok(format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote(table)?,
        assignments.join(", "),
        quote(key)?
    ))
}

pub fn delete(table: &str, key: &str) -> Result<String, DbError> {
    Ok(format!("DELETE FROM {} WHERE {} = ?", quote(table)?, quote(key)?))
}
