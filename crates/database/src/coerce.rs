//! Value coercion: writes untyped driver cells into typed record fields.
//!
//! Coercion is lenient. A cell that cannot be converted to the destination
//! kind leaves the field at whatever it held before, which for a freshly
//! constructed record is its zero value. No error is ever raised here.

use crate::schema::persisted_name;
use core_types::{Cell, Fields, Slot};

/// Writes `row[i]` into the field whose persisted name equals `columns[i]`.
///
/// Matching is by name, not by position within the record. When two fields
/// map to the same column, only the first declared one is written.
pub fn populate(dest: &mut dyn Fields, columns: &[&str], row: &[Cell]) {
    for (column, cell) in columns.iter().zip(row) {
        let Some(meta) = dest
            .fields()
            .iter()
            .find(|meta| persisted_name(meta) == Some(*column))
        else {
            tracing::trace!(record = dest.type_name(), column, "no field for column");
            continue;
        };

        match dest.slot(meta.field) {
            Some(slot) => assign(slot, cell, column),
            None => tracing::trace!(field = meta.field, "field has no storable slot"),
        }
    }
}

fn assign(slot: Slot<'_>, cell: &Cell, column: &str) {
    match slot {
        Slot::Text(target) => *target = coerce_text(cell),
        Slot::Int(target) => match coerce_int(cell) {
            Some(value) => *target = value,
            None => tracing::trace!(column, ?cell, "cell is not an integer; field left unset"),
        },
        Slot::Float(target) => match coerce_float(cell) {
            Some(value) => *target = value,
            None => tracing::trace!(column, ?cell, "cell is not a float; field left unset"),
        },
        Slot::Record(nested) => populate(nested, &[column], std::slice::from_ref(cell)),
    }
}

/// Bytes and strings are taken as-is, NULL becomes empty, numbers are formatted.
pub fn coerce_text(cell: &Cell) -> String {
    match cell {
        Cell::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Cell::Text(text) => text.clone(),
        Cell::Null => String::new(),
        Cell::Int(value) => value.to_string(),
        Cell::Float(value) => value.to_string(),
    }
}

/// Integers pass through, floats are truncated, bytes must parse as a decimal
/// integer. Strings and NULL do not convert.
pub fn coerce_int(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Int(value) => Some(*value),
        Cell::Float(value) => Some(value.trunc() as i64),
        Cell::Bytes(bytes) => std::str::from_utf8(bytes).ok()?.parse().ok(),
        Cell::Text(_) | Cell::Null => None,
    }
}

/// Floats pass through and bytes must parse as a float. Integers, strings
/// and NULL do not convert.
pub fn coerce_float(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Float(value) => Some(*value),
        Cell::Bytes(bytes) => std::str::from_utf8(bytes).ok()?.parse().ok(),
        Cell::Int(_) | Cell::Text(_) | Cell::Null => None,
    }
}
