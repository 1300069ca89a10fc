//! MySQL column decoding.
//!
//! This module maps MySQL result cells onto [`CellValue`].
//!
//! # Architecture
//!
//! Decoding depends on the wire protocol the statement ran under:
//! 1. Text protocol (`COM_QUERY`, used for SQL without bound parameters): every
//!    non-NULL value arrives as the server's own textual rendering, so the bytes
//!    are taken verbatim.
//! 2. Binary protocol (prepared statements): numeric and temporal values arrive
//!    packed, so `TypeCategory` picks a typed decoder before rendering to text.
//!
//! Binary column types always become [`CellValue::Raw`]; renderers decide how
//! to show them.

use crate::error::{DbError, DbResult};
use crate::models::{CellValue, Row as ResultRow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    SignedInteger,
    UnsignedInteger,
    Float,
    Date,
    DateTime,
    Time,
    Binary,
    Text,
}

/// Classify a MySQL type name (as reported by the driver) into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.to_uppercase();

    if upper.contains("BLOB") || upper.contains("BINARY") || upper == "BIT" || upper == "GEOMETRY"
    {
        return TypeCategory::Binary;
    }

    if upper.contains("INT") || upper == "YEAR" || upper == "BOOLEAN" {
        if upper.contains("UNSIGNED") {
            return TypeCategory::UnsignedInteger;
        }
        return TypeCategory::SignedInteger;
    }

    if upper == "FLOAT" || upper == "DOUBLE" {
        return TypeCategory::Float;
    }

    match upper.as_str() {
        "DATE" => TypeCategory::Date,
        "DATETIME" | "TIMESTAMP" => TypeCategory::DateTime,
        "TIME" => TypeCategory::Time,
        // VARCHAR, TEXT, CHAR, DECIMAL, ENUM, SET, JSON, NULL...
        _ => TypeCategory::Text,
    }
}

/// Wire protocol a result set was read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowProtocol {
    Text,
    Binary,
}

impl RowProtocol {
    /// Protocol sqlx uses for a statement with the given number of bound parameters.
    pub fn for_param_count(count: usize) -> Self {
        if count == 0 { Self::Text } else { Self::Binary }
    }
}

// =============================================================================
// Row Decoding
// =============================================================================

/// Column names of a row, in the order the server reported them.
pub fn column_names(row: &MySqlRow) -> Vec<String> {
    row.columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect()
}

/// Decode every cell of a row. Any failure aborts the whole row.
pub fn decode_row(row: &MySqlRow, protocol: RowProtocol) -> DbResult<ResultRow> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let category = categorize_type(col.type_info().name());
            decode_cell(row, idx, category, protocol).map_err(|e| {
                DbError::execution(
                    format!("failed to scan row: column '{}': {}", col.name(), e),
                    None,
                )
            })
        })
        .collect()
}

fn decode_cell(
    row: &MySqlRow,
    idx: usize,
    category: TypeCategory,
    protocol: RowProtocol,
) -> Result<CellValue, sqlx::Error> {
    match (protocol, category) {
        (_, TypeCategory::Binary) => decode_raw(row, idx),
        (RowProtocol::Text, _) | (RowProtocol::Binary, TypeCategory::Text) => {
            decode_bytes(row, idx)
        }
        (RowProtocol::Binary, TypeCategory::SignedInteger) => decode_display::<i64>(row, idx),
        (RowProtocol::Binary, TypeCategory::UnsignedInteger) => decode_display::<u64>(row, idx),
        (RowProtocol::Binary, TypeCategory::Float) => decode_display::<f64>(row, idx),
        (RowProtocol::Binary, TypeCategory::Date) => decode_display::<NaiveDate>(row, idx),
        (RowProtocol::Binary, TypeCategory::DateTime) => {
            decode_display::<NaiveDateTime>(row, idx)
        }
        (RowProtocol::Binary, TypeCategory::Time) => decode_display::<NaiveTime>(row, idx),
    }
}

/// Bytes as sent by the server; valid UTF-8 becomes text.
fn decode_bytes(row: &MySqlRow, idx: usize) -> Result<CellValue, sqlx::Error> {
    let value = row.try_get_unchecked::<Option<&[u8]>, _>(idx)?;
    Ok(match value {
        None => CellValue::Null,
        Some(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => CellValue::Text(s.to_string()),
            Err(_) => CellValue::Raw(bytes.to_vec()),
        },
    })
}

fn decode_raw(row: &MySqlRow, idx: usize) -> Result<CellValue, sqlx::Error> {
    let value = row.try_get_unchecked::<Option<&[u8]>, _>(idx)?;
    Ok(value
        .map(|bytes| CellValue::Raw(bytes.to_vec()))
        .unwrap_or(CellValue::Null))
}

fn decode_display<T>(row: &MySqlRow, idx: usize) -> Result<CellValue, sqlx::Error>
where
    T: for<'r> sqlx::Decode<'r, sqlx::MySql> + std::fmt::Display,
{
    let value = row.try_get_unchecked::<Option<T>, _>(idx)?;
    Ok(value
        .map(|v| CellValue::Text(v.to_string()))
        .unwrap_or(CellValue::Null))
}
