use rusqlite::types::Value;
use rusqlite::{Statement, ToSql};

use crate::error::DispatchError;
use crate::results::ResultSet;
use crate::types::SqlValue;

fn value_from_sqlite(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Int(i),
        Value::Real(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    }
}

/// Run a prepared SELECT and collect its rows, column-name aware.
///
/// # Errors
///
/// Any `rusqlite` error raised while binding, stepping, or reading rows.
pub fn build_result_set(
    stmt: &mut Statement<'_>,
    params: &[Value],
) -> Result<ResultSet, DispatchError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(ToString::to_string)
        .collect();
    let column_count = columns.len();
    let mut result_set = ResultSet::with_columns(columns);

    let mut rows = stmt.query(&param_refs[..])?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value: Value = row.get(idx)?;
            values.push(value_from_sqlite(value));
        }
        result_set.push_values(values);
    }
    Ok(result_set)
}
