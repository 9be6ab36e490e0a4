use rusqlite::types::Value;

use crate::types::SqlValue;

/// Convert one bound value into its `SQLite` representation.
///
/// Booleans become 0/1 integers, timestamps text in `%F %T%.f`, JSON its
/// serialized text.
#[must_use]
pub fn sql_value_to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Int(i) => Value::Integer(*i),
        SqlValue::Float(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        SqlValue::Null => Value::Null,
        SqlValue::Json(json) => Value::Text(json.to_string()),
        SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

pub(super) fn to_sqlite_values(params: &[SqlValue]) -> Vec<Value> {
    params.iter().map(sql_value_to_sqlite).collect()
}
