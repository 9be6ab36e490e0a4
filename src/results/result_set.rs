use std::collections::HashMap;
use std::sync::Arc;

use super::row::Row;
use crate::types::SqlValue;

/// Rows returned by a query, plus the affected-row count for DML paths.
///
/// Column names live in one `Arc` shared by every row; the name-to-index map
/// is built once when the columns are set.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    rows: Vec<Row>,
    rows_affected: usize,
}

impl ResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty result set with the given column names.
    #[must_use]
    pub fn with_columns(columns: Vec<String>) -> Self {
        let column_index = Arc::new(
            columns
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.clone(), idx))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            columns: Arc::new(columns),
            column_index,
            rows: Vec::new(),
            rows_affected: 0,
        }
    }

    /// Append a row of values aligned with the column names.
    pub fn push_values(&mut self, values: Vec<SqlValue>) {
        self.rows.push(Row::new(
            Arc::clone(&self.columns),
            Arc::clone(&self.column_index),
            values,
        ));
        self.rows_affected += 1;
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows affected by the producing statement. For SELECT paths this
    /// mirrors the row count.
    #[must_use]
    pub fn rows_affected(&self) -> usize {
        self.rows_affected
    }

    pub fn set_rows_affected(&mut self, rows_affected: usize) {
        self.rows_affected = rows_affected;
    }
}
