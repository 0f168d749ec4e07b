//! Driver-neutral parameter and cell values.

use crate::error::{DbError, DbResult};

/// A bound parameter or a decoded column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

/// One result row, columns kept in statement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn get_i64(&self, column: &str) -> DbResult<i64> {
        match self.get(column) {
            Some(SqlValue::Int(value)) => Ok(*value),
            _ => Err(DbError::column_mismatch(column, "integer")),
        }
    }

    /// Text cell; SQL NULL reads as `None`.
    pub fn get_text(&self, column: &str) -> DbResult<Option<String>> {
        match self.get(column) {
            Some(SqlValue::Text(value)) => Ok(Some(value.clone())),
            Some(SqlValue::Null) => Ok(None),
            _ => Err(DbError::column_mismatch(column, "text")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_check_column_type() {
        let row = Row::new().with("id", 7_i64).with("title", "Dune").with("author", SqlValue::Null);

        assert_eq!(row.get_i64("id").unwrap(), 7);
        assert_eq!(row.get_text("title").unwrap().as_deref(), Some("Dune"));
        assert_eq!(row.get_text("author").unwrap(), None);

        let err = row.get_i64("title").unwrap_err();
        assert!(err.to_string().contains("'title'"));
        assert!(row.get_text("missing").is_err());
    }
}
