use serde::{Deserialize, Serialize};

/// A row of the `book` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Assigned by the database on insert
    pub id: i64,
    /// `None` for a NULL column, serialized as `null`
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Caller-supplied fields for create and update. Update replaces both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub author: String,
}

/// Outcome of a create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub insert_id: u64,
    pub affected_rows: u64,
}

/// Outcome of an update or delete. Zero rows means no book had that id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub affected_rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_serialize_with_driver_field_names() {
        let insert = serde_json::to_value(InsertResult {
            insert_id: 1,
            affected_rows: 1,
        })
        .unwrap();
        assert_eq!(insert, serde_json::json!({"insertId": 1, "affectedRows": 1}));

        let write = serde_json::to_value(WriteResult { affected_rows: 0 }).unwrap();
        assert_eq!(write, serde_json::json!({"affectedRows": 0}));
    }
}
