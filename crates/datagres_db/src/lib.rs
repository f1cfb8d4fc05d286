pub mod connection;
pub mod error;
pub mod postgres;
pub mod query;
pub mod rpc;
pub mod service;
pub mod sqlite;

use serde::{Deserialize, Serialize};

pub use error::{DbError, Result};
pub use query::{
    BuiltQuery, DEFAULT_PAGE_SIZE, Filter, FilterOperator, OrderBy,
    SearchOptions, SortDirection, TableRef, build_data_query,
};
pub use service::TableDataService;

/// A single cell. Rows are positionally aligned with their column list.
pub type Value = serde_json::Value;
pub type Row = Vec<Value>;

/// One page of a table query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDataPage {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows matching the WHERE clause, ignoring pagination
    pub total_rows: u64,
    pub page: u32,
    pub page_size: u32,
}

impl TableDataPage {
    /// Primary-key values identifying `row` on this page
    #[must_use]
    pub fn row_key(
        &self,
        row: usize,
        primary_key_columns: &[String],
    ) -> Option<Vec<(String, Value)>> {
        row_key(&self.columns, self.rows.get(row)?, primary_key_columns)
    }
}

/// Pair each primary-key column with its value in `row`.
///
/// Returns `None` when a key column is not part of `columns`, or when there
/// are no key columns at all.
#[must_use]
pub fn row_key(
    columns: &[String],
    row: &[Value],
    primary_key_columns: &[String],
) -> Option<Vec<(String, Value)>> {
    if primary_key_columns.is_empty() {
        return None;
    }

    primary_key_columns
        .iter()
        .map(|key| {
            let index = columns.iter().position(|c| c == key)?;
            Some((key.clone(), row.get(index)?.clone()))
        })
        .collect()
}

/// Catalog metadata for one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Raw statement output in result-set column order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Sqlite,
}

/// A database that hands out sessions.
///
/// Each fetch acquires one session and drops it when done; dropping the
/// session releases the underlying connection whether or not the fetch
/// succeeded.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    fn kind(&self) -> DatabaseKind;

    async fn connect(&self) -> Result<Box<dyn Session>>;

    async fn test(&self) -> bool {
        self.connect().await.is_ok()
    }
}

/// A live connection able to run the statements a page fetch needs
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    /// Catalog columns of `table` in ordinal order
    async fn columns(&self, table: &TableRef<'_>) -> Result<Vec<ColumnInfo>>;

    /// Run a `COUNT(*)` style statement and read the single integer back
    async fn count(&self, sql: &str) -> Result<u64>;

    async fn query(&self, sql: &str) -> Result<QueryRows>;
}
