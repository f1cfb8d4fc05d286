use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection as SqliteConnection, types::ValueRef};

use crate::{
    ColumnInfo, Database, DatabaseKind, DbError, QueryRows, Result, Row,
    Session, TableRef, Value,
};

/// SQLite database backed by a single shared connection.
///
/// `rusqlite` is synchronous, so every statement runs to completion inside
/// the async call while holding the connection lock.
#[derive(Clone)]
pub struct Sqlite {
    pub name: String,
    pub path: String,
    conn: Arc<Mutex<SqliteConnection>>,
}

impl std::fmt::Debug for Sqlite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sqlite")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Sqlite {
    /// Open the database file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &str) -> Result<Self> {
        let conn = SqliteConnection::open(path)?;
        Ok(Self::from_connection(path, conn))
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = SqliteConnection::open_in_memory()?;
        Ok(Self::from_connection(":memory:", conn))
    }

    fn from_connection(path: &str, conn: SqliteConnection) -> Self {
        Self {
            name: path.to_string(),
            path: path.to_string(),
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run one or more statements that return no rows
    ///
    /// # Errors
    ///
    /// Returns the first statement error.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        lock(&self.conn)?.execute_batch(sql)?;
        Ok(())
    }
}

fn lock(
    conn: &Mutex<SqliteConnection>,
) -> Result<MutexGuard<'_, SqliteConnection>> {
    conn.lock()
        .map_err(|_| DbError::Query("sqlite connection lock poisoned".into()))
}

#[async_trait::async_trait]
impl Database for Sqlite {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    async fn connect(&self) -> Result<Box<dyn Session>> {
        Ok(Box::new(SqliteSession {
            conn: Arc::clone(&self.conn),
        }))
    }
}

struct SqliteSession {
    conn: Arc<Mutex<SqliteConnection>>,
}

#[async_trait::async_trait]
impl Session for SqliteSession {
    async fn columns(&self, table: &TableRef<'_>) -> Result<Vec<ColumnInfo>> {
        let conn = lock(&self.conn)?;
        let schema = table.schema.unwrap_or("main");
        let name = table.name.replace('\'', "''");

        let mut stmt = conn
            .prepare(&format!("PRAGMA \"{schema}\".table_info('{name}')"))?;
        let columns = stmt
            .query_map([], |row| {
                let not_null: i64 = row.get(3)?;
                let pk: i64 = row.get(5)?;
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    data_type: row.get(2)?,
                    nullable: not_null == 0,
                    is_primary_key: pk > 0,
                    default_value: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(columns)
    }

    async fn count(&self, sql: &str) -> Result<u64> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        u64::try_from(count).map_err(|e| DbError::Decode(e.to_string()))
    }

    async fn query(&self, sql: &str) -> Result<QueryRows> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(sql)?;

        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        let column_count = columns.len();

        let mut rows = Vec::new();
        let mut result = stmt.query([])?;
        while let Some(row) = result.next()? {
            let values = (0..column_count)
                .map(|i| convert_sqlite_value(row, i))
                .collect::<Result<Row>>()?;
            rows.push(values);
        }

        Ok(QueryRows { columns, rows })
    }
}

/// Convert a `SQLite` value to JSON by storage class
fn convert_sqlite_value(row: &rusqlite::Row, index: usize) -> Result<Value> {
    let value = match row.get_ref(index)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => {
            serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
        }
        ValueRef::Text(text) => {
            Value::String(String::from_utf8_lossy(text).into_owned())
        }
        ValueRef::Blob(bytes) => {
            Value::String(format!("<{} bytes>", bytes.len()))
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_storage_classes_decode() {
        let db = Sqlite::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE t (i INTEGER, r REAL, s TEXT, b BLOB, n TEXT);
             INSERT INTO t VALUES (7, 1.5, 'x', x'0102', NULL);",
        )
        .unwrap();

        let session = db.connect().await.unwrap();
        let rows = session.query("SELECT * FROM t").await.unwrap();
        assert_eq!(rows.columns, vec!["i", "r", "s", "b", "n"]);
        assert_eq!(
            rows.rows,
            vec![vec![json!(7), json!(1.5), json!("x"), json!("<2 bytes>"), json!(null)]]
        );
    }

    #[tokio::test]
    async fn test_columns_of_missing_table_is_empty() {
        let db = Sqlite::open_in_memory().unwrap();
        let session = db.connect().await.unwrap();
        let columns = session.columns(&TableRef::parse("nope")).await.unwrap();
        assert!(columns.is_empty());
    }

    #[tokio::test]
    async fn test_query_on_missing_table_is_query_error() {
        let db = Sqlite::open_in_memory().unwrap();
        let session = db.connect().await.unwrap();
        let err = session.count("SELECT COUNT(*) FROM nope").await.unwrap_err();
        assert!(matches!(err, DbError::Query(msg) if msg.contains("no such table")));
    }
}
