//! Serves pages of table data: resolves the column order from the catalog,
//! counts the matching rows, fetches the page and projects every row onto
//! the catalog column order.

use std::collections::HashMap;

use crate::{
    Database, Result, Row, Session, TableDataPage, TableSchema,
    query::{BuiltQuery, SearchOptions, TableRef, build_data_query},
};

/// Stateless page server. Retries are left to the caller.
#[derive(Debug, Clone, Copy)]
pub struct TableDataService {
    default_page_size: u32,
}

impl Default for TableDataService {
    fn default() -> Self {
        Self::new(crate::DEFAULT_PAGE_SIZE)
    }
}

impl TableDataService {
    #[must_use]
    pub const fn new(default_page_size: u32) -> Self {
        Self { default_page_size }
    }

    #[must_use]
    pub const fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// Fetch one page on a fresh session from `database`.
    ///
    /// The session is dropped before returning, on success or failure.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Query` with the driver message if connecting or any
    /// statement fails. No partial page is ever returned.
    pub async fn fetch_page(
        &self,
        database: &dyn Database,
        table: &str,
        options: &SearchOptions,
    ) -> Result<TableDataPage> {
        let session = database.connect().await?;
        self.fetch_page_with(session.as_ref(), table, options).await
    }

    /// Fetch one page using an already acquired session
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the catalog lookup, the count or
    /// the data statement.
    pub async fn fetch_page_with(
        &self,
        session: &dyn Session,
        table: &str,
        options: &SearchOptions,
    ) -> Result<TableDataPage> {
        let mut options = options.clone();
        if options.page_size.is_none() {
            options.page_size = Some(self.default_page_size);
        }
        let built = build_data_query(table, &options);

        tracing::debug!(
            table,
            sql = %built.sql,
            count_sql = %built.count_sql,
            "fetching table page"
        );

        let result = Self::run_page_query(session, table, &built).await;

        match &result {
            Ok(page) => tracing::info!(
                table,
                page = page.page,
                page_size = page.page_size,
                rows = page.rows.len(),
                total_rows = page.total_rows,
                "served table page"
            ),
            Err(e) => {
                tracing::warn!(table, page = built.page, error = %e, "table page fetch failed");
            }
        }

        result
    }

    async fn run_page_query(
        session: &dyn Session,
        table: &str,
        built: &BuiltQuery,
    ) -> Result<TableDataPage> {
        let catalog = session.columns(&TableRef::parse(table)).await?;
        let total_rows = session.count(&built.count_sql).await?;
        let raw = session.query(&built.sql).await?;

        let columns = if catalog.is_empty() {
            raw.columns.clone()
        } else {
            catalog.into_iter().map(|c| c.name).collect()
        };
        let rows = project_rows(&columns, &raw.columns, raw.rows);

        Ok(TableDataPage {
            columns,
            rows,
            total_rows,
            page: built.page,
            page_size: built.page_size,
        })
    }

    /// Column metadata for `table`, primary keys included
    ///
    /// # Errors
    ///
    /// Returns an error if connecting or the catalog query fails.
    pub async fn fetch_schema(
        &self,
        database: &dyn Database,
        table: &str,
    ) -> Result<TableSchema> {
        let session = database.connect().await?;
        let table_ref = TableRef::parse(table);
        let columns = session.columns(&table_ref).await?;

        Ok(TableSchema {
            table_name: table_ref.name.to_string(),
            columns,
        })
    }
}

/// Reorder each row from result-set order into `columns` order, matching by
/// name. Columns missing from the result set come back as NULL.
fn project_rows(
    columns: &[String],
    result_columns: &[String],
    rows: Vec<Row>,
) -> Vec<Row> {
    if columns == result_columns {
        return rows;
    }

    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (index, name) in result_columns.iter().enumerate() {
        positions.entry(name.as_str()).or_insert(index);
    }
    let order: Vec<Option<usize>> = columns
        .iter()
        .map(|name| positions.get(name.as_str()).copied())
        .collect();

    rows.into_iter()
        .map(|row| {
            order
                .iter()
                .map(|index| {
                    index
                        .and_then(|i| row.get(i).cloned())
                        .unwrap_or(serde_json::Value::Null)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use serde_json::json;

    use super::*;
    use crate::{
        ColumnInfo, DatabaseKind, DbError, QueryRows, query::OrderBy,
        sqlite::Sqlite,
    };

    fn users_db(count: usize) -> Sqlite {
        let db = Sqlite::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, status TEXT);",
        )
        .unwrap();
        for id in 1..=count {
            let status = if id % 2 == 0 { "active" } else { "inactive" };
            db.execute_batch(&format!(
                "INSERT INTO users (id, name, status) VALUES ({id}, 'user{id}', '{status}');"
            ))
            .unwrap();
        }
        db
    }

    fn page_options(page: u32, page_size: u32) -> SearchOptions {
        SearchOptions {
            page: Some(page),
            page_size: Some(page_size),
            ..SearchOptions::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_users_pages() {
        let db = Sqlite::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO users VALUES (1, 'John'), (2, 'Jane'), (3, 'Bob'), (4, 'Alice');",
        )
        .unwrap();
        let service = TableDataService::default();

        let first = service
            .fetch_page(&db, "users", &page_options(1, 2))
            .await
            .unwrap();
        assert_eq!(first.columns, vec!["id", "name"]);
        assert_eq!(
            first.rows,
            vec![vec![json!(1), json!("John")], vec![json!(2), json!("Jane")]]
        );
        assert_eq!((first.total_rows, first.page, first.page_size), (4, 1, 2));

        let second = service
            .fetch_page(&db, "users", &page_options(2, 2))
            .await
            .unwrap();
        assert_eq!(
            second.rows,
            vec![vec![json!(3), json!("Bob")], vec![json!(4), json!("Alice")]]
        );
        assert_eq!(second.total_rows, 4);
    }

    #[tokio::test]
    async fn test_pages_cover_every_row_once() {
        let page_size = 7_u32;
        let service = TableDataService::default();

        for total in [0_usize, 1, 6, 7, 8, 70] {
            let db = users_db(total);
            let pages = total.div_ceil(page_size as usize).max(1);
            let mut ids = Vec::new();

            for page in 1..=pages {
                let options = SearchOptions {
                    order_by: vec![OrderBy::asc("id")],
                    ..page_options(u32::try_from(page).unwrap(), page_size)
                };
                let served =
                    service.fetch_page(&db, "users", &options).await.unwrap();
                assert_eq!(served.total_rows, total as u64);
                ids.extend(served.rows.iter().map(|r| r[0].as_i64().unwrap()));
            }

            let expected: Vec<i64> = (1..=total as i64).collect();
            assert_eq!(ids, expected, "total = {total}");
        }
    }

    #[tokio::test]
    async fn test_search_term_filters_rows_and_count() {
        let db = users_db(10);
        let options = SearchOptions {
            search_term: "status = 'active'".to_string(),
            order_by: vec![OrderBy::desc("id")],
            ..page_options(1, 3)
        };
        let page = TableDataService::default()
            .fetch_page(&db, "users", &options)
            .await
            .unwrap();

        assert_eq!(page.total_rows, 5);
        let ids: Vec<i64> =
            page.rows.iter().map(|r| r[0].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![10, 8, 6]);
    }

    #[tokio::test]
    async fn test_malformed_search_term_surfaces_query_error() {
        let db = users_db(3);
        let options = SearchOptions {
            search_term: "status = = 'x'".to_string(),
            ..SearchOptions::default()
        };
        let err = TableDataService::default()
            .fetch_page(&db, "users", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Query(msg) if msg.contains("syntax error")));
    }

    #[tokio::test]
    async fn test_default_page_size_applies_when_absent() {
        let db = users_db(12);
        let page = TableDataService::new(5)
            .fetch_page(&db, "users", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(page.page_size, 5);
        assert_eq!(page.rows.len(), 5);
    }

    #[tokio::test]
    async fn test_schema_reports_primary_key() {
        let db = users_db(1);
        let schema = TableDataService::default()
            .fetch_schema(&db, "main.users")
            .await
            .unwrap();
        assert_eq!(schema.table_name, "users");
        assert_eq!(schema.primary_key_columns(), vec!["id"]);
        assert!(!schema.columns[1].nullable);
    }

    /// Session whose catalog order differs from the result-set order
    struct ShuffledSession {
        calls: Arc<Mutex<Vec<String>>>,
        fail_count: bool,
    }

    #[async_trait::async_trait]
    impl Session for ShuffledSession {
        async fn columns(&self, _table: &TableRef<'_>) -> Result<Vec<ColumnInfo>> {
            self.calls.lock().unwrap().push("columns".to_string());
            Ok(["id", "name", "email"]
                .into_iter()
                .map(|name| ColumnInfo {
                    name: name.to_string(),
                    data_type: "text".to_string(),
                    nullable: true,
                    is_primary_key: name == "id",
                    default_value: None,
                })
                .collect())
        }

        async fn count(&self, sql: &str) -> Result<u64> {
            self.calls.lock().unwrap().push(sql.to_string());
            if self.fail_count {
                return Err(DbError::Query("relation \"users\" does not exist".into()));
            }
            Ok(1)
        }

        async fn query(&self, sql: &str) -> Result<QueryRows> {
            self.calls.lock().unwrap().push(sql.to_string());
            Ok(QueryRows {
                columns: vec!["name".into(), "id".into()],
                rows: vec![vec![json!("John"), json!(1)]],
            })
        }
    }

    #[tokio::test]
    async fn test_rows_follow_catalog_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let session = ShuffledSession {
            calls: Arc::clone(&calls),
            fail_count: false,
        };
        let page = TableDataService::default()
            .fetch_page_with(&session, "users", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(page.columns, vec!["id", "name", "email"]);
        assert_eq!(page.rows, vec![vec![json!(1), json!("John"), json!(null)]]);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "columns".to_string(),
                "SELECT COUNT(*) FROM users".to_string(),
                "SELECT * FROM users LIMIT 100 OFFSET 0".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_count_failure_aborts_before_data_query() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let session = ShuffledSession {
            calls: Arc::clone(&calls),
            fail_count: true,
        };
        let err = TableDataService::default()
            .fetch_page_with(&session, "users", &SearchOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, DbError::Query("relation \"users\" does not exist".into()));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    struct CountingDatabase {
        sessions_dropped: Arc<AtomicUsize>,
    }

    struct DropTracked {
        inner: ShuffledSession,
        dropped: Arc<AtomicUsize>,
    }

    impl Drop for DropTracked {
        fn drop(&mut self) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl Session for DropTracked {
        async fn columns(&self, table: &TableRef<'_>) -> Result<Vec<ColumnInfo>> {
            self.inner.columns(table).await
        }

        async fn count(&self, sql: &str) -> Result<u64> {
            self.inner.count(sql).await
        }

        async fn query(&self, sql: &str) -> Result<QueryRows> {
            self.inner.query(sql).await
        }
    }

    #[async_trait::async_trait]
    impl Database for CountingDatabase {
        fn kind(&self) -> DatabaseKind {
            DatabaseKind::Postgres
        }

        async fn connect(&self) -> Result<Box<dyn Session>> {
            Ok(Box::new(DropTracked {
                inner: ShuffledSession {
                    calls: Arc::new(Mutex::new(Vec::new())),
                    fail_count: true,
                },
                dropped: Arc::clone(&self.sessions_dropped),
            }))
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_releases_session() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let db = CountingDatabase {
            sessions_dropped: Arc::clone(&dropped),
        };
        let result = TableDataService::default()
            .fetch_page(&db, "users", &SearchOptions::default())
            .await;

        assert!(result.is_err());
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }
}
