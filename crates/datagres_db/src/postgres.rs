use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::{
    NoTls,
    types::{FromSql, Kind},
};
use uuid::Uuid;

use crate::{
    ColumnInfo, Database, DatabaseKind, DbError, QueryRows, Result, Row,
    Session, TableRef, Value,
};

const COLUMNS_QUERY: &str = "
    SELECT
        c.column_name::text,
        c.data_type::text,
        c.is_nullable::text,
        c.column_default::text,
        EXISTS (
            SELECT 1
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
             AND tc.table_name = kcu.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = c.table_schema
              AND tc.table_name = c.table_name
              AND kcu.column_name = c.column_name
        ) AS is_primary_key
    FROM information_schema.columns c
    WHERE c.table_schema = COALESCE($1::text, current_schema())
      AND c.table_name = $2::text
    ORDER BY c.ordinal_position
";

#[derive(Debug, Clone, Default)]
pub struct Postgres {
    pub name: String,
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: String,
    pub database: String,
    pub password: String,
}

impl Postgres {
    fn config(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host.clone().unwrap_or_else(|| "localhost".to_string()),
            self.port.clone().unwrap_or_else(|| "5432".to_string()),
            quote_config_value(&self.user),
            quote_config_value(&self.password),
            quote_config_value(&self.database),
        )
    }

    /// Open a fresh client. The connection task ends when the client is
    /// dropped.
    ///
    /// # Errors
    ///
    /// This function will return an error if the server cannot be reached or
    /// rejects the credentials.
    async fn get_connection(
        &self,
    ) -> std::result::Result<tokio_postgres::Client, tokio_postgres::Error>
    {
        let (client, connection) =
            tokio_postgres::connect(&self.config(), NoTls).await?;

        let name = self.name.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(connection = %name, error = %e, "database connection error");
            }
        });

        Ok(client)
    }
}

/// Quote a libpq keyword value so spaces and quotes survive
fn quote_config_value(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    if value.contains([' ', '\'', '\\']) {
        let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
        format!("'{escaped}'")
    } else {
        value.to_string()
    }
}

#[async_trait::async_trait]
impl Database for Postgres {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgres
    }

    async fn connect(&self) -> Result<Box<dyn Session>> {
        let client = self.get_connection().await?;
        Ok(Box::new(PostgresSession { client }))
    }
}

struct PostgresSession {
    client: tokio_postgres::Client,
}

#[async_trait::async_trait]
impl Session for PostgresSession {
    async fn columns(&self, table: &TableRef<'_>) -> Result<Vec<ColumnInfo>> {
        let rows = self
            .client
            .query(COLUMNS_QUERY, &[&table.schema, &table.name])
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let nullable: String = row.try_get(2)?;
            columns.push(ColumnInfo {
                name: row.try_get(0)?,
                data_type: row.try_get(1)?,
                nullable: nullable == "YES",
                default_value: row.try_get(3)?,
                is_primary_key: row.try_get(4)?,
            });
        }

        Ok(columns)
    }

    async fn count(&self, sql: &str) -> Result<u64> {
        let row = self.client.query_one(sql, &[]).await?;
        let count: i64 = row.try_get(0)?;
        u64::try_from(count).map_err(|e| DbError::Decode(e.to_string()))
    }

    async fn query(&self, sql: &str) -> Result<QueryRows> {
        let statement = self.client.prepare(sql).await?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let rows: Vec<Row> = self
            .client
            .query(&statement, &[])
            .await?
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| convert_postgres_value(row, i))
                    .collect()
            })
            .collect();

        Ok(QueryRows { columns, rows })
    }
}

/// Convert a `PostgreSQL` value to JSON.
///
/// Numbers, booleans and json stay native; types JSON cannot hold exactly
/// (numeric, uuid, dates and times) become strings.
fn convert_postgres_value(row: &tokio_postgres::Row, index: usize) -> Value {
    let Some(column) = row.columns().get(index) else {
        return Value::Null;
    };
    let col_type = column.type_();
    let type_name = col_type.name();

    let decoded = match type_name {
        "json" | "jsonb" => decode::<Value>(row, index, |v| v),
        "bool" => decode::<bool>(row, index, Value::Bool),
        "bytea" => decode::<Vec<u8>>(row, index, |bytes| {
            Value::String(format!("<{} bytes>", bytes.len()))
        }),

        "int2" => decode::<i16>(row, index, Value::from),
        "int4" => decode::<i32>(row, index, Value::from),
        "int8" => decode::<i64>(row, index, Value::from),
        "oid" => decode::<u32>(row, index, Value::from),
        "float4" => decode::<f32>(row, index, |v| float(f64::from(v))),
        "float8" => decode::<f64>(row, index, float),
        "numeric" => decode::<Decimal>(row, index, stringify),

        "uuid" => decode::<Uuid>(row, index, stringify),
        "timestamptz" => decode::<DateTime<Utc>>(row, index, |v| {
            Value::String(v.to_rfc3339())
        }),
        "timestamp" => decode::<NaiveDateTime>(row, index, stringify),
        "date" => decode::<NaiveDate>(row, index, stringify),
        "time" => decode::<NaiveTime>(row, index, stringify),

        _ if matches!(col_type.kind(), Kind::Array(_)) => decode_array(row, index),

        _ => decode::<String>(row, index, Value::String),
    };

    decoded.unwrap_or_else(|| Value::String(format!("<{type_name}>")))
}

/// Decode as `Option<T>`, mapping SQL NULL to JSON null. `None` means the
/// column could not be read as `T`.
fn decode<'a, T: FromSql<'a>>(
    row: &'a tokio_postgres::Row,
    index: usize,
    to_json: impl FnOnce(T) -> Value,
) -> Option<Value> {
    row.try_get::<_, Option<T>>(index)
        .ok()
        .map(|value| value.map_or(Value::Null, to_json))
}

fn decode_array(row: &tokio_postgres::Row, index: usize) -> Option<Value> {
    fn list<T: Into<Value>>(items: Vec<Option<T>>) -> Value {
        Value::Array(
            items
                .into_iter()
                .map(|item| item.map_or(Value::Null, Into::into))
                .collect(),
        )
    }

    decode::<Vec<Option<String>>>(row, index, list)
        .or_else(|| decode::<Vec<Option<i64>>>(row, index, list))
        .or_else(|| decode::<Vec<Option<i32>>>(row, index, list))
        .or_else(|| decode::<Vec<Option<i16>>>(row, index, list))
        .or_else(|| decode::<Vec<Option<bool>>>(row, index, list))
        .or_else(|| decode::<Vec<Option<f64>>>(row, index, list))
}

fn stringify<T: ToString>(value: T) -> Value {
    Value::String(value.to_string())
}

fn float(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}
