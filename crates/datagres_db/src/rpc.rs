//! Request handlers for the data-fetch and schema-fetch calls a table view
//! makes. Handlers never fail: every error is folded into a
//! `{ success: false, error }` response.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::{
    Database, DbError, Result, Row, TableDataPage, TableDataService,
    TableSchema, query::SearchOptions,
};

/// Live databases by connection identifier
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Arc<dyn Database>>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `database` under `id`, replacing any previous entry
    pub fn register(&self, id: impl Into<String>, database: Arc<dyn Database>) {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), database);
    }

    pub fn remove(&self, id: &str) -> Option<Arc<dyn Database>> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// # Errors
    ///
    /// Returns `DbError::UnknownConnection` if nothing is registered as `id`.
    pub fn get(&self, id: &str) -> Result<Arc<dyn Database>> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::UnknownConnection(id.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRows {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Response to a data-fetch call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDataResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TableRows>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableDataResponse {
    #[must_use]
    pub fn ok(table_name: &str, page: TableDataPage) -> Self {
        Self {
            success: true,
            table_name: Some(table_name.to_string()),
            data: Some(TableRows {
                columns: page.columns,
                rows: page.rows,
            }),
            total_rows: Some(page.total_rows),
            page: Some(page.page),
            page_size: Some(page.page_size),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            table_name: None,
            data: None,
            total_rows: None,
            page: None,
            page_size: None,
            error: Some(error.to_string()),
        }
    }

    /// Unpack a successful response into a page
    ///
    /// # Errors
    ///
    /// Returns the server's error message, or a description of what is
    /// missing when a success response is incomplete.
    pub fn into_page(self) -> std::result::Result<TableDataPage, String> {
        if !self.success {
            return Err(self
                .error
                .unwrap_or_else(|| "unknown error".to_string()));
        }

        match (self.data, self.total_rows, self.page, self.page_size) {
            (Some(data), Some(total_rows), Some(page), Some(page_size)) => {
                Ok(TableDataPage {
                    columns: data.columns,
                    rows: data.rows,
                    total_rows,
                    page,
                    page_size,
                })
            }
            _ => Err("malformed table data response".to_string()),
        }
    }
}

/// Response to a schema-fetch call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchemaResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Serves table data and schemas for every registered connection
#[derive(Default)]
pub struct DataServer {
    registry: ConnectionRegistry,
    service: TableDataService,
}

impl DataServer {
    #[must_use]
    pub fn new(service: TableDataService) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            service,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub async fn get_table_data(
        &self,
        connection_id: &str,
        table_name: &str,
        options: &SearchOptions,
    ) -> TableDataResponse {
        match self.fetch(connection_id, table_name, options).await {
            Ok(page) => TableDataResponse::ok(table_name, page),
            Err(e) => TableDataResponse::failure(e),
        }
    }

    async fn fetch(
        &self,
        connection_id: &str,
        table_name: &str,
        options: &SearchOptions,
    ) -> Result<TableDataPage> {
        let database = self.registry.get(connection_id)?;
        self.service
            .fetch_page(database.as_ref(), table_name, options)
            .await
    }

    pub async fn get_table_schema(
        &self,
        connection_id: &str,
        table_name: &str,
    ) -> TableSchemaResponse {
        let result = match self.registry.get(connection_id) {
            Ok(database) => {
                self.service
                    .fetch_schema(database.as_ref(), table_name)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(schema) => TableSchemaResponse {
                success: true,
                schema: Some(schema),
                error: None,
            },
            Err(e) => TableSchemaResponse {
                success: false,
                schema: None,
                error: Some(e.to_string()),
            },
        }
    }
}
