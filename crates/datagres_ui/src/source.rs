use datagres_db::{SearchOptions, rpc::{DataServer, TableDataResponse}};

/// Anything able to answer a data-fetch call for a table view
#[async_trait::async_trait]
pub trait TableDataSource: Send + Sync {
    async fn get_table_data(
        &self,
        connection_id: &str,
        table_name: &str,
        options: &SearchOptions,
    ) -> TableDataResponse;
}

#[async_trait::async_trait]
impl TableDataSource for DataServer {
    async fn get_table_data(
        &self,
        connection_id: &str,
        table_name: &str,
        options: &SearchOptions,
    ) -> TableDataResponse {
        Self::get_table_data(self, connection_id, table_name, options).await
    }
}
