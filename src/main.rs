mod app;
mod cli;
mod config;
mod errors;
mod event_handlers;
mod logging;
mod rendering;
mod views;

use std::sync::Arc;

use app::{App, AppOptions};
use clap::Parser;
use datagres_db::{
    Database, TableDataService, connection::Connection, rpc::DataServer,
};

use crate::{
    cli::Args, config::Config, errors::DatagresError, views::ViewStore,
};

const CONNECTION_ID: &str = "default";

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let config = Config::from_args(&args)?;

    let data_dir = config::project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    let log_path = logging::init(&data_dir, &config.log_level)?;

    let connection = Connection::parse(&args.url)?;
    let database = connection.open()?;
    ensure_reachable(&connection, database.as_ref()).await?;

    let service = TableDataService::new(config.page_size);
    tracing::info!(
        connection = %connection,
        kind = ?database.kind(),
        table = %args.table,
        page_size = service.default_page_size(),
        log = %log_path.display(),
        "starting datagres"
    );

    let server = Arc::new(DataServer::new(service));
    server.registry().register(CONNECTION_ID, database);

    let mut views = ViewStore::open(&data_dir);
    let app = App::new(AppOptions {
        server,
        connection_id: CONNECTION_ID.to_string(),
        connection_name: connection.name.clone(),
        table: args.table.clone(),
        view: views.get(&connection.name, &args.table),
        page_size: config.page_size,
        scroll_threshold: config.scroll_threshold,
        tick_rate: config.tick_rate(),
    });

    let terminal = ratatui::init();
    let result = app.run(terminal).await;
    ratatui::restore();

    let view = result?;
    views.set(&connection.name, &args.table, view);
    if let Err(e) = views.save() {
        tracing::warn!(error = %e, "could not save view state");
    }
    Ok(())
}

/// Fail before the terminal enters raw mode if the database is down
async fn ensure_reachable(
    connection: &Connection,
    database: &dyn Database,
) -> Result<(), DatagresError> {
    if database.test().await {
        return Ok(());
    }
    tracing::error!(connection = %connection, "database is not reachable");
    Err(DatagresError::Unreachable(connection.to_string()))
}
