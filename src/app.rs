use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use color_eyre::Result;
use datagres_db::{OrderBy, SortDirection, rpc::DataServer};
use datagres_ui::{
    CacheKey, Container, FetchEvent, FetchKind, FetchOutcome, InfiniteFetcher,
    LoadMore, PageCache, ScrollTrigger, StatusLine, TableNavigationHandler,
    TriggerOptions, ViewState,
    widgets::{
        hotkey::{Hotkey, TABLE_HOTKEYS},
        table::{PagedTableState, sentinel},
        where_input::WhereInput,
    },
};
use ratatui::DefaultTerminal;

pub const APP_NAME: &str = "datagres";

/// What the app needs to open one table
pub struct AppOptions {
    pub server: Arc<DataServer>,
    pub connection_id: String,
    pub connection_name: String,
    pub table: String,
    pub view: ViewState,
    pub page_size: u32,
    pub scroll_threshold: u32,
    pub tick_rate: Duration,
}

/// The main application which holds the state and logic of the application.
pub struct App<'a> {
    /// Is the application running?
    pub(crate) running: bool,
    pub(crate) hotkeys: Vec<Hotkey<'a>>,
    pub(crate) connection_name: String,
    pub(crate) server: Arc<DataServer>,
    pub(crate) fetcher: InfiniteFetcher,
    pub(crate) table_state: PagedTableState,
    pub(crate) where_input: WhereInput,
    pub(crate) status_line: StatusLine,
    pub(crate) primary_key: Vec<String>,
    scroll_trigger: ScrollTrigger,
    load_more: LoadMore,
    load_requested: Arc<AtomicBool>,
    scroll_threshold: u32,
    tick_rate: Duration,
}

impl App<'_> {
    /// Must be called inside the tokio runtime the fetches should run on.
    #[must_use]
    pub fn new(options: AppOptions) -> Self {
        let cache = PageCache::from_view_state(
            options.connection_id,
            options.table,
            options.view,
            options.page_size,
        );
        let fetcher = InfiniteFetcher::new(options.server.clone(), cache);

        let load_requested = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&load_requested);
        let load_more: LoadMore = Arc::new(move || {
            flag.store(true, Ordering::SeqCst);
        });

        Self {
            running: false,
            hotkeys: TABLE_HOTKEYS.to_vec(),
            connection_name: options.connection_name,
            server: options.server,
            fetcher,
            table_state: PagedTableState::default(),
            where_input: WhereInput::new(),
            status_line: StatusLine::new(),
            primary_key: Vec::new(),
            scroll_trigger: ScrollTrigger::new(),
            load_more,
            load_requested,
            scroll_threshold: options.scroll_threshold,
            tick_rate: options.tick_rate,
        }
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        self.fetcher.cache().view_state()
    }

    /// Run the application's main loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<ViewState> {
        self.running = true;
        self.load_primary_key().await;
        self.fetcher.load();

        while self.running {
            for event in self.fetcher.poll_events() {
                self.on_fetch_event(&event);
            }
            terminal.draw(|frame| self.render(frame))?;
            self.update_scroll_trigger();

            let tick_rate = self.tick_rate;
            if tokio::task::block_in_place(|| crossterm::event::poll(tick_rate))? {
                self.handle_crossterm_events()?;
            }
        }

        self.scroll_trigger.disconnect();
        Ok(self.view_state())
    }

    async fn load_primary_key(&mut self) {
        let key = self.fetcher.cache().key();
        let response = self
            .server
            .get_table_schema(&key.connection, &key.table)
            .await;
        match response.schema {
            Some(schema) => self.primary_key = schema.primary_key_columns(),
            None => tracing::warn!(
                table = %key.table,
                error = response.error.as_deref().unwrap_or_default(),
                "could not load table schema"
            ),
        }
    }

    pub(crate) fn on_fetch_event(&mut self, event: &FetchEvent) {
        let cache = self.fetcher.cache();
        match (event.outcome, event.ticket.kind) {
            (FetchOutcome::Applied, _) => {
                self.status_line.set_message(format!(
                    "Loaded page {} ({}/{} rows)",
                    event.ticket.page,
                    cache.all_rows().len(),
                    cache.total_rows()
                ));
                let rows = cache.all_rows().len();
                TableNavigationHandler::clamp_selection(&mut self.table_state, rows);
            }
            (FetchOutcome::Failed, FetchKind::NextPage) => {
                if let Some(failure) = cache.error() {
                    self.status_line.set_error(format!(
                        "Page {} failed: {} (r to retry)",
                        event.ticket.page, failure.error
                    ));
                }
            }
            (FetchOutcome::Failed, FetchKind::FirstPage) => {
                self.status_line.clear();
                self.table_state.state.select(None);
            }
            (FetchOutcome::Discarded, _) => {}
        }
    }

    /// Point the scroll trigger at the current state and pull the next page
    /// when the last loaded row comes within the threshold
    pub(crate) fn update_scroll_trigger(&mut self) {
        let cache = self.fetcher.cache();
        self.scroll_trigger.observe(TriggerOptions {
            on_load_more: Arc::clone(&self.load_more),
            // a failed next page waits for an explicit retry
            has_more: cache.has_next_page() && cache.error().is_none(),
            is_loading: cache.is_loading() || cache.is_loading_more(),
            threshold_px: self.scroll_threshold,
            container: Container::Viewport,
        });

        if let Some(sentinel) = sentinel(cache.all_rows().len()) {
            self.scroll_trigger
                .check(sentinel, self.table_state.viewport());
        }

        if self.load_requested.swap(false, Ordering::SeqCst)
            && self.fetcher.fetch_next_page()
        {
            tracing::debug!(
                loaded = self.fetcher.cache().all_rows().len(),
                "scrolled near the end, loading next page"
            );
        }
    }

    /// Cycle the sort on the selected column: ascending, descending, off
    pub(crate) fn cycle_sort(&mut self) {
        let Some(column) = self
            .table_state
            .selected_column()
            .and_then(|idx| self.fetcher.cache().columns().get(idx).cloned())
        else {
            self.status_line.set_message("Select a column with h/l to sort");
            return;
        };

        let column = sort_identifier(&column);
        let order_by = next_sort(self.fetcher.cache().order_by(), &column);
        if self.fetcher.set_order_by(order_by) {
            self.table_state.state.select(Some(0));
        }
    }

    pub(crate) fn refresh(&mut self) {
        if self.fetcher.cache().error().is_some() {
            self.fetcher.retry();
        } else {
            self.fetcher.refetch();
        }
        self.status_line.clear();
    }

    /// Show the primary key of the selected row
    pub(crate) fn describe_selected_row(&mut self) {
        let Some(index) = self.table_state.selected_row() else {
            return;
        };
        match self.fetcher.cache().row_key(index, &self.primary_key) {
            Some(key) => {
                let key = key
                    .iter()
                    .map(|(column, value)| format!("{column} = {value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.status_line.set_message(format!("Row {}: {key}", index + 1));
            }
            None => self
                .status_line
                .set_message(format!("Row {} has no primary key", index + 1)),
        }
    }

    pub(crate) fn cache_key(&self) -> &CacheKey {
        self.fetcher.cache().key()
    }

    pub(crate) const fn quit(&mut self) {
        self.running = false;
    }
}

/// Catalog name as it must appear in ORDER BY. Names that would not
/// survive unquoted (mixed case, spaces, leading digits) are double-quoted
#[must_use]
pub fn sort_identifier(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Sort order after toggling `column`: unsorted or sorted on another column
/// becomes ascending, ascending becomes descending, descending clears it
#[must_use]
pub fn next_sort(current: &[OrderBy], column: &str) -> Vec<OrderBy> {
    match current.first() {
        Some(o) if o.column == column && o.direction == SortDirection::Asc => {
            vec![OrderBy::desc(column)]
        }
        Some(o) if o.column == column => Vec::new(),
        Some(_) | None => vec![OrderBy::asc(column)],
    }
}
