//! Runs the tickets a [`PageCache`] issues on the tokio runtime and feeds the
//! answers back in.
//!
//! At most one request is in flight. Changing the key or refetching aborts
//! the outstanding request; anything that still slips through is dropped by
//! the cache's generation check.

use std::sync::Arc;

use datagres_db::{Filter, OrderBy, TableDataPage};
use tokio::{
    runtime::Handle,
    sync::mpsc,
    task::AbortHandle,
};

use crate::{
    TableDataSource,
    page_cache::{FetchError, FetchOutcome, FetchTicket, PageCache},
};

/// The result of applying one finished request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchEvent {
    pub ticket: FetchTicket,
    pub outcome: FetchOutcome,
}

struct Completion {
    ticket: FetchTicket,
    result: Result<TableDataPage, FetchError>,
}

struct InFlight {
    ticket: FetchTicket,
    abort: AbortHandle,
}

pub struct InfiniteFetcher {
    cache: PageCache,
    source: Arc<dyn TableDataSource>,
    runtime: Handle,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: Option<InFlight>,
}

impl InfiniteFetcher {
    /// Must be called from within a tokio runtime; requests are spawned on it.
    #[must_use]
    pub fn new(source: Arc<dyn TableDataSource>, cache: PageCache) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            cache,
            source,
            runtime: Handle::current(),
            tx,
            rx,
            in_flight: None,
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// A request has been sent and not yet applied
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Fetch page 1 unless something is loaded or loading already
    pub fn load(&mut self) {
        let ticket = self.cache.load();
        self.dispatch(ticket);
    }

    /// Returns `true` when a request for the next page was sent
    pub fn fetch_next_page(&mut self) -> bool {
        let ticket = self.cache.fetch_next_page();
        self.dispatch(ticket)
    }

    pub fn refetch(&mut self) {
        let ticket = self.cache.refetch();
        self.dispatch(Some(ticket));
    }

    pub fn retry(&mut self) -> bool {
        let ticket = self.cache.retry();
        self.dispatch(ticket)
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.cache.set_search_term(term);
    }

    pub fn handle_search_commit(&mut self) -> bool {
        let ticket = self.cache.handle_search_commit();
        self.dispatch(ticket)
    }

    pub fn set_order_by(&mut self, order_by: Vec<OrderBy>) -> bool {
        let ticket = self.cache.set_order_by(order_by);
        self.dispatch(ticket)
    }

    pub fn set_filters(&mut self, filters: Vec<Filter>) -> bool {
        let ticket = self.cache.set_filters(filters);
        self.dispatch(ticket)
    }

    fn dispatch(&mut self, ticket: Option<FetchTicket>) -> bool {
        let Some(ticket) = ticket else {
            return false;
        };

        if let Some(previous) = self.in_flight.take() {
            tracing::debug!(
                table = %previous.ticket.key.table,
                page = previous.ticket.page,
                "aborting superseded table page request"
            );
            previous.abort.abort();
        }

        tracing::debug!(
            table = %ticket.key.table,
            page = ticket.page,
            generation = ticket.generation,
            "requesting table page"
        );

        let source = Arc::clone(&self.source);
        let connection = ticket.key.connection.clone();
        let table = ticket.key.table.clone();
        let options = ticket.options.clone();
        let request = self.runtime.spawn(async move {
            source
                .get_table_data(&connection, &table, &options)
                .await
                .into_page()
                .map_err(FetchError::Query)
        });
        let abort = request.abort_handle();

        let tx = self.tx.clone();
        let sent = ticket.clone();
        self.runtime.spawn(async move {
            let result = match request.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => return,
                Err(e) => Err(FetchError::Transport(e.to_string())),
            };
            // the receiver lives as long as the fetcher
            let _ = tx.send(Completion {
                ticket: sent,
                result,
            });
        });

        self.in_flight = Some(InFlight { ticket, abort });
        true
    }

    fn apply(&mut self, completion: Completion) -> FetchEvent {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|current| current.ticket == completion.ticket)
        {
            self.in_flight = None;
        }

        if let Err(e) = &completion.result {
            tracing::warn!(
                table = %completion.ticket.key.table,
                page = completion.ticket.page,
                error = %e,
                "table page request failed"
            );
        }

        let outcome = self.cache.complete(&completion.ticket, completion.result);
        FetchEvent {
            ticket: completion.ticket,
            outcome,
        }
    }

    /// Apply every answer that has already arrived, without waiting
    pub fn poll_events(&mut self) -> Vec<FetchEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            events.push(self.apply(completion));
        }
        events
    }

    /// Wait for the next answer and apply it. Returns `None` once nothing is
    /// in flight and nothing is queued.
    pub async fn next_event(&mut self) -> Option<FetchEvent> {
        if let Ok(completion) = self.rx.try_recv() {
            return Some(self.apply(completion));
        }
        if self.in_flight.is_none() {
            return None;
        }
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }
}

impl Drop for InfiniteFetcher {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.abort.abort();
        }
    }
}
