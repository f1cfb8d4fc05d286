//! Accumulated pages for one table view.
//!
//! [`PageCache`] is a pure state machine: operations that need data return a
//! [`FetchTicket`], the caller runs it against a data source and hands the
//! result back through [`PageCache::complete`]. Responses are applied only
//! if their ticket still matches the active key and generation, so a late
//! answer for an old search or sort can never leak into the current rows.

use datagres_db::{Filter, OrderBy, Row, SearchOptions, TableDataPage, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a fetch failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The database rejected the statement; message is the driver's
    #[error("{0}")]
    Query(String),

    /// The request never produced an answer
    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    FirstPage,
    NextPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FetchKind,
    pub error: FetchError,
}

/// Identity of one logical query whose pages are cached together
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheKey {
    pub connection: String,
    pub table: String,
    pub search_term: String,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
}

impl CacheKey {
    #[must_use]
    pub fn new(connection: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            table: table.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn search_options(&self, page: u32, page_size: u32) -> SearchOptions {
        SearchOptions {
            search_term: self.search_term.clone(),
            filters: self.filters.clone(),
            order_by: self.order_by.clone(),
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

/// The part of a view worth persisting between sessions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
}

/// A request the cache wants executed
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub key: CacheKey,
    pub generation: u64,
    pub page: u32,
    pub kind: FetchKind,
    pub options: SearchOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed,
    /// The ticket no longer matches the active key or generation
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Empty,
    Loading,
    /// Page 1 is being fetched again while the old rows stay visible
    Refreshing,
    Loaded,
    LoadingMore,
    /// The last fetch failed; rows survive if it was a next-page fetch
    Errored,
}

/// What one applied page contributed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct PageCache {
    key: CacheKey,
    pending_search: String,
    page_size: u32,
    generation: u64,
    columns: Vec<String>,
    total_rows: u64,
    pages: Vec<PageInfo>,
    all_rows: Vec<Row>,
    in_flight: Option<FetchKind>,
    error: Option<FetchFailure>,
}

impl PageCache {
    #[must_use]
    pub fn new(key: CacheKey, page_size: u32) -> Self {
        Self {
            pending_search: key.search_term.clone(),
            key,
            page_size: page_size.max(1),
            generation: 0,
            columns: Vec::new(),
            total_rows: 0,
            pages: Vec::new(),
            all_rows: Vec::new(),
            in_flight: None,
            error: None,
        }
    }

    /// Rebuild a view from persisted state
    #[must_use]
    pub fn from_view_state(
        connection: impl Into<String>,
        table: impl Into<String>,
        state: ViewState,
        page_size: u32,
    ) -> Self {
        let key = CacheKey {
            search_term: state.search_term,
            filters: state.filters,
            order_by: state.order_by,
            ..CacheKey::new(connection, table)
        };
        Self::new(key, page_size)
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        ViewState {
            search_term: self.key.search_term.clone(),
            filters: self.key.filters.clone(),
            order_by: self.key.order_by.clone(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Every fetched row, pages concatenated in order
    #[must_use]
    pub fn all_rows(&self) -> &[Row] {
        &self.all_rows
    }

    /// Total matching rows as reported by the first page
    #[must_use]
    pub const fn total_rows(&self) -> u64 {
        self.total_rows
    }

    #[must_use]
    pub fn pages(&self) -> &[PageInfo] {
        &self.pages
    }

    #[must_use]
    pub fn has_next_page(&self) -> bool {
        !self.pages.is_empty()
            && (self.pages.len() as u64) * u64::from(self.page_size)
                < self.total_rows
    }

    /// A first-page request is outstanding
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight == Some(FetchKind::FirstPage)
    }

    #[must_use]
    pub fn is_loading_more(&self) -> bool {
        self.in_flight == Some(FetchKind::NextPage)
    }

    /// The first page failed and there is nothing to show
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|failure| failure.kind == FetchKind::FirstPage)
    }

    #[must_use]
    pub const fn error(&self) -> Option<&FetchFailure> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> CacheStatus {
        match self.in_flight {
            Some(FetchKind::FirstPage) if self.pages.is_empty() => {
                CacheStatus::Loading
            }
            Some(FetchKind::FirstPage) => CacheStatus::Refreshing,
            Some(FetchKind::NextPage) => CacheStatus::LoadingMore,
            None if self.error.is_some() => CacheStatus::Errored,
            None if self.pages.is_empty() => CacheStatus::Empty,
            None => CacheStatus::Loaded,
        }
    }

    /// Search text being edited; not part of the key until committed
    #[must_use]
    pub fn pending_search_term(&self) -> &str {
        &self.pending_search
    }

    /// Committed search term, part of the key
    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.key.search_term
    }

    #[must_use]
    pub fn order_by(&self) -> &[OrderBy] {
        &self.key.order_by
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.key.filters
    }

    /// Primary-key values for the row at `index` across all pages
    #[must_use]
    pub fn row_key(
        &self,
        index: usize,
        primary_key_columns: &[String],
    ) -> Option<Vec<(String, Value)>> {
        datagres_db::row_key(
            &self.columns,
            self.all_rows.get(index)?,
            primary_key_columns,
        )
    }

    /// Request the first page if nothing has been loaded or requested yet
    pub fn load(&mut self) -> Option<FetchTicket> {
        if self.status() == CacheStatus::Empty {
            Some(self.issue(FetchKind::FirstPage))
        } else {
            None
        }
    }

    /// Request the page after the last one loaded. No-op while any fetch is
    /// outstanding or when every row is already loaded.
    pub fn fetch_next_page(&mut self) -> Option<FetchTicket> {
        if !self.has_next_page() || self.in_flight.is_some() {
            return None;
        }
        self.error = None;
        Some(self.issue(FetchKind::NextPage))
    }

    /// Fetch page 1 again and replace every accumulated page with it once it
    /// arrives. Rows stay visible in the meantime.
    pub fn refetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.error = None;
        self.issue(FetchKind::FirstPage)
    }

    /// Retry whatever failed last
    pub fn retry(&mut self) -> Option<FetchTicket> {
        match self.error.as_ref().map(|failure| failure.kind) {
            Some(FetchKind::FirstPage) => Some(self.refetch()),
            Some(FetchKind::NextPage) => self.fetch_next_page(),
            None => None,
        }
    }

    /// Update the search text without fetching anything
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.pending_search = term.into();
    }

    /// Promote the pending search text into the key
    pub fn handle_search_commit(&mut self) -> Option<FetchTicket> {
        if self.pending_search == self.key.search_term {
            return None;
        }
        self.key.search_term = self.pending_search.clone();
        Some(self.reset())
    }

    pub fn set_order_by(&mut self, order_by: Vec<OrderBy>) -> Option<FetchTicket> {
        if order_by == self.key.order_by {
            return None;
        }
        self.key.order_by = order_by;
        Some(self.reset())
    }

    pub fn set_filters(&mut self, filters: Vec<Filter>) -> Option<FetchTicket> {
        if filters == self.key.filters {
            return None;
        }
        self.key.filters = filters;
        Some(self.reset())
    }

    /// Drop everything cached for the previous key and start over at page 1
    fn reset(&mut self) -> FetchTicket {
        self.generation += 1;
        self.columns.clear();
        self.total_rows = 0;
        self.pages.clear();
        self.all_rows.clear();
        self.error = None;
        self.issue(FetchKind::FirstPage)
    }

    fn issue(&mut self, kind: FetchKind) -> FetchTicket {
        let page = match kind {
            FetchKind::FirstPage => 1,
            FetchKind::NextPage => {
                u32::try_from(self.pages.len() + 1).unwrap_or(u32::MAX)
            }
        };
        self.in_flight = Some(kind);

        FetchTicket {
            key: self.key.clone(),
            generation: self.generation,
            page,
            kind,
            options: self.key.search_options(page, self.page_size),
        }
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
            && ticket.key == self.key
            && self.in_flight == Some(ticket.kind)
            && match ticket.kind {
                FetchKind::FirstPage => ticket.page == 1,
                FetchKind::NextPage => {
                    ticket.page as usize == self.pages.len() + 1
                }
            }
    }

    /// Apply the answer to `ticket`
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<TableDataPage, FetchError>,
    ) -> FetchOutcome {
        if !self.is_current(ticket) {
            tracing::debug!(
                table = %ticket.key.table,
                page = ticket.page,
                generation = ticket.generation,
                current_generation = self.generation,
                "discarding stale table page response"
            );
            return FetchOutcome::Discarded;
        }
        self.in_flight = None;

        match (ticket.kind, result) {
            (FetchKind::FirstPage, Ok(page)) => {
                self.columns = page.columns;
                self.total_rows = page.total_rows;
                self.pages = vec![PageInfo {
                    page: page.page,
                    page_size: page.page_size,
                    rows: page.rows.len(),
                }];
                self.all_rows = page.rows;
                self.error = None;
                FetchOutcome::Applied
            }
            (FetchKind::NextPage, Ok(page)) => {
                if page.columns != self.columns {
                    tracing::warn!(
                        table = %ticket.key.table,
                        page = page.page,
                        "column list changed between pages"
                    );
                }
                self.pages.push(PageInfo {
                    page: page.page,
                    page_size: page.page_size,
                    rows: page.rows.len(),
                });
                self.all_rows.extend(page.rows);
                FetchOutcome::Applied
            }
            (FetchKind::FirstPage, Err(error)) => {
                self.columns.clear();
                self.total_rows = 0;
                self.pages.clear();
                self.all_rows.clear();
                self.error = Some(FetchFailure {
                    kind: FetchKind::FirstPage,
                    error,
                });
                FetchOutcome::Failed
            }
            (FetchKind::NextPage, Err(error)) => {
                self.error = Some(FetchFailure {
                    kind: FetchKind::NextPage,
                    error,
                });
                FetchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use datagres_db::FilterOperator;
    use serde_json::json;

    use super::*;

    const USERS: [(i64, &str); 4] =
        [(1, "John"), (2, "Jane"), (3, "Bob"), (4, "Alice")];

    fn users_page(ticket: &FetchTicket) -> TableDataPage {
        let size = ticket.options.page_size.unwrap_or(100) as usize;
        let start = (ticket.page as usize - 1) * size;
        TableDataPage {
            columns: vec!["id".into(), "name".into()],
            rows: USERS
                .iter()
                .skip(start)
                .take(size)
                .map(|(id, name)| vec![json!(id), json!(name)])
                .collect(),
            total_rows: USERS.len() as u64,
            page: ticket.page,
            page_size: size as u32,
        }
    }

    /// Serve `total` numbered rows; each row holds its global index
    fn numbered_page(ticket: &FetchTicket, total: u64) -> TableDataPage {
        let size = u64::from(ticket.options.page_size.unwrap_or(100));
        let start = u64::from(ticket.page - 1) * size;
        let end = (start + size).min(total);
        TableDataPage {
            columns: vec!["n".into()],
            rows: (start..end).map(|n| vec![json!(n)]).collect(),
            total_rows: total,
            page: ticket.page,
            page_size: size as u32,
        }
    }

    fn users_cache(page_size: u32) -> PageCache {
        PageCache::new(CacheKey::new("local", "users"), page_size)
    }

    #[test]
    fn test_users_scenario() {
        let mut cache = users_cache(2);
        assert_eq!(cache.status(), CacheStatus::Empty);

        let first = cache.load().unwrap();
        assert_eq!(cache.status(), CacheStatus::Loading);
        assert_eq!(first.options.page, Some(1));
        assert_eq!(cache.complete(&first, Ok(users_page(&first))), FetchOutcome::Applied);

        assert_eq!(cache.columns(), ["id", "name"]);
        assert_eq!(cache.total_rows(), 4);
        assert!(cache.has_next_page());

        let second = cache.fetch_next_page().unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(cache.status(), CacheStatus::LoadingMore);
        assert_eq!(cache.complete(&second, Ok(users_page(&second))), FetchOutcome::Applied);

        assert_eq!(
            cache.all_rows(),
            [
                vec![json!(1), json!("John")],
                vec![json!(2), json!("Jane")],
                vec![json!(3), json!("Bob")],
                vec![json!(4), json!("Alice")],
            ]
        );
        assert!(!cache.has_next_page());
        assert_eq!(cache.status(), CacheStatus::Loaded);
    }

    #[test]
    fn test_pages_concatenate_to_every_row() {
        let page_size = 10_u32;
        for total in [0_u64, 1, 9, 10, 11, 100] {
            let mut cache = users_cache(page_size);
            let mut ticket = cache.load();
            let mut fetched = 0;

            while let Some(t) = ticket {
                cache.complete(&t, Ok(numbered_page(&t, total)));
                fetched += 1;
                let loaded = cache.all_rows().len() as u64;
                assert_eq!(cache.has_next_page(), loaded < total);
                ticket = cache.fetch_next_page();
            }

            let expected: Vec<Row> = (0..total).map(|n| vec![json!(n)]).collect();
            assert_eq!(cache.all_rows(), expected.as_slice(), "total = {total}");
            assert_eq!(fetched, total.div_ceil(u64::from(page_size)).max(1));
        }
    }

    #[test]
    fn test_next_page_is_noop_while_loading_or_exhausted() {
        let mut cache = users_cache(2);
        assert!(cache.fetch_next_page().is_none());

        let first = cache.load().unwrap();
        assert!(cache.fetch_next_page().is_none());
        cache.complete(&first, Ok(users_page(&first)));

        let second = cache.fetch_next_page().unwrap();
        assert!(cache.fetch_next_page().is_none());
        cache.complete(&second, Ok(users_page(&second)));

        assert!(!cache.has_next_page());
        assert!(cache.fetch_next_page().is_none());
    }

    #[test]
    fn test_load_only_once() {
        let mut cache = users_cache(2);
        assert!(cache.load().is_some());
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_order_change_discards_accumulated_pages() {
        let mut cache = users_cache(2);
        let first = cache.load().unwrap();
        cache.complete(&first, Ok(users_page(&first)));
        let second = cache.fetch_next_page().unwrap();
        cache.complete(&second, Ok(users_page(&second)));
        assert_eq!(cache.all_rows().len(), 4);

        let reordered = cache.set_order_by(vec![OrderBy::desc("id")]).unwrap();
        assert_eq!(reordered.page, 1);
        assert!(cache.all_rows().is_empty());
        assert_eq!(cache.status(), CacheStatus::Loading);
        assert_eq!(reordered.options.order_by, vec![OrderBy::desc("id")]);

        let page = TableDataPage {
            rows: vec![vec![json!(4), json!("Alice")], vec![json!(3), json!("Bob")]],
            ..users_page(&reordered)
        };
        cache.complete(&reordered, Ok(page));
        assert_eq!(cache.all_rows()[0], vec![json!(4), json!("Alice")]);
        assert_eq!(cache.all_rows().len(), 2);
    }

    #[test]
    fn test_unchanged_order_does_not_refetch() {
        let mut cache = users_cache(2);
        assert!(cache.set_order_by(Vec::new()).is_none());
        assert!(cache.set_filters(Vec::new()).is_none());
    }

    #[test]
    fn test_filter_change_restarts_from_page_one() {
        let mut cache = users_cache(1);
        let first = cache.load().unwrap();
        cache.complete(&first, Ok(users_page(&first)));
        let second = cache.fetch_next_page().unwrap();
        cache.complete(&second, Ok(users_page(&second)));
        let third = cache.fetch_next_page().unwrap();
        assert_eq!(cache.all_rows().len(), 2);

        let adults = vec![Filter {
            column: "age".into(),
            operator: FilterOperator::Gt,
            value: json!(30),
        }];
        let filtered = cache.set_filters(adults.clone()).unwrap();
        assert_eq!(filtered.page, 1);
        assert_eq!(filtered.kind, FetchKind::FirstPage);
        assert_eq!(filtered.options.page, Some(1));
        assert_eq!(filtered.options.filters, adults);
        assert_eq!(filtered.key.filters, adults);
        assert_eq!(cache.filters(), adults.as_slice());
        assert!(cache.all_rows().is_empty());
        assert_eq!(cache.status(), CacheStatus::Loading);

        assert_eq!(
            cache.complete(&third, Ok(users_page(&third))),
            FetchOutcome::Discarded
        );
        assert!(cache.all_rows().is_empty());

        assert!(cache.set_filters(adults).is_none());
        assert_eq!(
            cache.complete(&filtered, Ok(users_page(&filtered))),
            FetchOutcome::Applied
        );
        assert_eq!(cache.all_rows().len(), 1);
    }

    #[test]
    fn test_search_is_two_phase() {
        let mut cache = users_cache(2);
        let first = cache.load().unwrap();
        cache.complete(&first, Ok(users_page(&first)));

        cache.set_search_term("id > 2");
        assert_eq!(cache.pending_search_term(), "id > 2");
        assert_eq!(cache.search_term(), "");
        assert_eq!(cache.all_rows().len(), 2);

        let ticket = cache.handle_search_commit().unwrap();
        assert_eq!(ticket.options.search_term, "id > 2");
        assert_eq!(cache.search_term(), "id > 2");
        assert!(cache.all_rows().is_empty());

        // committing the same text again changes nothing
        assert!(cache.handle_search_commit().is_none());
    }

    #[test]
    fn test_stale_first_page_is_discarded() {
        let mut cache = users_cache(2);
        let old = cache.load().unwrap();

        cache.set_search_term("name = 'Bob'");
        let new = cache.handle_search_commit().unwrap();

        let outcome = cache.complete(&old, Ok(users_page(&old)));
        assert_eq!(outcome, FetchOutcome::Discarded);
        assert!(cache.all_rows().is_empty());
        assert_eq!(cache.total_rows(), 0);
        assert!(cache.is_loading());

        let bob = TableDataPage {
            columns: vec!["id".into(), "name".into()],
            rows: vec![vec![json!(3), json!("Bob")]],
            total_rows: 1,
            page: 1,
            page_size: 2,
        };
        assert_eq!(cache.complete(&new, Ok(bob)), FetchOutcome::Applied);
        assert_eq!(cache.total_rows(), 1);
        assert!(!cache.has_next_page());
    }

    #[test]
    fn test_stale_response_after_flip_back_is_discarded() {
        let mut cache = users_cache(2);
        let original = cache.load().unwrap();
        cache.set_order_by(vec![OrderBy::asc("name")]);
        let back = cache.set_order_by(Vec::new()).unwrap();

        assert_eq!(original.key, back.key);
        assert_eq!(
            cache.complete(&original, Ok(users_page(&original))),
            FetchOutcome::Discarded
        );
        assert_eq!(cache.complete(&back, Ok(users_page(&back))), FetchOutcome::Applied);
    }

    #[test]
    fn test_first_page_error_blocks() {
        let mut cache = users_cache(2);
        let first = cache.load().unwrap();
        let outcome = cache.complete(
            &first,
            Err(FetchError::Query("relation \"users\" does not exist".into())),
        );

        assert_eq!(outcome, FetchOutcome::Failed);
        assert!(cache.is_error());
        assert_eq!(cache.status(), CacheStatus::Errored);
        assert!(cache.all_rows().is_empty());
        assert!(cache.fetch_next_page().is_none());

        let retry = cache.retry().unwrap();
        assert_eq!(retry.kind, FetchKind::FirstPage);
        assert!(!cache.is_error());
        cache.complete(&retry, Ok(users_page(&retry)));
        assert_eq!(cache.all_rows().len(), 2);
    }

    #[test]
    fn test_next_page_error_keeps_rows() {
        let mut cache = users_cache(2);
        let first = cache.load().unwrap();
        cache.complete(&first, Ok(users_page(&first)));

        let second = cache.fetch_next_page().unwrap();
        let outcome = cache.complete(
            &second,
            Err(FetchError::Transport("channel closed".into())),
        );

        assert_eq!(outcome, FetchOutcome::Failed);
        assert!(!cache.is_error());
        assert_eq!(
            cache.error().map(|f| f.kind),
            Some(FetchKind::NextPage)
        );
        assert_eq!(cache.all_rows().len(), 2);
        assert_eq!(cache.status(), CacheStatus::Errored);

        let retry = cache.retry().unwrap();
        assert_eq!(retry.page, 2);
        assert!(cache.error().is_none());
    }

    #[test]
    fn test_refetch_replaces_pages_when_page_one_arrives() {
        let mut cache = users_cache(2);
        let first = cache.load().unwrap();
        cache.complete(&first, Ok(users_page(&first)));
        let second = cache.fetch_next_page().unwrap();
        cache.complete(&second, Ok(users_page(&second)));

        let refetch = cache.refetch();
        assert_eq!(cache.status(), CacheStatus::Refreshing);
        assert_eq!(cache.all_rows().len(), 4);
        assert!(cache.fetch_next_page().is_none());

        let edited = TableDataPage {
            rows: vec![vec![json!(1), json!("Johnny")], vec![json!(2), json!("Jane")]],
            ..users_page(&refetch)
        };
        cache.complete(&refetch, Ok(edited));
        assert_eq!(cache.pages().len(), 1);
        assert_eq!(cache.all_rows().len(), 2);
        assert_eq!(cache.all_rows()[0][1], json!("Johnny"));
        assert!(cache.has_next_page());
    }

    #[test]
    fn test_refetch_discards_in_flight_next_page() {
        let mut cache = users_cache(2);
        let first = cache.load().unwrap();
        cache.complete(&first, Ok(users_page(&first)));
        let second = cache.fetch_next_page().unwrap();

        let refetch = cache.refetch();
        assert_eq!(
            cache.complete(&second, Ok(users_page(&second))),
            FetchOutcome::Discarded
        );
        assert_eq!(cache.complete(&refetch, Ok(users_page(&refetch))), FetchOutcome::Applied);
    }

    #[test]
    fn test_row_key_across_pages() {
        let mut cache = users_cache(2);
        let first = cache.load().unwrap();
        cache.complete(&first, Ok(users_page(&first)));
        let second = cache.fetch_next_page().unwrap();
        cache.complete(&second, Ok(users_page(&second)));

        assert_eq!(
            cache.row_key(3, &["id".to_string()]),
            Some(vec![("id".to_string(), json!(4))])
        );
    }

    #[test]
    fn test_view_state_round_trip() {
        let mut cache = users_cache(2);
        cache.set_search_term("id > 1");
        cache.handle_search_commit();
        cache.set_order_by(vec![OrderBy::desc("name")]);

        let saved = serde_json::to_string(&cache.view_state()).unwrap();
        let restored = PageCache::from_view_state(
            "local",
            "users",
            serde_json::from_str(&saved).unwrap(),
            2,
        );
        assert_eq!(restored.key(), cache.key());
        assert_eq!(restored.pending_search_term(), "id > 1");
    }
}
