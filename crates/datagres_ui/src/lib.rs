pub mod fetcher;
pub mod handlers;
pub mod page_cache;
pub mod scroll_trigger;
pub mod source;
pub mod widgets;

pub use fetcher::{FetchEvent, InfiniteFetcher};
pub use handlers::TableNavigationHandler;
pub use page_cache::{
    CacheKey, CacheStatus, FetchError, FetchFailure, FetchKind, FetchOutcome,
    FetchTicket, PageCache, PageInfo, ViewState,
};
pub use scroll_trigger::{
    Bounds, Container, ElementBounds, IntersectionEntry, LoadMore,
    ProximityObserver, ScrollTrigger, TriggerOptions,
};
pub use source::TableDataSource;
pub use widgets::*;
